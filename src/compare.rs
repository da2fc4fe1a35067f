use crate::changes::{extract_changed_lines, ChangedLine};
use crate::diff::unified_diff;
use crate::error::CompareError;
use crate::json::{is_json_like, normalize_pair};
use crate::params::{
    diff_param_maps, extract_param_changes, parse_params, ExtractionMode, ParamChange,
    ParamPatterns,
};
use crate::text::{decode_lossy, is_text};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extensions picked up when comparing whole directory trees.
pub const COMPARISON_EXTENSIONS: &[&str] = &["scr", "cfg", "json", "txt", "loot", "gui", "ini"];

/// Default size above which a pair falls back to whole-file parameter maps.
pub const DEFAULT_MAX_TEXT_BYTES: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeKind {
    Added,
    Removed,
    ModifiedBinary,
    ModifiedText,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::ModifiedBinary => "modified-binary",
            ChangeKind::ModifiedText => "modified-text",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of comparing one original/modified pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileComparison {
    path: String,
    kind: ChangeKind,
    diff: Option<String>,
    diff_truncated: bool,
    changed_lines: Option<Vec<ChangedLine>>,
    param_changes: Option<Vec<ParamChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modified_file: Option<PathBuf>,
}

impl FileComparison {
    fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            diff: None,
            diff_truncated: false,
            changed_lines: None,
            param_changes: None,
            original_file: None,
            modified_file: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    pub fn diff(&self) -> Option<&str> {
        self.diff.as_deref()
    }

    pub fn diff_truncated(&self) -> bool {
        self.diff_truncated
    }

    pub fn changed_lines(&self) -> Option<&[ChangedLine]> {
        self.changed_lines.as_deref()
    }

    pub fn param_changes(&self) -> Option<&[ParamChange]> {
        self.param_changes.as_deref()
    }

    pub fn original_file(&self) -> Option<&Path> {
        self.original_file.as_deref()
    }

    pub fn modified_file(&self) -> Option<&Path> {
        self.modified_file.as_deref()
    }

    pub(crate) fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Record the source paths the result was computed from.
    pub(crate) fn with_sources(mut self, original: &Path, modified: &Path) -> Self {
        self.original_file = Some(original.to_path_buf());
        self.modified_file = Some(modified.to_path_buf());
        self
    }
}

/// Knobs for a comparison run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOptions {
    /// Unchanged lines shown around each change.
    pub context: usize,
    /// When false, text pairs are only classified.
    pub include_diff: bool,
    /// Pairs larger than this skip the line diff.
    pub max_bytes: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            context: 3,
            include_diff: true,
            max_bytes: DEFAULT_MAX_TEXT_BYTES,
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Compare one original/modified file pair.
///
/// Returns `Ok(None)` when the files are byte-identical, when the original
/// does not exist, or when the modified file is missing and the original is
/// binary. A missing or unreadable modified file next to a text original is
/// reported as [`ChangeKind::Removed`].
pub fn compare_files(
    original: &Path,
    modified: &Path,
    options: &CompareOptions,
) -> Result<Option<FileComparison>, CompareError> {
    if options.max_bytes == 0 {
        return Err(CompareError::InvalidArgument(
            "max_bytes must be greater than zero".to_string(),
        ));
    }

    let original_bytes = match std::fs::read(original) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("Original {} does not exist; nothing to compare", original.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(CompareError::ReadOriginal {
                path: original.to_path_buf(),
                source,
            })
        }
    };
    let name = display_name(original);

    let modified_bytes = match std::fs::read(modified) {
        Ok(bytes) => bytes,
        Err(err) => {
            info!("Modified {} unreadable ({err}); treating as removed", modified.display());
            if is_text(&original_bytes) {
                return Ok(Some(FileComparison::new(name, ChangeKind::Removed)));
            }
            return Ok(None);
        }
    };

    if original_bytes == modified_bytes {
        return Ok(None);
    }

    if !is_text(&original_bytes) || !is_text(&modified_bytes) {
        return Ok(Some(FileComparison::new(name, ChangeKind::ModifiedBinary)));
    }

    let mut original_text = decode_lossy(&original_bytes);
    let mut modified_text = decode_lossy(&modified_bytes);
    let mut mode = ExtractionMode::Generic;
    if is_json_like(original) {
        match normalize_pair(&original_text, &modified_text) {
            Some((normalized_original, normalized_modified)) => {
                original_text = normalized_original;
                modified_text = normalized_modified;
                mode = ExtractionMode::Json;
            }
            None => debug!("{name} is not valid JSON on both sides; comparing as plain text"),
        }
    }

    let mut result = FileComparison::new(name.clone(), ChangeKind::ModifiedText);
    if !options.include_diff {
        return Ok(Some(result));
    }

    let original_lines: Vec<&str> = original_text.lines().collect();
    let modified_lines: Vec<&str> = modified_text.lines().collect();
    let patterns = ParamPatterns::shared();

    let param_changes = if original_bytes.len() <= options.max_bytes
        && modified_bytes.len() <= options.max_bytes
    {
        let diff = unified_diff(
            &original_lines,
            &modified_lines,
            &format!("original/{name}"),
            &format!("modded/{}", display_name(modified)),
            options.context,
        );
        let changed = extract_changed_lines(&diff);
        let params = extract_param_changes(&changed, mode, patterns);
        result.diff = Some(diff);
        result.changed_lines = Some(changed);
        params
    } else {
        warn!(
            "{name} exceeds {} bytes; falling back to whole-file parameter comparison",
            options.max_bytes
        );
        result.diff_truncated = true;
        let original_params = parse_params(original_lines.iter().copied(), patterns);
        let modified_params = parse_params(modified_lines.iter().copied(), patterns);
        diff_param_maps(&original_params, &modified_params)
    };

    if !param_changes.is_empty() {
        result.param_changes = Some(param_changes);
    }
    Ok(Some(result))
}

fn has_comparison_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| COMPARISON_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Relative paths of every comparable file under `root`, sorted.
fn collect_files(root: &Path) -> Result<BTreeSet<PathBuf>, CompareError> {
    let mut files = BTreeSet::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|source| CompareError::ReadDirectory {
            path: dir.clone(),
            source,
        })?;
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            // Symlinked directories are not descended into.
            if file_type.is_dir() {
                pending.push(path);
            } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
                && has_comparison_extension(&path)
            {
                if let Ok(relative) = path.strip_prefix(root) {
                    files.insert(relative.to_path_buf());
                }
            }
        }
    }
    Ok(files)
}

fn relative_display(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Compare two directory trees file by file.
///
/// Files present only in `modified_root` are reported as
/// [`ChangeKind::Added`] when they are text. Every result records the two
/// source paths it was computed from. Results are ordered by their path
/// relative to the roots.
pub fn compare_trees(
    original_root: &Path,
    modified_root: &Path,
    options: &CompareOptions,
) -> Result<Vec<FileComparison>, CompareError> {
    let original_files = collect_files(original_root)?;
    let modified_files = collect_files(modified_root)?;
    debug!(
        "Comparing {} original and {} modified files",
        original_files.len(),
        modified_files.len()
    );

    let mut results = Vec::new();
    for relative in &original_files {
        let original = original_root.join(relative);
        let modified = modified_root.join(relative);
        if let Some(result) = compare_files(&original, &modified, options)? {
            results.push(
                result
                    .with_path(relative_display(relative))
                    .with_sources(&original, &modified),
            );
        }
    }

    for relative in modified_files.difference(&original_files) {
        let modified = modified_root.join(relative);
        let bytes = match std::fs::read(&modified) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("Skipping unreadable added file {}: {err}", relative.display());
                continue;
            }
        };
        if is_text(&bytes) {
            results.push(
                FileComparison::new(relative_display(relative), ChangeKind::Added)
                    .with_sources(&original_root.join(relative), &modified),
            );
        }
    }

    results.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(ChangeKind::ModifiedBinary.to_string(), "modified-binary");
        assert_eq!(
            serde_json::to_string(&ChangeKind::ModifiedText).unwrap(),
            "\"modified-text\""
        );
    }

    #[test]
    fn test_zero_max_bytes_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.scr", b"x");
        let options = CompareOptions {
            max_bytes: 0,
            ..CompareOptions::default()
        };
        assert!(matches!(
            compare_files(&a, &a, &options),
            Err(CompareError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_missing_original_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let b = write(dir.path(), "b.scr", b"x");
        let result = compare_files(&dir.path().join("nope.scr"), &b, &CompareOptions::default());
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_missing_modified_with_binary_original_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.bin", b"\x00\x01");
        let result = compare_files(&a, &dir.path().join("gone.bin"), &CompareOptions::default());
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_include_diff_false_skips_details() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a/p.scr", b"Speed(10);\n");
        let b = write(dir.path(), "b/p.scr", b"Speed(20);\n");
        let options = CompareOptions {
            include_diff: false,
            ..CompareOptions::default()
        };
        let result = compare_files(&a, &b, &options).unwrap().unwrap();
        assert_eq!(result.kind(), ChangeKind::ModifiedText);
        assert!(result.diff().is_none());
        assert!(result.changed_lines().is_none());
        assert!(result.param_changes().is_none());
        assert!(!result.diff_truncated());
    }

    #[test]
    fn test_json_like_pair_uses_json_mode() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a/hud.gui", br#"{"scale":1,"alpha":0.5}"#);
        let b = write(dir.path(), "b/hud.gui", b"{\n  \"alpha\": 0.5,\n  \"scale\": 2\n}\n");
        let result = compare_files(&a, &b, &CompareOptions::default()).unwrap().unwrap();
        assert_eq!(
            result.param_changes().unwrap(),
            &[ParamChange::new("scale", "1", "2")]
        );
        assert!(result.diff().unwrap().contains("--- original/hud.gui"));
        assert!(result.diff().unwrap().contains("+++ modded/hud.gui"));
    }

    #[test]
    fn test_reformatted_json_has_empty_diff() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a/x.json", br#"{"a":1,"b":2}"#);
        let b = write(dir.path(), "b/x.json", b"{\n  \"b\": 2,\n  \"a\": 1\n}");
        let result = compare_files(&a, &b, &CompareOptions::default()).unwrap().unwrap();
        assert_eq!(result.kind(), ChangeKind::ModifiedText);
        assert_eq!(result.diff(), Some(""));
        assert_eq!(result.changed_lines(), Some(&[][..]));
        assert!(result.param_changes().is_none());
    }

    #[test]
    fn test_json_extension_with_invalid_side_compares_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a/s.cfg", b"Speed(10);\n");
        let b = write(dir.path(), "b/s.cfg", b"Speed(20);\n");
        let result = compare_files(&a, &b, &CompareOptions::default()).unwrap().unwrap();
        assert_eq!(
            result.param_changes().unwrap(),
            &[ParamChange::new("Speed", "10", "20")]
        );
    }

    #[test]
    fn test_tree_comparison() {
        let original = tempfile::tempdir().unwrap();
        let modified = tempfile::tempdir().unwrap();
        write(original.path(), "scripts/player.scr", b"Param(\"Health\", 100);\n");
        write(modified.path(), "scripts/player.scr", b"Param(\"Health\", 150);\n");
        write(original.path(), "same.txt", b"unchanged\n");
        write(modified.path(), "same.txt", b"unchanged\n");
        write(original.path(), "old.ini", b"fov = 90\n");
        write(modified.path(), "new.loot", b"LootedObject(\"Chest\") {\n");
        write(modified.path(), "skip.png", b"\x89PNG");

        let results = compare_trees(original.path(), modified.path(), &CompareOptions::default()).unwrap();
        let summary: Vec<_> = results.iter().map(|r| (r.path(), r.kind())).collect();
        assert_eq!(
            summary,
            vec![
                ("new.loot", ChangeKind::Added),
                ("old.ini", ChangeKind::Removed),
                ("scripts/player.scr", ChangeKind::ModifiedText),
            ]
        );
    }

    #[test]
    fn test_tree_results_carry_source_paths() {
        let original = tempfile::tempdir().unwrap();
        let modified = tempfile::tempdir().unwrap();
        write(original.path(), "a.scr", b"Speed(10);\n");
        write(modified.path(), "a.scr", b"Speed(20);\n");
        write(modified.path(), "extra.txt", b"hello\n");

        let results = compare_trees(original.path(), modified.path(), &CompareOptions::default()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].path(), "a.scr");
        assert_eq!(results[0].original_file(), Some(original.path().join("a.scr").as_path()));
        assert_eq!(results[0].modified_file(), Some(modified.path().join("a.scr").as_path()));
        assert_eq!(results[1].kind(), ChangeKind::Added);
        assert_eq!(results[1].modified_file(), Some(modified.path().join("extra.txt").as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_walk_skips_symlinked_directories() {
        let original = tempfile::tempdir().unwrap();
        let modified = tempfile::tempdir().unwrap();
        write(original.path(), "scripts/a.scr", b"Speed(10);\n");
        write(modified.path(), "scripts/a.scr", b"Speed(20);\n");
        std::os::unix::fs::symlink(original.path(), original.path().join("scripts/loop")).unwrap();
        std::os::unix::fs::symlink(modified.path(), modified.path().join("scripts/loop")).unwrap();

        let results = compare_trees(original.path(), modified.path(), &CompareOptions::default()).unwrap();
        let paths: Vec<_> = results.iter().map(|r| r.path()).collect();
        assert_eq!(paths, vec!["scripts/a.scr"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_walk_follows_symlinked_files() {
        let original = tempfile::tempdir().unwrap();
        let modified = tempfile::tempdir().unwrap();
        let target = write(original.path(), "real/a.scr", b"Speed(10);\n");
        std::os::unix::fs::symlink(&target, original.path().join("link.scr")).unwrap();
        write(modified.path(), "real/a.scr", b"Speed(10);\n");
        write(modified.path(), "link.scr", b"Speed(30);\n");

        let results = compare_trees(original.path(), modified.path(), &CompareOptions::default()).unwrap();
        let paths: Vec<_> = results.iter().map(|r| (r.path(), r.kind())).collect();
        assert_eq!(paths, vec![("link.scr", ChangeKind::ModifiedText)]);
    }

    #[test]
    fn test_tree_comparison_missing_root_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = compare_trees(&dir.path().join("nope"), dir.path(), &CompareOptions::default());
        assert!(matches!(result, Err(CompareError::ReadDirectory { .. })));
    }
}
