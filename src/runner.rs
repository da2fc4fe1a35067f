/// Runs the blocking comparison off the async executor and summarizes the outcome.
use crate::compare::{compare_files, compare_trees, ChangeKind, CompareOptions, FileComparison};
use log::debug;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Per-kind counts over a set of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    pub added: usize,
    pub removed: usize,
    pub modified_text: usize,
    pub modified_binary: usize,
}

impl ComparisonSummary {
    pub fn from_results(results: &[FileComparison]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.kind() {
                ChangeKind::Added => summary.added += 1,
                ChangeKind::Removed => summary.removed += 1,
                ChangeKind::ModifiedText => summary.modified_text += 1,
                ChangeKind::ModifiedBinary => summary.modified_binary += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified_text + self.modified_binary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub results: Vec<FileComparison>,
    pub summary: ComparisonSummary,
}

/// Resolve user input into an existing path. Blank input or a path that
/// does not exist yields `None`.
pub fn parse_file_path(input: &str) -> Option<PathBuf> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let path = PathBuf::from(trimmed);
    path.exists().then_some(path)
}

fn compare_blocking(
    original: &Path,
    modified: &Path,
    options: &CompareOptions,
) -> Result<ComparisonReport, String> {
    let results = if original.is_dir() && modified.is_dir() {
        compare_trees(original, modified, options).map_err(|e| e.to_string())?
    } else {
        compare_files(original, modified, options)
            .map_err(|e| e.to_string())?
            .map(|result| result.with_sources(original, modified))
            .into_iter()
            .collect()
    };
    let summary = ComparisonSummary::from_results(&results);
    Ok(ComparisonReport { results, summary })
}

/// Compare `original` against `modified` on the blocking thread pool.
///
/// Two directories are compared as trees; anything else as a single file
/// pair. Failures come back as a display string. Dropping the returned
/// future discards the result but does not stop the work already started.
pub async fn run_comparison(
    original: PathBuf,
    modified: PathBuf,
    options: CompareOptions,
) -> Result<ComparisonReport, String> {
    debug!(
        "Starting comparison of {} against {}",
        original.display(),
        modified.display()
    );
    tokio::task::spawn_blocking(move || compare_blocking(&original, &modified, &options))
        .await
        .map_err(|e| format!("Comparison task failed: {e}"))?
}
