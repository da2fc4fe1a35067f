use std::path::Path;

/// Extensions whose files carry JSON in this domain, even when not named `.json`.
pub const JSON_LIKE_EXTENSIONS: &[&str] = &["json", "gui", "cfg"];

/// Whether `path` has one of the JSON-like extensions (case-insensitive).
pub fn is_json_like(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            JSON_LIKE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Re-serialize `content` as JSON with sorted object keys and 2-space indentation.
/// Returns `None` when the content does not parse as JSON.
pub fn normalize_json(content: &str) -> Option<String> {
    // serde_json's default Map is a BTreeMap, so object keys come out sorted.
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    serde_json::to_string_pretty(&value).ok()
}

/// Normalize both sides only when both parse; otherwise neither is touched.
pub fn normalize_pair(original: &str, modified: &str) -> Option<(String, String)> {
    let original = normalize_json(original)?;
    let modified = normalize_json(modified)?;
    Some((original, modified))
}
