/// Reconstruct old/new line pairs from unified diff text.
/// Pairing is adjacency based: a `-` line is paired only with a `+` line that
/// immediately follows it. Only one removal is ever pending, so in a run of
/// several `-` lines the earlier ones surface as unpaired removals.
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Hunk line numbers above this are treated as a parse error.
pub const MAX_HUNK_LINE: u64 = 100_000_000;

static HUNK_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("valid hunk header regex")
});

/// One logical change: a paired replacement, a pure addition or a pure removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedLine {
    pub old_line: Option<String>,
    pub new_line: Option<String>,
    pub old_line_number: Option<usize>,
    pub new_line_number: Option<usize>,
}

impl ChangedLine {
    fn paired(old: String, new: String, old_no: Option<usize>, new_no: Option<usize>) -> Self {
        Self {
            old_line: Some(old),
            new_line: Some(new),
            old_line_number: old_no,
            new_line_number: new_no,
        }
    }

    fn added(new: String, new_no: Option<usize>) -> Self {
        Self {
            old_line: None,
            new_line: Some(new),
            old_line_number: None,
            new_line_number: new_no,
        }
    }

    fn removed(old: String, old_no: Option<usize>) -> Self {
        Self {
            old_line: Some(old),
            new_line: None,
            old_line_number: old_no,
            new_line_number: None,
        }
    }
}

/// Parse the old and new start lines out of a `@@ -a[,b] +c[,d] @@` header.
/// Returns `None` for malformed headers and for starts outside `1..=MAX_HUNK_LINE`.
pub fn parse_hunk_header(line: &str) -> Option<(usize, usize)> {
    let caps = HUNK_HEADER_RE.captures(line)?;
    let old_start: u64 = caps.get(1)?.as_str().parse().ok()?;
    let new_start: u64 = caps.get(3)?.as_str().parse().ok()?;
    let in_bounds = |n: u64| n > 0 && n <= MAX_HUNK_LINE;
    if !in_bounds(old_start) || !in_bounds(new_start) {
        return None;
    }
    Some((old_start as usize, new_start as usize))
}

/// Pending `-` line waiting for a `+` partner.
struct PendingRemoval {
    content: String,
    line_number: Option<usize>,
}

impl PendingRemoval {
    fn flush(self) -> ChangedLine {
        ChangedLine::removed(self.content, self.line_number)
    }
}

/// Walk a unified diff and emit one [`ChangedLine`] per logical change,
/// in hunk order. Line numbers come from each hunk header; a header that
/// cannot be parsed leaves that hunk's numbers as `None`.
pub fn extract_changed_lines(diff: &str) -> Vec<ChangedLine> {
    let mut changes = Vec::new();
    let mut old_no: Option<usize> = None;
    let mut new_no: Option<usize> = None;
    let mut pending: Option<PendingRemoval> = None;

    for line in diff.lines() {
        if line.starts_with("@@") {
            match parse_hunk_header(line) {
                Some((old_start, new_start)) => {
                    old_no = Some(old_start);
                    new_no = Some(new_start);
                }
                None => {
                    debug!("Unusable hunk header {line:?}; line numbers disabled for this hunk");
                    old_no = None;
                    new_no = None;
                }
            }
            // Removals never pair across hunks.
            if let Some(removal) = pending.take() {
                changes.push(removal.flush());
            }
            continue;
        }

        if line.starts_with("---") || line.starts_with("+++") || line.is_empty() {
            continue;
        }

        if let Some(content) = line.strip_prefix('-').filter(|_| !line.starts_with("--")) {
            if let Some(earlier) = pending.take() {
                changes.push(earlier.flush());
            }
            pending = Some(PendingRemoval {
                content: content.to_string(),
                line_number: old_no,
            });
            old_no = old_no.map(|n| n + 1);
        } else if let Some(content) = line.strip_prefix('+').filter(|_| !line.starts_with("++")) {
            let change = match pending.take() {
                Some(removal) => ChangedLine::paired(
                    removal.content,
                    content.to_string(),
                    removal.line_number,
                    new_no,
                ),
                None => ChangedLine::added(content.to_string(), new_no),
            };
            changes.push(change);
            new_no = new_no.map(|n| n + 1);
        } else {
            if let Some(removal) = pending.take() {
                changes.push(removal.flush());
            }
            old_no = old_no.map(|n| n + 1);
            new_no = new_no.map(|n| n + 1);
        }
    }

    if let Some(removal) = pending.take() {
        changes.push(removal.flush());
    }
    changes
}
