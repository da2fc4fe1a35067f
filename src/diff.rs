/// Unified diff generation on top of `similar`'s line-level edit script.
/// Output follows the classic `---`/`+++`/`@@ -a,b +c,d @@` grammar that
/// [`crate::changes::extract_changed_lines`] reads back.
use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffTag};
use std::ops::Range;

/// Produce a unified diff between two line sequences.
/// Returns an empty string when the sequences are equal.
pub fn unified_diff(
    old: &[&str],
    new: &[&str],
    from_label: &str,
    to_label: &str,
    context: usize,
) -> String {
    let ops = capture_diff_slices(Algorithm::Myers, old, new);
    let groups = group_diff_ops(ops, context);
    if groups.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("--- {from_label}\n"));
    out.push_str(&format!("+++ {to_label}\n"));

    for group in &groups {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_span = first.old_range().start..last.old_range().end;
        let new_span = first.new_range().start..last.new_range().end;
        out.push_str(&format!(
            "@@ -{} +{} @@\n",
            format_range(&old_span),
            format_range(&new_span)
        ));

        for op in group {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => push_lines(&mut out, ' ', &old[old_range]),
                DiffTag::Delete => push_lines(&mut out, '-', &old[old_range]),
                DiffTag::Insert => push_lines(&mut out, '+', &new[new_range]),
                DiffTag::Replace => {
                    push_lines(&mut out, '-', &old[old_range]);
                    push_lines(&mut out, '+', &new[new_range]);
                }
            }
        }
    }
    out
}

fn push_lines(out: &mut String, prefix: char, lines: &[&str]) {
    for line in lines {
        out.push(prefix);
        out.push_str(line);
        out.push('\n');
    }
}

/// Format a 0-based half-open range as a 1-based hunk range.
/// A single line prints as `start`; an empty range points at the line before it.
fn format_range(range: &Range<usize>) -> String {
    let len = range.end.saturating_sub(range.start);
    match len {
        0 => format!("{},0", range.start),
        1 => format!("{}", range.start + 1),
        _ => format!("{},{}", range.start + 1, len),
    }
}
