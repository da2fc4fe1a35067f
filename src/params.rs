/// Parameter-level change extraction from changed line pairs.
/// The recognized grammars are heuristics, not parsers: each line is tried
/// against a fixed cascade of patterns and the first match wins.
use crate::changes::ChangedLine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// Keyword of the named-value call, `Param("Name", value);`.
pub const NAMED_VALUE_KEYWORD: &str = "Param";

/// `Param("Name", "Value");` or `Param("Name", 123);`
pub const NAMED_VALUE_PATTERN: &str = r#"Param\("([^"]+)",\s*(".*?"|\S+)\)\s*;"#;

/// `Name(args);` or `Name(args) {`, possibly indented. Lines whose call name is
/// [`NAMED_VALUE_KEYWORD`] are rejected after matching.
pub const CALL_PATTERN: &str = r"^\s*(\w+)\s*\((.*?)\)\s*(?:;|\{)";

/// INI `key = value`.
pub const INI_PATTERN: &str = r"^\s*([^=#\[\s]+?)\s*=\s*(.+?)\s*$";

/// Normalized JSON `"key": value,`.
pub const JSON_KEY_VALUE_PATTERN: &str = r#"^\s*"([^"]+)":\s*(.+?)\s*,?\s*$"#;

/// Which grammar family a file's changed lines are read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Named-value calls, generic calls and INI pairs.
    Generic,
    /// `"key": value` lines of normalized JSON.
    Json,
}

/// Compiled value-syntax patterns, passed explicitly to the extractors.
#[derive(Debug, Clone)]
pub struct ParamPatterns {
    pub named_value: Regex,
    pub call: Regex,
    pub ini: Regex,
    pub json_key_value: Regex,
}

static SHARED_PATTERNS: Lazy<ParamPatterns> = Lazy::new(ParamPatterns::new);

impl ParamPatterns {
    pub fn new() -> Self {
        Self {
            named_value: Regex::new(NAMED_VALUE_PATTERN).expect("valid named-value pattern"),
            call: Regex::new(CALL_PATTERN).expect("valid call pattern"),
            ini: Regex::new(INI_PATTERN).expect("valid INI pattern"),
            json_key_value: Regex::new(JSON_KEY_VALUE_PATTERN).expect("valid JSON pattern"),
        }
    }

    /// Process-wide compiled copy of the default patterns.
    pub fn shared() -> &'static ParamPatterns {
        &SHARED_PATTERNS
    }

    fn match_named_value(&self, line: &str) -> Option<(String, String)> {
        let caps = self.named_value.captures(line)?;
        let value = unquote(caps[2].trim());
        Some((caps[1].to_string(), value.to_string()))
    }

    /// Returns the call name and raw (trimmed, still quoted) argument text.
    fn match_call<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let caps = self.call.captures(line)?;
        let name = caps.get(1)?.as_str();
        if name == NAMED_VALUE_KEYWORD {
            return None;
        }
        Some((name, caps.get(2)?.as_str().trim()))
    }

    fn match_ini(&self, line: &str) -> Option<(String, String)> {
        let caps = self.ini.captures(line)?;
        let value = unquote(caps[2].trim());
        Some((caps[1].trim().to_string(), value.to_string()))
    }

    fn match_json(&self, line: &str) -> Option<(String, String)> {
        let caps = self.json_key_value.captures(line)?;
        let value = caps[2].trim().trim_end_matches(',').trim();
        Some((caps[1].to_string(), unquote(value).to_string()))
    }

    /// Name and value from a script/config line, trying the named-value
    /// call, then a generic call, then INI.
    pub fn extract(&self, line: &str) -> Option<(String, String)> {
        if let Some(found) = self.match_named_value(line) {
            return Some(found);
        }
        if let Some((name, args)) = self.match_call(line) {
            // Multi-argument calls report their last argument: bone("PELVIS", "Pelvis") -> Pelvis
            let value = match args.rsplit_once(',') {
                Some((_, last)) => last.trim(),
                None => args,
            };
            return Some((name.to_string(), unquote(value).to_string()));
        }
        self.match_ini(line)
    }

    /// Name and value from a normalized JSON line.
    pub fn extract_json(&self, line: &str) -> Option<(String, String)> {
        self.match_json(line)
    }
}

impl Default for ParamPatterns {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip one pair of surrounding double quotes. A lone `"` unquotes to
/// the empty string.
fn unquote(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') {
        value.get(1..value.len() - 1).unwrap_or("")
    } else {
        value
    }
}

/// A named value that differs between the two files. Additions carry an
/// empty `old_value`; removals an empty `new_value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamChange {
    pub name: String,
    pub old_value: String,
    pub new_value: String,
}

impl ParamChange {
    pub fn new(name: impl Into<String>, old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }
}

fn classify(old: Option<(String, String)>, new: Option<(String, String)>) -> Option<ParamChange> {
    match (old, new) {
        (Some((old_name, old_value)), Some((new_name, new_value))) => {
            if old_name == new_name && old_value != new_value {
                Some(ParamChange::new(old_name, old_value, new_value))
            } else {
                None
            }
        }
        (None, Some((name, value))) => Some(ParamChange::new(name, "", value)),
        (Some((name, value)), None) => Some(ParamChange::new(name, value, "")),
        (None, None) => None,
    }
}

/// Every parameter change found while walking `changed` in order.
/// Repeated names are all kept.
pub fn extract_param_changes(
    changed: &[ChangedLine],
    mode: ExtractionMode,
    patterns: &ParamPatterns,
) -> Vec<ParamChange> {
    let extract = |line: &Option<String>| {
        line.as_deref().and_then(|text| match mode {
            ExtractionMode::Generic => patterns.extract(text),
            ExtractionMode::Json => patterns.extract_json(text),
        })
    };

    changed
        .iter()
        .filter_map(|pair| classify(extract(&pair.old_line), extract(&pair.new_line)))
        .collect()
}

/// Name -> value mapping for a whole file. A repeated name overwrites its
/// value but keeps the position of its first appearance.
#[derive(Debug, Default, Clone)]
pub struct ParamMap {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ParamMap {
    pub fn insert(&mut self, name: String, value: String) {
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(name).map(|&slot| self.entries[slot].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scan every line with the named-value and call patterns. Unlike
/// [`ParamPatterns::extract`], call arguments are kept whole and INI lines
/// are ignored.
pub fn parse_params<'a>(lines: impl IntoIterator<Item = &'a str>, patterns: &ParamPatterns) -> ParamMap {
    let mut map = ParamMap::default();
    for line in lines {
        if let Some((name, value)) = patterns.match_named_value(line) {
            map.insert(name, value);
        } else if let Some((name, args)) = patterns.match_call(line) {
            map.insert(name.to_string(), unquote(args).to_string());
        }
    }
    map
}

/// Modifications between two whole-file maps, in the original map's order.
/// Names present on only one side are not reported.
pub fn diff_param_maps(original: &ParamMap, modified: &ParamMap) -> Vec<ParamChange> {
    original
        .iter()
        .filter_map(|(name, old_value)| {
            let new_value = modified.get(name)?;
            (new_value != old_value).then(|| ParamChange::new(name, old_value, new_value))
        })
        .collect()
}
