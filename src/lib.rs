pub mod changes;
pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod json;
pub mod params;
pub mod runner;
pub mod text;

pub use changes::{extract_changed_lines, ChangedLine};
pub use compare::{compare_files, compare_trees, ChangeKind, CompareOptions, FileComparison};
pub use error::CompareError;
pub use params::{extract_param_changes, ExtractionMode, ParamChange, ParamPatterns};
pub use runner::{run_comparison, ComparisonReport, ComparisonSummary};
