use std::path::PathBuf;
use thiserror::Error;

/// Only usage mistakes and an unreadable original are errors. Pattern misses,
/// malformed JSON and malformed hunk headers show up as missing data instead.
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to read original file {}: {source}", .path.display())]
    ReadOriginal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list directory {}: {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
