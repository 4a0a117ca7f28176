use std::path::PathBuf;

use thiserror::Error;

/// Failures at the input boundary. Scoring itself never fails.
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("invalid content snapshot: {0}")]
    InvalidSnapshot(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
