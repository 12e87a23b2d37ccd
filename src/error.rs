//! Crate-wide error type.
//!
//! Only failures that abort a run surface as [`Error`]. Per-entry fetch and
//! summarization failures are absorbed by the pipeline and never reach here.

/// Fatal pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Source {name} failed: {reason}")]
    Source { name: String, reason: String },

    #[error("Summarizer error: {0}")]
    Summarize(String),

    #[error("Notification failed: {0}")]
    Notify(String),
}

pub type Result<T> = std::result::Result<T, Error>;
