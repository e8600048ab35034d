// src/error.rs

use thiserror::Error;

/// Fatal conditions that stop a run. Non-fatal conditions (a filter column
/// missing after the merge, an unparseable numeric cell) never surface here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GET {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("no table found on {url}")]
    NoTableFound { url: String },

    #[error("could not extract headers from {url}")]
    NoHeadersFound { url: String },

    #[error("table on {url} has no data rows")]
    NoRowsFound { url: String },

    #[error("{source_name}: identity column {column} not present after width reconciliation")]
    IdentityColumnMissing { source_name: String, column: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML deserialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
