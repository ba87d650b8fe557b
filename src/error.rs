// src/error.rs
//! Error kinds per pipeline boundary. Each stage classifies its own failures;
//! the pipeline decides whether a kind means fallback, skip, or abort.

use std::path::PathBuf;

/// Wire-feed fetch failures. Every variant sends the pipeline to the snapshot.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("wire feed request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("wire feed returned HTTP {status}")]
    Status { status: u16 },
    #[error("wire feed body malformed: {0}")]
    Parse(String),
    #[error("bad first_published_date {value:?} on {slug}")]
    Timestamp { slug: String, value: String },
    #[error("wire feed returned no articles")]
    EmptyFeed,
}

/// Sentiment service failures, scoped to one text.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("sentiment auth failed: {0}")]
    Auth(String),
    #[error("sentiment request failed: {0}")]
    Network(#[source] reqwest::Error),
    #[error("sentiment service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("sentiment response malformed: {0}")]
    Parse(String),
}

impl AnalyzeError {
    /// Auth failures repeat for every article; the batch logs them at error
    /// level instead of warn and keeps going.
    pub fn is_auth(&self) -> bool {
        matches!(self, AnalyzeError::Auth(_))
            || matches!(self, AnalyzeError::Status { status: 401 | 403, .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("reading snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot {path} row {row}: {source}")]
    Csv {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("writing snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("snapshot {path}: unknown level {level:?} on row {row}")]
    Level {
        path: PathBuf,
        row: usize,
        level: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing {var} env var (config value is \"ENV\")")]
    MissingEnv { var: &'static str },
}
