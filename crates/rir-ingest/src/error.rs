//! Error types for the ingestion pipeline

use rir_common::RirError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Everything that can abort an ingestion run
#[derive(Error, Debug)]
pub enum IngestError {
    /// Transport-level failure (connect, TLS, body read)
    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("{url} did not return UTF-8 text")]
    InvalidBody { url: String },

    /// Canonical URL and every dated fallback failed; `source` is the
    /// canonical URL's error
    #[error("Registry statistics unavailable at {url} ({fallbacks} fallback URLs also failed): {source}")]
    SourceUnavailable {
        url: String,
        fallbacks: usize,
        #[source]
        source: Box<IngestError>,
    },

    #[error("Malformed statistics document from {url}: {source}")]
    Document {
        url: String,
        #[source]
        source: RirError,
    },

    #[error("{count} resources are claimed by more than one registry (first: {first})")]
    DuplicateResources { count: usize, first: String },

    #[error(transparent)]
    Rir(#[from] RirError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IngestError {
    /// URL the error is about, if it came from a fetch
    pub fn url(&self) -> Option<&str> {
        match self {
            IngestError::Http { url, .. }
            | IngestError::HttpStatus { url, .. }
            | IngestError::InvalidBody { url }
            | IngestError::SourceUnavailable { url, .. }
            | IngestError::Document { url, .. } => Some(url),
            _ => None,
        }
    }
}
