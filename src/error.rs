//! Error types for the chem-table library.

use thiserror::Error;

/// Errors that can occur while loading, caching, or editing records.
#[derive(Error, Debug)]
pub enum Error {
    /// The data source answered with a non-success status.
    #[error("HTTP error! status: {status} ({url})")]
    Status {
        /// URL that was requested.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The record document was not a JSON array of records.
    #[error("Malformed record document: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during cache or terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed or written.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A new record failed the creation checks.
    #[error("{0}")]
    Validation(String),

    /// An asset could not be stored during cache install.
    #[error("Failed to cache {url}: {reason}")]
    CacheInstall {
        /// Asset URL that failed.
        url: String,
        /// Why it failed.
        reason: String,
    },
}

impl Error {
    /// Returns `true` for failures of the remote record fetch.
    #[must_use]
    pub const fn is_load_failure(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Http(_) | Self::Json(_))
    }
}

/// A specialized `Result` type for chem-table operations.
pub type Result<T> = std::result::Result<T, Error>;
