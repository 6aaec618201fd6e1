//! Error types for the artwork resolution engine.
//!
//! Two layers exist:
//! - [`HttpError`] is produced by the fetch client and carries the
//!   classification (`network` / `timeout` / `http`) that drives retries.
//! - [`ArtworkError`] is the crate-wide error returned by adapters, the
//!   manifest cache and the registry.

use std::path::PathBuf;
use thiserror::Error;

/// Classification of a failed HTTP operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpErrorKind {
    /// Connectivity failure (DNS, refused, reset, cancelled).
    Network,
    /// The per-attempt deadline elapsed.
    Timeout,
    /// The server answered with an error status.
    Http,
}

impl HttpErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpErrorKind::Network => "network",
            HttpErrorKind::Timeout => "timeout",
            HttpErrorKind::Http => "http",
        }
    }
}

impl std::fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified HTTP failure.
///
/// `retryable` is decided when the error is created and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct HttpError {
    pub kind: HttpErrorKind,
    pub message: String,
    pub retryable: bool,
    pub status: Option<u16>,
}

impl HttpError {
    /// Create a network-layer error.
    pub fn network(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind: HttpErrorKind::Network,
            message: message.into(),
            retryable,
            status: None,
        }
    }

    /// Create a deadline error. Timeouts are always retryable.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: HttpErrorKind::Timeout,
            message: message.into(),
            retryable: true,
            status: None,
        }
    }

    /// Create a status-code error.
    pub fn status(status: u16, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind: HttpErrorKind::Http,
            message: message.into(),
            retryable,
            status: Some(status),
        }
    }

    /// Returns true when the server reported that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

/// Main error type for romart.
#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Adapter not registered: {id}")]
    AdapterNotRegistered { id: String },

    #[error("Adapter {adapter} failed to initialize: {message}")]
    Initialization { adapter: String, message: String },

    #[error("Invalid options for adapter {adapter}: {message}")]
    InvalidOptions { adapter: String, message: String },

    #[error("Manifest for platform {platform} ({media}) unavailable: {message}")]
    Manifest {
        platform: u32,
        media: String,
        message: String,
    },

    #[error("Unsupported platform {platform} for adapter {adapter}")]
    UnsupportedPlatform { adapter: String, platform: u32 },

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Unknown media type: {0}")]
    UnknownMediaType(String),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Result type alias for romart operations.
pub type Result<T> = std::result::Result<T, ArtworkError>;

impl From<std::io::Error> for ArtworkError {
    fn from(err: std::io::Error) -> Self {
        ArtworkError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ArtworkError {
    fn from(err: serde_json::Error) -> Self {
        ArtworkError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ArtworkError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ArtworkError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Check if this error came from a transient condition.
    pub fn is_retryable(&self) -> bool {
        match self {
            ArtworkError::Http(e) => e.retryable,
            _ => false,
        }
    }
}
