//! Shared Error Types
//!
//! Every fallible operation in the crate returns one of these classified
//! errors; none of the expected failure modes (missing file, bad JSON,
//! timeout, non-2xx response) panics.
//!
//! # Error Categories
//!
//! - `ValidationErrors` - per-field messages, shown inline and never persisted
//! - `ApiError` - transport or HTTP failures from the remote collaborator
//! - `StorageError` - reading or writing cache, draft and preference files
//! - `BundleError` - no usable form bundle from the API or the cache
//! - `RetryError` - a draft could not be redelivered
//!
//! # Usage
//!
//! ```rust
//! use formsync::shared::error::StorageError;
//!
//! let error = StorageError::invalid_draft("cases-1.json", "draft has no data");
//! assert!(error.to_string().contains("cases-1.json"));
//! ```
use crate::shared::draft::FailureReason;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Per-field validation messages, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field, replacing any earlier one.
    pub fn set(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} field(s) are invalid", self.errors.len())
    }
}

impl std::error::Error for ValidationErrors {}

/// Failures talking to the remote API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No HTTP response (connection refused, DNS, timeout, ...).
    #[error("network error: {0}")]
    Network(String),

    /// A response arrived with an unexpected status.
    #[error("server returned {status}: {body}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The endpoint URL is missing or malformed.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
        }
    }
}

/// Failures reading or writing local files.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid draft {id}: {reason}")]
    InvalidDraft { id: String, reason: String },
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_draft(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDraft {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// True when the underlying file simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// No bundle could be obtained from the API or the cache.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("no network and no cached forms available ({fetch})")]
    Unavailable {
        /// Why the remote fetch failed
        fetch: ApiError,
    },

    #[error("embedded forms are invalid: {0}")]
    Embedded(String),
}

/// A draft could not be redelivered; the draft file is left in place.
#[derive(Debug, Error)]
pub enum RetryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("draft {id} is missing form or data")]
    InvalidDraft { id: String },

    #[error("retry failed: {0}")]
    Delivery(FailureReason),
}
