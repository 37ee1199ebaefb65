//! Error types shared across the store, router and backend.

use thiserror::Error;

/// Failures of the key-value store backing the offline chain and preferences.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error on key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Stored bytes are not valid UTF-8 text.
    #[error("stored value for key `{key}` is not valid UTF-8")]
    Corrupt { key: String },

    #[error("failed to serialize value for key `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures a caller of the request router must handle.
///
/// An HTTP error status is *not* an error here: it comes back as an
/// [`ApiResponse`](crate::router::ApiResponse) with that status.
#[derive(Debug, Error)]
pub enum RouterError {
    /// No usable response was obtained: connection failure, DNS failure,
    /// or a body that is not JSON.
    #[error("backend unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rejections from the backend's strict certificate reader.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateError {
    #[error("Certificate must be a string")]
    Missing,

    #[error("Certificate cannot be empty")]
    Empty,
}

/// Rejections when updating persisted preferences.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Please enter a valid backend URL.")]
    EmptyUrl,

    #[error("unknown mode `{0}` (expected `online` or `offline`)")]
    UnknownMode(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
