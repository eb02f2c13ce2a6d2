//! Centralized error types for gmaildump.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the gmaildump library.
#[derive(Error, Debug)]
pub enum DumpError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Underlying HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// A JSON payload could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A base64url payload could not be decoded.
    #[error("Base64 decoding error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The OAuth credentials file is missing or malformed.
    #[error("Invalid credentials file '{path}': {reason}")]
    InvalidCredentials { path: PathBuf, reason: String },

    /// The interactive authorization flow failed.
    #[error("Authorization failed: {0}")]
    AuthFlow(String),

    /// The address list file does not exist.
    #[error("Address file not found: {0}")]
    AddressFileNotFound(PathBuf),

    /// The address list file contains no usable addresses.
    #[error("No email addresses found in '{0}'")]
    NoAddresses(PathBuf),
}

/// Convenience alias for `Result<T, DumpError>`.
pub type Result<T> = std::result::Result<T, DumpError>;

impl DumpError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `DumpError`
/// when no path context is available (rare; prefer `DumpError::io`).
impl From<std::io::Error> for DumpError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
