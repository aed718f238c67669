//! Error types for distsync-store.

use std::path::PathBuf;

use thiserror::Error;

/// A store call that failed before producing a response.
///
/// Non-success statuses are *not* errors; they come back inside
/// [`ResponseInfo`](crate::ResponseInfo).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network failure, timeout, or connection refused.
    #[error("transport error: {0}")]
    Transport(String),

    /// The local file to upload could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store answered with a body that could not be decoded.
    #[error("could not decode {what} response: {message}")]
    Decode { what: &'static str, message: String },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
