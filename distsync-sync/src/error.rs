//! Error types for distsync-sync.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a pipeline from being started.
///
/// Failures *during* a run never surface here; they are folded into the
/// [`PipelineReport`](crate::PipelineReport).
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error while scanning the build output, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The build output directory does not exist or is not a directory.
    #[error("build output directory not found: {0}")]
    OutputDirMissing(PathBuf),

    /// `on_build_done` was called outside a tokio runtime.
    #[error("no tokio runtime available to run the pipeline on")]
    NoRuntime,
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
