//! # distsync-sync
//!
//! Post-build synchronization of a build output directory with an object
//! store prefix.
//!
//! Call [`Pipeline::on_build_done`] from a build-completion hook to purge (if
//! configured) and upload in the background, or [`Pipeline::run`] to await
//! the [`PipelineReport`] directly.

pub mod build;
pub mod error;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod upload;

pub use build::BuildOutput;
pub use error::SyncError;
pub use pipeline::Pipeline;
pub use reconcile::Reconciler;
pub use report::{
    FailureReason, FileReport, PipelineReport, ReconcileOutcome, UploadOutcome, UploadSummary,
};
pub use upload::{plan, UploadPlan, UploadTask, Uploader};
