//! Outcomes of a pipeline run.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Upload phase
// ---------------------------------------------------------------------------

/// Why an upload task ended unsuccessfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The call never produced a response (network, timeout, unreadable file).
    Transport { message: String },
    /// The key exists and overwriting was not enabled.
    Conflict,
    /// The key still conflicted after retrying with an overwrite token.
    ConflictAfterOverwrite,
    /// Any other non-success status.
    Status {
        status_code: u16,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Terminal state of one upload task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UploadOutcome {
    /// Stored; `overwritten` when the scoped retry was needed.
    Uploaded { overwritten: bool },
    Failed { reason: FailureReason },
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Uploaded { .. })
    }
}

/// Outcome of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub remote_key: String,
    #[serde(flatten)]
    pub outcome: UploadOutcome,
}

/// Aggregate of the upload phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub files: Vec<FileReport>,
    /// Markup files that were skipped.
    pub excluded: Vec<String>,
}

impl UploadSummary {
    /// True only if every scheduled task succeeded.
    pub fn is_success(&self) -> bool {
        self.files.iter().all(|f| f.outcome.is_success())
    }

    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_success()).count()
    }

    pub fn overwritten(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, UploadOutcome::Uploaded { overwritten: true }))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.outcome.is_success())
    }
}

// ---------------------------------------------------------------------------
// Reconcile phase
// ---------------------------------------------------------------------------

/// Result of the optional purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// `clear` was off.
    Skipped,
    /// Nothing under the prefix.
    Empty,
    /// The listing could not be completed; nothing was deleted.
    ListingFailed { message: String },
    /// Every listed key was submitted for deletion.
    Purged {
        listed: usize,
        deleted: usize,
        batches: usize,
        partial_batches: usize,
        failed_batches: usize,
    },
}

impl ReconcileOutcome {
    /// False when any part of the purge went wrong.
    pub fn is_clean(&self) -> bool {
        match self {
            ReconcileOutcome::Skipped | ReconcileOutcome::Empty => true,
            ReconcileOutcome::ListingFailed { .. } => false,
            ReconcileOutcome::Purged {
                partial_batches,
                failed_batches,
                ..
            } => *partial_batches == 0 && *failed_batches == 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Everything one pipeline run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub success: bool,
    pub reconcile: ReconcileOutcome,
    pub upload: UploadSummary,
    pub duration_ms: u128,
}

impl PipelineReport {
    /// Only the upload phase decides the outcome; purge problems are warnings.
    pub fn new(reconcile: ReconcileOutcome, upload: UploadSummary, duration_ms: u128) -> Self {
        Self {
            success: upload.is_success(),
            reconcile,
            upload,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}
