//! Concurrent, conflict-aware upload of build output.
//!
//! Every task moves through at most two attempts:
//!
//! ```text
//! Attempted(base) ──614 + cover──▶ Attempted(scoped) ──▶ Terminal
//!        │                                │
//!        └──────── anything else ─────────┴──────────────▶ Terminal
//! ```
//!
//! Tasks run concurrently and independently; one failing never cancels
//! another.

use std::path::PathBuf;

use futures::future::join_all;

use distsync_core::{keys, Config, CredentialDeriver, UploadToken};
use distsync_store::ObjectStore;

use crate::build::BuildOutput;
use crate::report::{FailureReason, FileReport, UploadOutcome, UploadSummary};

/// One file scheduled for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub filename: String,
    pub remote_key: String,
    pub local_path: PathBuf,
}

/// Tasks for one build plus the markup files left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadPlan {
    pub tasks: Vec<UploadTask>,
    pub excluded: Vec<String>,
}

/// Build the task list for `output` under `prefix`. No I/O.
pub fn plan(output: &BuildOutput, prefix: &str) -> UploadPlan {
    let (upload, excluded) = output.partition();
    UploadPlan {
        tasks: upload
            .into_iter()
            .map(|filename| UploadTask {
                filename: filename.to_owned(),
                remote_key: keys::remote_key(prefix, filename),
                local_path: output.local_path(filename),
            })
            .collect(),
        excluded: excluded.into_iter().map(str::to_owned).collect(),
    }
}

enum Attempt {
    Base,
    Scoped(UploadToken),
}

/// Runs the upload phase of a pipeline.
pub struct Uploader<'a> {
    config: &'a Config,
    store: &'a dyn ObjectStore,
    deriver: &'a CredentialDeriver,
}

impl<'a> Uploader<'a> {
    pub fn new(
        config: &'a Config,
        store: &'a dyn ObjectStore,
        deriver: &'a CredentialDeriver,
    ) -> Self {
        Self {
            config,
            store,
            deriver,
        }
    }

    /// Upload every non-markup file of `output` and wait for all of them.
    pub async fn upload_all(&self, output: &BuildOutput) -> UploadSummary {
        let plan = plan(output, self.config.prefix());
        for excluded in &plan.excluded {
            tracing::debug!(file = %excluded, "skipping markup file");
        }

        let base = self.deriver.base_token();
        let files = join_all(plan.tasks.iter().map(|task| {
            let base = &base;
            async move {
                FileReport {
                    filename: task.filename.clone(),
                    remote_key: task.remote_key.clone(),
                    outcome: self.upload_one(task, base).await,
                }
            }
        }))
        .await;

        UploadSummary {
            files,
            excluded: plan.excluded,
        }
    }

    /// Upload a single task, retrying once with an overwrite token on conflict
    /// when `cover` is enabled.
    pub async fn upload_one(&self, task: &UploadTask, base: &UploadToken) -> UploadOutcome {
        let key = task.remote_key.as_str();
        let mut attempt = Attempt::Base;

        loop {
            let token = match &attempt {
                Attempt::Base => base,
                Attempt::Scoped(scoped) => scoped,
            };
            let is_retry = matches!(attempt, Attempt::Scoped(_));

            let info = match self.store.put_object(token, key, &task.local_path).await {
                Ok(info) => info,
                Err(err) => {
                    tracing::error!(key, error = %err, "upload failed");
                    return UploadOutcome::Failed {
                        reason: FailureReason::Transport {
                            message: err.to_string(),
                        },
                    };
                }
            };

            if info.is_success() {
                tracing::info!(key, overwritten = is_retry, "uploaded");
                return UploadOutcome::Uploaded {
                    overwritten: is_retry,
                };
            }

            if info.is_conflict() && !is_retry && self.config.cover() {
                tracing::warn!(key, "object exists, retrying with overwrite token");
                attempt = Attempt::Scoped(self.deriver.scoped_token(key));
                continue;
            }

            let reason = match (info.is_conflict(), is_retry) {
                (true, false) => FailureReason::Conflict,
                (true, true) => FailureReason::ConflictAfterOverwrite,
                (false, _) => FailureReason::Status {
                    status_code: info.effective_status(),
                    error: info.error.clone(),
                },
            };
            tracing::error!(
                key,
                status = info.effective_status(),
                error = info.error.as_deref().unwrap_or(""),
                "upload failed",
            );
            return UploadOutcome::Failed { reason };
        }
    }
}
