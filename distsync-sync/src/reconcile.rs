//! Best-effort purge of everything under the pipeline's prefix.

use distsync_store::{BatchStatus, ObjectStore, StoreError, MAX_BATCH_OPS};
use thiserror::Error;

use crate::report::ReconcileOutcome;

/// Why a prefix listing could not be completed.
#[derive(Debug, Error)]
enum ListingError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("listing returned status {status_code}{}", detail(.error))]
    Status {
        status_code: u16,
        error: Option<String>,
    },

    #[error("listing marker did not advance")]
    StalledMarker,
}

fn detail(error: &Option<String>) -> String {
    error.as_deref().map(|e| format!(": {e}")).unwrap_or_default()
}

/// Lists a prefix to completion and deletes what it finds.
pub struct Reconciler<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    /// Delete every object whose key starts with `prefix`.
    ///
    /// The listing is followed to its last page before anything is deleted;
    /// deletes go out in sequential batches of at most [`MAX_BATCH_OPS`].
    /// Nothing here is fatal: problems are logged and reported in the outcome.
    pub async fn clear_prefix(&self, bucket: &str, prefix: &str) -> ReconcileOutcome {
        let keys = match self.list_all(bucket, prefix).await {
            Ok(keys) => keys,
            Err(err) => {
                tracing::warn!(bucket, prefix, error = %err, "prefix listing failed, skipping purge");
                return ReconcileOutcome::ListingFailed {
                    message: err.to_string(),
                };
            }
        };

        if keys.is_empty() {
            tracing::info!(bucket, prefix, "nothing to purge");
            return ReconcileOutcome::Empty;
        }

        let listed = keys.len();
        let mut deleted = 0usize;
        let mut batches = 0usize;
        let mut partial_batches = 0usize;
        let mut failed_batches = 0usize;

        for chunk in keys.chunks(MAX_BATCH_OPS) {
            batches += 1;
            match self.store.batch_delete(bucket, chunk).await {
                Ok(response) => match response.status() {
                    BatchStatus::Complete => deleted += chunk.len(),
                    BatchStatus::Partial => {
                        partial_batches += 1;
                        deleted += response.succeeded();
                        tracing::warn!(
                            batch = batches,
                            requested = chunk.len(),
                            deleted = response.succeeded(),
                            "batch delete partially succeeded",
                        );
                    }
                    BatchStatus::Failed => {
                        failed_batches += 1;
                        tracing::warn!(
                            batch = batches,
                            status = response.info.status_code,
                            error = response.info.error.as_deref().unwrap_or(""),
                            "batch delete failed",
                        );
                    }
                },
                Err(err) => {
                    failed_batches += 1;
                    tracing::warn!(batch = batches, error = %err, "batch delete failed");
                }
            }
        }

        tracing::info!(listed, deleted, batches, "prefix purge finished");
        ReconcileOutcome::Purged {
            listed,
            deleted,
            batches,
            partial_batches,
            failed_batches,
        }
    }

    /// Follow the listing marker until the last page.
    async fn list_all(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, ListingError> {
        let mut keys = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .store
                .list_page(bucket, prefix, marker.as_deref())
                .await?;

            if !page.info.is_success() {
                return Err(ListingError::Status {
                    status_code: page.info.status_code,
                    error: page.info.error,
                });
            }

            if page.is_last() {
                keys.extend(page.items.into_iter().map(|item| item.key));
                return Ok(keys);
            }
            if page.marker == marker {
                return Err(ListingError::StalledMarker);
            }
            keys.extend(page.items.into_iter().map(|item| item.key));
            marker = page.marker;
        }
    }
}
