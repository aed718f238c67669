//! The object store port.

use std::path::Path;

use async_trait::async_trait;
use distsync_core::UploadToken;

use crate::error::StoreError;
use crate::types::{BatchResponse, ListPage, ResponseInfo};

/// Remote operations the sync pipeline needs.
///
/// `Err` means the call itself failed (transport or local I/O). Any answer
/// from the store, including non-success statuses, is `Ok`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `local_path` to `key` under the authority of `token`.
    async fn put_object(
        &self,
        token: &UploadToken,
        key: &str,
        local_path: &Path,
    ) -> Result<ResponseInfo, StoreError>;

    /// Fetch one page of objects whose key starts with `prefix`.
    ///
    /// Pass the previous page's marker to continue; `None` starts over.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ListPage, StoreError>;

    /// Delete `keys` in a single call. Callers keep `keys.len()` at or below
    /// [`MAX_BATCH_OPS`](crate::MAX_BATCH_OPS).
    async fn batch_delete(&self, bucket: &str, keys: &[String])
        -> Result<BatchResponse, StoreError>;
}
