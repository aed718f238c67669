//! Response shapes shared by every [`ObjectStore`](crate::ObjectStore) implementation.

use serde::{Deserialize, Serialize};

/// Status of a fully successful call.
pub const STATUS_OK: u16 = 200;

/// Batch status when only some operations succeeded.
pub const STATUS_PARTIAL: u16 = 298;

/// The target key already exists and the token may not overwrite it.
pub const STATUS_CONFLICT: u16 = 614;

/// Hard service limit on operations per batch call.
pub const MAX_BATCH_OPS: usize = 1000;

/// Largest page the listing endpoint will return.
pub const MAX_LIST_LIMIT: usize = 1000;

// ---------------------------------------------------------------------------
// ResponseInfo
// ---------------------------------------------------------------------------

/// Status information returned with every store response.
///
/// The store may report its application status either as the HTTP status
/// code or as a separate `status` field, so both are carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseInfo {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseInfo {
    pub fn ok() -> Self {
        Self::with_status(STATUS_OK)
    }

    pub fn with_status(status_code: u16) -> Self {
        Self {
            status_code,
            status: None,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// True only for the plain success status.
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }

    /// True when either representation carries `614`.
    pub fn is_conflict(&self) -> bool {
        self.status_code == STATUS_CONFLICT || self.status == Some(STATUS_CONFLICT)
    }

    /// The status to report: the nested one when present, otherwise the code.
    pub fn effective_status(&self) -> u16 {
        self.status.unwrap_or(self.status_code)
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// One object returned by a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedObject {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsize: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Upload time in units of 100ns since the Unix epoch.
    #[serde(default, rename = "putTime", skip_serializing_if = "Option::is_none")]
    pub put_time: Option<i64>,
}

impl ListedObject {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fsize: None,
            hash: None,
            put_time: None,
        }
    }
}

/// One page of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    pub info: ResponseInfo,
    pub items: Vec<ListedObject>,
    /// Continuation marker; `None` on the last page.
    pub marker: Option<String>,
}

impl ListPage {
    pub fn is_last(&self) -> bool {
        self.marker.as_deref().map_or(true, str::is_empty)
    }
}

// ---------------------------------------------------------------------------
// Batch delete
// ---------------------------------------------------------------------------

/// Per-operation result inside a batch response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItemResult {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response to one batch-delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResponse {
    pub info: ResponseInfo,
    pub results: Vec<BatchItemResult>,
}

/// Aggregate classification of a [`BatchResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    /// `200`: every key deleted.
    Complete,
    /// Any other `2xx` (usually `298`): some keys deleted.
    Partial,
    /// Anything else.
    Failed,
}

impl BatchResponse {
    pub fn status(&self) -> BatchStatus {
        match self.info.status_code {
            STATUS_OK => BatchStatus::Complete,
            200..=299 => BatchStatus::Partial,
            _ => BatchStatus::Failed,
        }
    }

    /// Number of operations the store reported as successful.
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.code == STATUS_OK).count()
    }
}
