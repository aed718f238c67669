//! # distsync-store
//!
//! The [`ObjectStore`] port plus its two implementations:
//! [`QiniuClient`] for the real service and [`MemoryStore`] for tests.

pub mod error;
pub mod memory;
pub mod qiniu;
pub mod traits;
pub mod types;

pub use error::StoreError;
pub use memory::{Fault, MemoryStore, StoreCall, StoredObject};
pub use qiniu::{Endpoints, QiniuClient};
pub use traits::ObjectStore;
pub use types::{
    BatchItemResult, BatchResponse, BatchStatus, ListPage, ListedObject, ResponseInfo,
    MAX_BATCH_OPS, MAX_LIST_LIMIT, STATUS_CONFLICT, STATUS_OK, STATUS_PARTIAL,
};
