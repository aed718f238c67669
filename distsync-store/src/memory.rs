//! In-memory [`ObjectStore`] used by tests and local dry runs.
//!
//! Models the store's overwrite rule: a key that already exists can only be
//! replaced by a token scoped to exactly `bucket:key`; anything else gets
//! `614`. Faults can be injected per key, and every call is appended to a
//! log so tests can assert on ordering.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::Mutex;

use distsync_core::UploadToken;

use crate::error::{io_err, StoreError};
use crate::traits::ObjectStore;
use crate::types::{
    BatchItemResult, BatchResponse, ListPage, ListedObject, ResponseInfo, MAX_BATCH_OPS,
    MAX_LIST_LIMIT, STATUS_CONFLICT, STATUS_OK, STATUS_PARTIAL,
};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Put { key: String, scoped: bool },
    List { prefix: String, marker: Option<String> },
    BatchDelete { keys: usize },
}

/// Injected failure for a single operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail the call without a response.
    Transport,
    /// Answer with this status code and do nothing.
    Status(u16),
}

/// An object held by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub size: u64,
    /// Scope of the token that last wrote the object.
    pub written_with: String,
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    put_faults: HashMap<String, Vec<Fault>>,
    list_fault: Option<Fault>,
    batch_faults: Vec<Fault>,
    calls: Vec<StoreCall>,
}

/// Single-bucket in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    bucket: String,
    page_size: usize,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            page_size: MAX_LIST_LIMIT,
            state: Mutex::new(State::default()),
        }
    }

    /// Listing page size (clamped to `1..=1000`).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_LIST_LIMIT);
        self
    }

    /// Pre-populate `keys` as existing objects.
    pub async fn seed<I, S>(&self, keys: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = self.state.lock().await;
        for key in keys {
            state.objects.insert(
                key.into(),
                StoredObject {
                    size: 0,
                    written_with: self.bucket.clone(),
                },
            );
        }
    }

    /// Queue faults for successive puts to `key`; once drained, puts behave
    /// normally again.
    pub async fn fail_puts(&self, key: &str, faults: impl IntoIterator<Item = Fault>) {
        let mut state = self.state.lock().await;
        state
            .put_faults
            .entry(key.to_owned())
            .or_default()
            .extend(faults);
    }

    /// Make every listing call fail with `fault`.
    pub async fn fail_listing(&self, fault: Fault) {
        self.state.lock().await.list_fault = Some(fault);
    }

    /// Queue faults for successive batch calls.
    pub async fn fail_batches(&self, faults: impl IntoIterator<Item = Fault>) {
        self.state.lock().await.batch_faults.extend(faults);
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.state.lock().await.objects.keys().cloned().collect()
    }

    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.state.lock().await.objects.get(key).cloned()
    }

    fn check_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        if bucket == self.bucket {
            Ok(())
        } else {
            Err(StoreError::Transport(format!("no such bucket '{bucket}'")))
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        token: &UploadToken,
        key: &str,
        local_path: &Path,
    ) -> Result<ResponseInfo, StoreError> {
        let fault = {
            let mut state = self.state.lock().await;
            state.calls.push(StoreCall::Put {
                key: key.to_owned(),
                scoped: token.is_scoped(),
            });
            state.put_faults.get_mut(key).and_then(|queue| {
                if queue.is_empty() {
                    None
                } else {
                    Some(queue.remove(0))
                }
            })
        };
        match fault {
            Some(Fault::Transport) => {
                return Err(StoreError::Transport(format!("injected failure for {key}")))
            }
            Some(Fault::Status(code)) => {
                return Ok(ResponseInfo::with_status(code).with_error("injected"))
            }
            None => {}
        }

        // Read outside the lock so concurrent puts overlap.
        let metadata = tokio::fs::metadata(local_path)
            .await
            .map_err(|e| io_err(local_path, e))?;

        let mut state = self.state.lock().await;
        let scope = token.scope();
        let may_overwrite = scope == format!("{}:{}", self.bucket, key);
        if scope != self.bucket && !may_overwrite {
            return Ok(ResponseInfo::with_status(401).with_error("scope mismatch"));
        }
        if state.objects.contains_key(key) && !may_overwrite {
            return Ok(ResponseInfo::with_status(STATUS_CONFLICT).with_error("file exists"));
        }

        state.objects.insert(
            key.to_owned(),
            StoredObject {
                size: metadata.len(),
                written_with: scope.to_owned(),
            },
        );
        Ok(ResponseInfo::ok())
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        self.check_bucket(bucket)?;
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::List {
            prefix: prefix.to_owned(),
            marker: marker.map(str::to_owned),
        });

        match &state.list_fault {
            Some(Fault::Transport) => {
                return Err(StoreError::Transport("injected listing failure".into()))
            }
            Some(Fault::Status(code)) => {
                return Ok(ListPage {
                    info: ResponseInfo::with_status(*code).with_error("injected"),
                    items: Vec::new(),
                    marker: None,
                })
            }
            None => {}
        }

        // Marker is the last key of the previous page.
        let items: Vec<ListedObject> = state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| marker.map_or(true, |m| key.as_str() > m))
            .take(self.page_size + 1)
            .map(|(key, obj)| ListedObject {
                fsize: Some(obj.size),
                ..ListedObject::new(key.clone())
            })
            .collect();

        let has_more = items.len() > self.page_size;
        let items: Vec<ListedObject> = items.into_iter().take(self.page_size).collect();
        let next = if has_more {
            items.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            info: ResponseInfo::ok(),
            items,
            marker: next,
        })
    }

    async fn batch_delete(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Result<BatchResponse, StoreError> {
        self.check_bucket(bucket)?;
        let mut state = self.state.lock().await;
        state.calls.push(StoreCall::BatchDelete { keys: keys.len() });

        if keys.len() > MAX_BATCH_OPS {
            return Ok(BatchResponse {
                info: ResponseInfo::with_status(400).with_error("too many operations"),
                results: Vec::new(),
            });
        }

        let fault = if state.batch_faults.is_empty() {
            None
        } else {
            Some(state.batch_faults.remove(0))
        };
        match fault {
            Some(Fault::Transport) => {
                return Err(StoreError::Transport("injected batch failure".into()))
            }
            Some(Fault::Status(code)) if !(200..300).contains(&code) => {
                return Ok(BatchResponse {
                    info: ResponseInfo::with_status(code).with_error("injected"),
                    results: Vec::new(),
                })
            }
            // A 2xx fault deletes only the first half of the keys.
            Some(Fault::Status(code)) => {
                let keep_from = keys.len() / 2;
                let results = keys
                    .iter()
                    .enumerate()
                    .map(|(i, key)| {
                        if i < keep_from {
                            state.objects.remove(key);
                            BatchItemResult {
                                code: STATUS_OK,
                                error: None,
                            }
                        } else {
                            BatchItemResult {
                                code: 599,
                                error: Some("injected".into()),
                            }
                        }
                    })
                    .collect();
                return Ok(BatchResponse {
                    info: ResponseInfo::with_status(code),
                    results,
                });
            }
            None => {}
        }

        let mut all_found = true;
        let results = keys
            .iter()
            .map(|key| match state.objects.remove(key) {
                Some(_) => BatchItemResult {
                    code: STATUS_OK,
                    error: None,
                },
                None => {
                    all_found = false;
                    BatchItemResult {
                        code: 612,
                        error: Some("no such file or directory".into()),
                    }
                }
            })
            .collect();

        let status_code = if all_found { STATUS_OK } else { STATUS_PARTIAL };
        Ok(BatchResponse {
            info: ResponseInfo::with_status(status_code),
            results,
        })
    }
}
