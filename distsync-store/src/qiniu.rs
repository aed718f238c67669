//! HTTP implementation of [`ObjectStore`] for Qiniu Kodo.
//!
//! | operation      | request                                                   |
//! |----------------|-----------------------------------------------------------|
//! | `put_object`   | `POST <up>/` multipart `token`, `key`, `file`              |
//! | `list_page`    | `GET <rsf>/list?bucket=..&prefix=..&limit=..[&marker=..]`  |
//! | `batch_delete` | `POST <rs>/batch` form body `op=/delete/<entry>&..`        |
//!
//! Management calls carry `Authorization: QBox <ak>:<sign>`.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use distsync_core::{Config, Credentials, UploadToken, Zone};

use crate::error::{io_err, StoreError};
use crate::traits::ObjectStore;
use crate::types::{
    BatchItemResult, BatchResponse, ListPage, ListedObject, ResponseInfo, MAX_LIST_LIMIT,
};

/// Per-request timeout applied to every call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// Base URLs (scheme + host, no trailing slash) for the three services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub up: String,
    pub rs: String,
    pub rsf: String,
}

impl Endpoints {
    pub fn for_zone(zone: Zone) -> Self {
        Self {
            up: format!("https://{}", zone.up_host()),
            rs: format!("https://{}", zone.rs_host()),
            rsf: format!("https://{}", zone.rsf_host()),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListBody {
    #[serde(default)]
    marker: Option<String>,
    #[serde(default)]
    items: Vec<ListedObject>,
}

#[derive(Debug, Deserialize)]
struct RawBatchItem {
    code: u16,
    #[serde(default)]
    data: Option<ErrorBody>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Talks to the real service over HTTPS.
#[derive(Debug, Clone)]
pub struct QiniuClient {
    http: reqwest::Client,
    credentials: Credentials,
    endpoints: Endpoints,
}

impl QiniuClient {
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("distsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            credentials: Credentials::from_config(config),
            endpoints: Endpoints::for_zone(config.zone()),
        })
    }

    /// Point the client at different hosts (private deployments, proxies).
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

#[async_trait]
impl ObjectStore for QiniuClient {
    async fn put_object(
        &self,
        token: &UploadToken,
        key: &str,
        local_path: &Path,
    ) -> Result<ResponseInfo, StoreError> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| io_err(local_path, e))?;
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| key.to_owned());

        let form = Form::new()
            .text("token", token.as_str().to_owned())
            .text("key", key.to_owned())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .http
            .post(format!("{}/", self.endpoints.up))
            .multipart(form)
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!(key, status_code, "put_object response");
        Ok(response_info(status_code, &body))
    }

    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ListPage, StoreError> {
        let path_and_query = list_path(bucket, prefix, marker);
        let response = self
            .http
            .get(format!("{}{}", self.endpoints.rsf, path_and_query))
            .header(
                AUTHORIZATION,
                self.credentials.management_token(&path_and_query, None),
            )
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let body = response.text().await?;
        let info = response_info(status_code, &body);
        if !info.is_success() {
            return Ok(ListPage {
                info,
                items: Vec::new(),
                marker: None,
            });
        }

        let parsed: ListBody = serde_json::from_str(&body).map_err(|e| StoreError::Decode {
            what: "list",
            message: e.to_string(),
        })?;
        Ok(ListPage {
            info,
            items: parsed.items,
            marker: parsed.marker.filter(|m| !m.is_empty()),
        })
    }

    async fn batch_delete(
        &self,
        bucket: &str,
        keys: &[String],
    ) -> Result<BatchResponse, StoreError> {
        let body = batch_delete_body(bucket, keys);
        let response = self
            .http
            .post(format!("{}/batch", self.endpoints.rs))
            .header(CONTENT_TYPE, FORM_URLENCODED)
            .header(
                AUTHORIZATION,
                self.credentials
                    .management_token("/batch", Some(body.as_bytes())),
            )
            .body(body)
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let text = response.text().await?;
        let info = response_info(status_code, &text);
        if !(200..300).contains(&status_code) {
            return Ok(BatchResponse {
                info,
                results: Vec::new(),
            });
        }

        let raw: Vec<RawBatchItem> =
            serde_json::from_str(&text).map_err(|e| StoreError::Decode {
                what: "batch",
                message: e.to_string(),
            })?;
        let results = raw
            .into_iter()
            .map(|item| BatchItemResult {
                code: item.code,
                error: item.data.and_then(|d| d.error),
            })
            .collect();
        Ok(BatchResponse { info, results })
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// `urlsafe_b64("<bucket>:<key>")`.
pub fn encode_entry(bucket: &str, key: &str) -> String {
    URL_SAFE.encode(format!("{bucket}:{key}"))
}

fn list_path(bucket: &str, prefix: &str, marker: Option<&str>) -> String {
    let mut path = format!(
        "/list?bucket={}&prefix={}&limit={}",
        urlencoding::encode(bucket),
        urlencoding::encode(prefix),
        MAX_LIST_LIMIT
    );
    if let Some(marker) = marker.filter(|m| !m.is_empty()) {
        path.push_str("&marker=");
        path.push_str(&urlencoding::encode(marker));
    }
    path
}

fn batch_delete_body(bucket: &str, keys: &[String]) -> String {
    keys.iter()
        .map(|key| {
            let op = format!("/delete/{}", encode_entry(bucket, key));
            format!("op={}", urlencoding::encode(&op))
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn response_info(status_code: u16, body: &str) -> ResponseInfo {
    let error = if (200..300).contains(&status_code) {
        None
    } else {
        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .or_else(|| Some(body.trim().to_owned()).filter(|b| !b.is_empty()))
    };
    ResponseInfo {
        status_code,
        status: None,
        error,
    }
}
