//! Upload tokens and request signing.
//!
//! Upload token layout: `<access_key>:<sign>:<encoded_policy>` where
//!
//! ```text
//! encoded_policy = urlsafe_b64(json({ "scope": .., "deadline": .. }))
//! sign           = urlsafe_b64(hmac_sha1(secret_key, encoded_policy))
//! ```
//!
//! A policy scoped to `bucket` may create any key in the bucket but never
//! replace one; a policy scoped to `bucket:key` may also overwrite that key.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::config::Config;

type HmacSha1 = Hmac<Sha1>;

/// How long a freshly derived upload token stays valid, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Account key pair used for every signature.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.access_key(), config.secret_key())
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// `urlsafe_b64(hmac_sha1(secret_key, data))`.
    pub fn sign(&self, data: &[u8]) -> String {
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC-SHA1 accepts keys of any length");
        mac.update(data);
        URL_SAFE.encode(mac.finalize().into_bytes())
    }

    /// Sign `data` and return `<access_key>:<sign>:<encoded_data>`.
    pub fn sign_data(&self, data: &[u8]) -> String {
        let encoded = URL_SAFE.encode(data);
        let sign = self.sign(encoded.as_bytes());
        format!("{}:{}:{}", self.access_key, sign, encoded)
    }

    /// `Authorization` header value for management calls (`rs` / `rsf`).
    ///
    /// `form_body` must be the exact request body when it is sent as
    /// `application/x-www-form-urlencoded`, and `None` otherwise.
    pub fn management_token(&self, path_and_query: &str, form_body: Option<&[u8]>) -> String {
        let mut signing = Vec::with_capacity(path_and_query.len() + 1);
        signing.extend_from_slice(path_and_query.as_bytes());
        signing.push(b'\n');
        if let Some(body) = form_body {
            signing.extend_from_slice(body);
        }
        format!("QBox {}:{}", self.access_key, self.sign(&signing))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Upload tokens
// ---------------------------------------------------------------------------

/// A signed form-upload token together with the scope it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadToken {
    token: String,
    scope: String,
}

impl UploadToken {
    /// The wire value sent in the `token` form field.
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// `bucket` for a base token, `bucket:key` for an overwrite token.
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// True when this token may overwrite one specific key.
    pub fn is_scoped(&self) -> bool {
        self.scope.contains(':')
    }
}

impl fmt::Display for UploadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

/// Derives upload tokens for one pipeline run.
#[derive(Debug, Clone)]
pub struct CredentialDeriver {
    credentials: Credentials,
    bucket: String,
    ttl: Duration,
}

impl CredentialDeriver {
    pub fn new(config: &Config) -> Self {
        Self {
            credentials: Credentials::from_config(config),
            bucket: config.bucket().to_owned(),
            ttl: Duration::seconds(DEFAULT_TOKEN_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Token allowing new uploads anywhere inside the bucket.
    ///
    /// Computed once per run and shared read-only by every upload task.
    pub fn base_token(&self) -> UploadToken {
        self.issue(self.bucket.clone())
    }

    /// Fresh token allowing overwrite of exactly `remote_key`.
    pub fn scoped_token(&self, remote_key: &str) -> UploadToken {
        self.issue(format!("{}:{}", self.bucket, remote_key))
    }

    fn issue(&self, scope: String) -> UploadToken {
        let deadline = (Utc::now() + self.ttl).timestamp();
        let policy = serde_json::json!({ "scope": scope, "deadline": deadline });
        UploadToken {
            token: self.credentials.sign_data(policy.to_string().as_bytes()),
            scope,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
