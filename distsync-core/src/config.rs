//! Pipeline configuration.
//!
//! # Sources
//!
//! ```text
//! ./distsync.yaml                       (project-local, checked first)
//! <config_dir>/distsync/config.yaml     (per-user fallback)
//! DISTSYNC_ACCESS_KEY / DISTSYNC_SECRET_KEY   (override the file's keys)
//! ```
//!
//! Files are parsed into [`ConfigFile`], where every field is optional, and
//! then validated into an immutable [`Config`]. Validation is the only way to
//! obtain a `Config`, so a pipeline can never start with a required field
//! missing.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::zone::Zone;

/// Prefix used when the config leaves `prefix` unset or blank.
pub const DEFAULT_PREFIX: &str = "webDist";

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "distsync.yaml";

pub const ENV_ACCESS_KEY: &str = "DISTSYNC_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "DISTSYNC_SECRET_KEY";

// ---------------------------------------------------------------------------
// Raw file shape
// ---------------------------------------------------------------------------

/// Unvalidated configuration, as read from YAML or assembled by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    #[serde(default)]
    pub public_path: Option<String>,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub clear: Option<bool>,
    #[serde(default)]
    pub cover: Option<bool>,
}

impl ConfigFile {
    /// Parse a YAML config file.
    ///
    /// Returns `ConfigError::Parse` (with path + line context) if malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace the account keys with `DISTSYNC_ACCESS_KEY` / `DISTSYNC_SECRET_KEY`
    /// when those are set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// [`apply_env`](Self::apply_env) with an injectable lookup; used in tests.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_ACCESS_KEY).filter(|v| !v.trim().is_empty()) {
            self.access_key = Some(value);
        }
        if let Some(value) = lookup(ENV_SECRET_KEY).filter(|v| !v.trim().is_empty()) {
            self.secret_key = Some(value);
        }
    }

    /// Validate into a [`Config`].
    ///
    /// Fields are checked in declaration order so the first missing one is
    /// the one reported.
    pub fn validate(self) -> Result<Config, ConfigError> {
        let public_path = required(self.public_path, "publicPath")?;
        let access_key = required(self.access_key, "accessKey")?;
        let secret_key = required(self.secret_key, "secretKey")?;
        let bucket = required(self.bucket, "bucket")?;
        let zone: Zone = required(self.zone, "zone")?.parse()?;

        let prefix = self
            .prefix
            .map(|p| p.trim().trim_matches('/').to_owned())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFIX.to_owned());

        Ok(Config {
            public_path,
            access_key,
            secret_key,
            bucket,
            zone,
            prefix,
            clear: self.clear.unwrap_or(false),
            cover: self.cover.unwrap_or(false),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingField(field))
}

// ---------------------------------------------------------------------------
// Validated config
// ---------------------------------------------------------------------------

/// Immutable, validated pipeline configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    public_path: String,
    access_key: String,
    secret_key: String,
    bucket: String,
    zone: Zone,
    prefix: String,
    clear: bool,
    cover: bool,
}

impl Config {
    /// Load, apply env overrides, and validate in one step.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let mut raw = ConfigFile::load(path)?;
        raw.apply_env();
        raw.validate()
    }

    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Namespace for every object this pipeline writes or deletes.
    /// Never empty and never surrounded by `/`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Purge the prefix before uploading.
    pub fn clear(&self) -> bool {
        self.clear
    }

    /// Retry a name conflict with an overwrite-scoped token.
    pub fn cover(&self) -> bool {
        self.cover
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("public_path", &self.public_path)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket", &self.bucket)
            .field("zone", &self.zone)
            .field("prefix", &self.prefix)
            .field("clear", &self.clear)
            .field("cover", &self.cover)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// File lookup
// ---------------------------------------------------------------------------

/// Resolve which config file to read.
///
/// An explicit path always wins (and is returned even if it does not exist, so
/// the subsequent load reports the real I/O error). Otherwise
/// `<cwd>/distsync.yaml`, then `<config_dir>/distsync/config.yaml`.
pub fn locate_at(
    explicit: Option<&Path>,
    cwd: &Path,
    config_dir: Option<&Path>,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let mut searched = vec![cwd.join(LOCAL_CONFIG_FILE)];
    if let Some(dir) = config_dir {
        searched.push(dir.join("distsync").join("config.yaml"));
    }

    match searched.iter().find(|p| p.is_file()) {
        Some(found) => Ok(found.clone()),
        None => Err(ConfigError::NotFound { searched }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
