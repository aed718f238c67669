//! distsync core library: configuration, zones, credentials and key helpers.
//!
//! Public API surface:
//! - [`config`]: [`ConfigFile`] (raw) and [`Config`] (validated)
//! - [`zone`]: [`Zone`] and its hosts
//! - [`credentials`]: [`Credentials`], [`CredentialDeriver`], [`UploadToken`]
//! - [`keys`]: remote key / public path construction, markup exclusion
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod credentials;
pub mod error;
pub mod keys;
pub mod zone;

pub use config::{Config, ConfigFile, DEFAULT_PREFIX};
pub use credentials::{CredentialDeriver, Credentials, UploadToken};
pub use error::ConfigError;
pub use zone::Zone;
