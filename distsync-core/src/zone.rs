//! Storage regions and the hosts that serve them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A known storage region.
///
/// Each region has its own form-upload host and its own management hosts
/// (`rs` for batch operations, `rsf` for listing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Zone {
    /// East China (Zhejiang).
    Z0,
    /// East China 2 (Zhejiang 2).
    CnEast2,
    /// North China (Hebei).
    Z1,
    /// South China (Guangdong).
    Z2,
    /// North America.
    Na0,
    /// Southeast Asia.
    As0,
}

impl Zone {
    /// Every supported region, in display order.
    pub fn all() -> &'static [Zone] {
        &[
            Zone::Z0,
            Zone::CnEast2,
            Zone::Z1,
            Zone::Z2,
            Zone::Na0,
            Zone::As0,
        ]
    }

    /// Short region id, e.g. `z0`.
    pub fn id(&self) -> &'static str {
        match self {
            Zone::Z0 => "z0",
            Zone::CnEast2 => "cn-east-2",
            Zone::Z1 => "z1",
            Zone::Z2 => "z2",
            Zone::Na0 => "na0",
            Zone::As0 => "as0",
        }
    }

    /// Host accepting multipart form uploads.
    pub fn up_host(&self) -> &'static str {
        match self {
            Zone::Z0 => "up-z0.qiniup.com",
            Zone::CnEast2 => "up-cn-east-2.qiniup.com",
            Zone::Z1 => "up-z1.qiniup.com",
            Zone::Z2 => "up-z2.qiniup.com",
            Zone::Na0 => "up-na0.qiniup.com",
            Zone::As0 => "up-as0.qiniup.com",
        }
    }

    /// Host serving object management (`/batch`).
    pub fn rs_host(&self) -> &'static str {
        match self {
            Zone::Z0 => "rs-z0.qiniuapi.com",
            Zone::CnEast2 => "rs-cn-east-2.qiniuapi.com",
            Zone::Z1 => "rs-z1.qiniuapi.com",
            Zone::Z2 => "rs-z2.qiniuapi.com",
            Zone::Na0 => "rs-na0.qiniuapi.com",
            Zone::As0 => "rs-as0.qiniuapi.com",
        }
    }

    /// Host serving prefix listings (`/list`).
    pub fn rsf_host(&self) -> &'static str {
        match self {
            Zone::Z0 => "rsf-z0.qiniuapi.com",
            Zone::CnEast2 => "rsf-cn-east-2.qiniuapi.com",
            Zone::Z1 => "rsf-z1.qiniuapi.com",
            Zone::Z2 => "rsf-z2.qiniuapi.com",
            Zone::Na0 => "rsf-na0.qiniuapi.com",
            Zone::As0 => "rsf-as0.qiniuapi.com",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Zone {
    type Err = ConfigError;

    /// Accepts the short id (`z0`) as well as the SDK-style name (`Zone_z0`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let id = trimmed.strip_prefix("Zone_").unwrap_or(trimmed);
        let normalized = id.to_ascii_lowercase().replace('_', "-");
        Zone::all()
            .iter()
            .copied()
            .find(|zone| zone.id() == normalized)
            .ok_or_else(|| ConfigError::UnknownZone(s.to_owned()))
    }
}

impl TryFrom<String> for Zone {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> Self {
        zone.id().to_owned()
    }
}
