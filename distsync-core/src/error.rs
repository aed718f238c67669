//! Error types for distsync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while building a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required field was absent or blank.
    #[error("missing required config field `{0}`")]
    MissingField(&'static str),

    /// `zone` did not name a known storage region.
    #[error("unknown zone '{0}'; expected one of: z0, cn-east-2, z1, z2, na0, as0")]
    UnknownZone(String),

    /// Underlying I/O failure while reading a config file.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The file lookup found nothing at any of the candidate locations.
    #[error("no config file found (looked in: {})", display_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
