pub mod plan;
pub mod public_path;
pub mod upload;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use distsync_core::{config, Config, ConfigFile};

/// Config selection shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Config file (defaults to ./distsync.yaml, then the user config dir).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Override the key prefix from the config file.
    #[arg(long)]
    pub prefix: Option<String>,
}

impl ConfigArgs {
    /// Locate, read and validate the config, then apply env and flag
    /// overrides. Nothing here touches the network.
    pub fn load(&self, overrides: impl FnOnce(&mut ConfigFile)) -> Result<Config> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let config_dir = dirs::config_dir();
        let path = config::locate_at(self.config.as_deref(), &cwd, config_dir.as_deref())?;

        let mut file = ConfigFile::load(&path)?;
        file.apply_env();
        if let Some(prefix) = &self.prefix {
            file.prefix = Some(prefix.clone());
        }
        overrides(&mut file);

        file.validate()
            .with_context(|| format!("invalid config at {}", path.display()))
    }
}
