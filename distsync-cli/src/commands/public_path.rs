//! `distsync public-path`: print the asset URL base for the build tool.

use anyhow::Result;
use clap::Args;

use distsync_core::keys;

use super::ConfigArgs;

/// Arguments for `distsync public-path`.
#[derive(Args, Debug)]
pub struct PublicPathArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl PublicPathArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load(|_| {})?;
        println!("{}", keys::public_path(&config));
        Ok(())
    }
}
