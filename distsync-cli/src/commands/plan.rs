//! `distsync plan`: list what an upload would write, without network.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use distsync_sync::{plan, BuildOutput};

use super::ConfigArgs;

/// Arguments for `distsync plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Build output directory.
    #[arg(long, short = 'd')]
    pub dir: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let config = self.config.load(|_| {})?;
        let output = BuildOutput::scan(&self.dir)
            .with_context(|| format!("failed to scan {}", self.dir.display()))?;
        let plan = plan(&output, config.prefix());

        println!(
            "{} file(s) to upload to '{}' under '{}/'",
            plan.tasks.len(),
            config.bucket(),
            config.prefix()
        );
        for task in &plan.tasks {
            println!("  {}  {}", "+".green(), task.remote_key);
        }
        for excluded in &plan.excluded {
            println!("  {}  {} (markup, skipped)", "·".dimmed(), excluded);
        }
        Ok(())
    }
}
