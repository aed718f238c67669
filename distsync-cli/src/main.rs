//! distsync: upload a static build to an object store bucket.
//!
//! # Usage
//!
//! ```text
//! distsync upload --dir <build-dir> [--config <file>] [--clear] [--cover] [--prefix <p>] [--json]
//! distsync plan --dir <build-dir> [--config <file>] [--prefix <p>]
//! distsync public-path [--config <file>] [--prefix <p>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{plan::PlanArgs, public_path::PublicPathArgs, upload::UploadArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "distsync",
    version,
    about = "Sync a static build output directory with an object store prefix",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Purge (optional) and upload a build output directory.
    Upload(UploadArgs),

    /// Show the remote keys an upload would write, without touching the network.
    Plan(PlanArgs),

    /// Print the public path the build should use for its assets.
    PublicPath(PublicPathArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Upload(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::PublicPath(args) => args.run(),
    }
}

/// Logs go to stderr so stdout stays clean for `--json` and `public-path`.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
