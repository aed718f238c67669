//! `distsync upload`: hand a build output to the pipeline and report.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tokio::sync::oneshot;

use distsync_store::QiniuClient;
use distsync_sync::{
    BuildOutput, FailureReason, Pipeline, PipelineReport, ReconcileOutcome, UploadOutcome,
};

use super::ConfigArgs;

/// Arguments for `distsync upload`.
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Build output directory.
    #[arg(long, short = 'd')]
    pub dir: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Delete everything under the prefix before uploading.
    #[arg(long)]
    pub clear: bool,

    /// Overwrite objects that already exist.
    #[arg(long)]
    pub cover: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl UploadArgs {
    pub fn run(self) -> Result<()> {
        let (clear, cover) = (self.clear, self.cover);
        let config = self.config.load(|file| {
            if clear {
                file.clear = Some(true);
            }
            if cover {
                file.cover = Some(true);
            }
        })?;
        let output = BuildOutput::scan(&self.dir)
            .with_context(|| format!("failed to scan {}", self.dir.display()))?;
        tracing::debug!(dir = %output.output_dir.display(), files = output.files.len(), "scanned build output");

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        let report = runtime.block_on(async move {
            let client = QiniuClient::new(&config).context("failed to build store client")?;
            let pipeline = Pipeline::new(config, Arc::new(client));

            let (respond_to, report) = oneshot::channel();
            pipeline.on_build_done(output, move |report| {
                let _ = respond_to.send(report);
            })?;
            report.await.context("pipeline ended without a report")
        })?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }

        if !report.is_success() {
            bail!(
                "{} of {} upload(s) failed",
                report.upload.failures().count(),
                report.upload.files.len()
            );
        }
        Ok(())
    }
}

fn print_report(report: &PipelineReport) {
    match &report.reconcile {
        ReconcileOutcome::Skipped => {}
        ReconcileOutcome::Empty => println!("purge: nothing under prefix"),
        ReconcileOutcome::ListingFailed { message } => {
            println!("{} purge skipped: {message}", "!".yellow())
        }
        ReconcileOutcome::Purged {
            listed, deleted, ..
        } => {
            let line = format!("purge: deleted {deleted} of {listed} object(s)");
            if report.reconcile.is_clean() {
                println!("{line}");
            } else {
                println!("{} {line}", "!".yellow());
            }
        }
    }

    for file in &report.upload.files {
        match &file.outcome {
            UploadOutcome::Uploaded { overwritten: false } => {
                println!("  {}  {}", "✓".green(), file.remote_key)
            }
            UploadOutcome::Uploaded { overwritten: true } => {
                println!("  {}  {} (overwritten)", "✓".green(), file.remote_key)
            }
            UploadOutcome::Failed { reason } => {
                println!("  {}  {}: {}", "✗".red(), file.remote_key, describe(reason))
            }
        }
    }

    let summary = format!(
        "{} uploaded, {} failed, {} skipped in {} ms",
        report.upload.succeeded(),
        report.upload.failures().count(),
        report.upload.excluded.len(),
        report.duration_ms
    );
    if report.is_success() {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.red());
    }
}

fn describe(reason: &FailureReason) -> String {
    match reason {
        FailureReason::Transport { message } => message.clone(),
        FailureReason::Conflict => "already exists (enable --cover to overwrite)".to_owned(),
        FailureReason::ConflictAfterOverwrite => "still conflicting after overwrite".to_owned(),
        FailureReason::Status {
            status_code,
            error: Some(error),
        } => format!("status {status_code}: {error}"),
        FailureReason::Status { status_code, .. } => format!("status {status_code}"),
    }
}
