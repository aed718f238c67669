//! Pipeline controller: purge (optional) then upload.
//!
//! ```text
//! START ─clear─▶ RECONCILE ─▶ UPLOAD ─▶ DONE
//!   └──────────────────────────▲
//! ```
//!
//! The purge always finishes before the first upload is issued, so a
//! freshly uploaded object can never be caught by the purge.

use std::sync::Arc;
use std::time::Instant;

use distsync_core::{keys, Config, CredentialDeriver};
use distsync_store::ObjectStore;

use crate::build::BuildOutput;
use crate::error::SyncError;
use crate::reconcile::Reconciler;
use crate::report::{PipelineReport, ReconcileOutcome};
use crate::upload::Uploader;

/// Phase of a run, used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reconcile,
    Upload,
    Done,
}

impl Phase {
    fn label(self) -> &'static str {
        match self {
            Phase::Reconcile => "reconcile",
            Phase::Upload => "upload",
            Phase::Done => "done",
        }
    }
}

/// Owns the configuration and store for every run it starts.
///
/// Cheap to clone; clones share the same config and store.
#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    store: Arc<dyn ObjectStore>,
    deriver: CredentialDeriver,
}

impl Pipeline {
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> Self {
        let deriver = CredentialDeriver::new(&config);
        Self {
            config: Arc::new(config),
            store,
            deriver,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `<publicPath>/<prefix>/`, to be applied by the build tool before it
    /// emits assets.
    pub fn public_path(&self) -> String {
        keys::public_path(&self.config)
    }

    /// Build-completion hook.
    ///
    /// Returns as soon as the run is spawned; the caller is never blocked on
    /// remote work. `on_complete` receives the report when the run ends.
    pub fn on_build_done<F>(&self, output: BuildOutput, on_complete: F) -> Result<(), SyncError>
    where
        F: FnOnce(PipelineReport) + Send + 'static,
    {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let pipeline = self.clone();
        handle.spawn(async move {
            let report = pipeline.run(output).await;
            on_complete(report);
        });
        Ok(())
    }

    /// Run both phases and return the report.
    pub async fn run(&self, output: BuildOutput) -> PipelineReport {
        let started = Instant::now();
        let bucket = self.config.bucket();
        let prefix = self.config.prefix();

        let reconcile = if self.config.clear() {
            tracing::info!(phase = Phase::Reconcile.label(), bucket, prefix, "purging prefix");
            Reconciler::new(self.store.as_ref())
                .clear_prefix(bucket, prefix)
                .await
        } else {
            ReconcileOutcome::Skipped
        };

        tracing::info!(
            phase = Phase::Upload.label(),
            files = output.files.len(),
            cover = self.config.cover(),
            "uploading build output",
        );
        let upload = Uploader::new(&self.config, self.store.as_ref(), &self.deriver)
            .upload_all(&output)
            .await;

        let report = PipelineReport::new(reconcile, upload, started.elapsed().as_millis());
        if report.is_success() {
            tracing::info!(
                phase = Phase::Done.label(),
                uploaded = report.upload.succeeded(),
                duration_ms = report.duration_ms,
                "sync completed",
            );
        } else {
            tracing::error!(
                phase = Phase::Done.label(),
                uploaded = report.upload.succeeded(),
                failed = report.upload.failures().count(),
                duration_ms = report.duration_ms,
                "sync finished with failures",
            );
        }
        report
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use distsync_core::ConfigFile;
    use distsync_store::MemoryStore;

    use super::*;

    fn pipeline(prefix: &str) -> Pipeline {
        let config = ConfigFile {
            public_path: Some("https://cdn.example.com/".into()),
            access_key: Some("ak".into()),
            secret_key: Some("sk".into()),
            bucket: Some("assets".into()),
            zone: Some("z0".into()),
            prefix: Some(prefix.into()),
            ..ConfigFile::default()
        }
        .validate()
        .expect("config");
        Pipeline::new(config, Arc::new(MemoryStore::new("assets")))
    }

    #[test]
    fn public_path_joins_prefix() {
        assert_eq!(
            pipeline("webDist").public_path(),
            "https://cdn.example.com/webDist/"
        );
    }

    #[test]
    fn trigger_outside_runtime_is_rejected() {
        let err = pipeline("webDist")
            .on_build_done(BuildOutput::new("/dist", ["a.js"]), |_| {})
            .unwrap_err();
        assert!(matches!(err, SyncError::NoRuntime));
    }
}
