//! End-to-end pipeline behaviour against the in-memory store.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use distsync_core::{Config, ConfigFile};
use distsync_store::{Fault, MemoryStore, StoreCall, STATUS_CONFLICT};
use distsync_sync::{
    BuildOutput, FailureReason, Pipeline, PipelineReport, ReconcileOutcome, UploadOutcome,
};
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn config(clear: bool, cover: bool) -> Config {
    ConfigFile {
        public_path: Some("https://cdn.example.com".into()),
        access_key: Some("ak".into()),
        secret_key: Some("sk".into()),
        bucket: Some("assets".into()),
        zone: Some("z0".into()),
        prefix: Some("webDist".into()),
        clear: Some(clear),
        cover: Some(cover),
    }
    .validate()
    .expect("config")
}

fn build_dir(files: &[&str]) -> (TempDir, BuildOutput) {
    let dir = TempDir::new().expect("tempdir");
    for file in files {
        let path = dir.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(&path, format!("contents of {file}")).expect("write");
    }
    let output = BuildOutput::scan(dir.path()).expect("scan");
    (dir, output)
}

async fn run(store: Arc<MemoryStore>, config: Config, output: BuildOutput) -> PipelineReport {
    Pipeline::new(config, store).run(output).await
}

fn outcome_of<'a>(report: &'a PipelineReport, filename: &str) -> &'a UploadOutcome {
    &report
        .upload
        .files
        .iter()
        .find(|f| f.filename == filename)
        .unwrap_or_else(|| panic!("no report for {filename}"))
        .outcome
}

fn puts_for(calls: &[StoreCall], key: &str) -> Vec<bool> {
    calls
        .iter()
        .filter_map(|c| match c {
            StoreCall::Put { key: k, scoped } if k == key => Some(*scoped),
            _ => None,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 1. Upload phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn uploads_everything_except_markup() {
    let (_dir, output) = build_dir(&["index.html", "about/index.HTML", "js/app.js", "css/site.css"]);
    let store = Arc::new(MemoryStore::new("assets"));

    let report = run(store.clone(), config(false, false), output).await;

    assert!(report.is_success());
    assert_eq!(report.reconcile, ReconcileOutcome::Skipped);
    assert_eq!(store.keys().await, ["webDist/css/site.css", "webDist/js/app.js"]);
    let put_keys: Vec<String> = store
        .calls()
        .await
        .into_iter()
        .filter_map(|c| match c {
            StoreCall::Put { key, .. } => Some(key),
            _ => None,
        })
        .collect();
    assert!(put_keys.iter().all(|k| !k.to_ascii_lowercase().ends_with(".html")));
    assert_eq!(report.upload.excluded, ["about/index.HTML", "index.html"]);
}

#[tokio::test]
async fn first_attempt_success_never_requests_scoped_token() {
    let (_dir, output) = build_dir(&["a.js", "b.js"]);
    let store = Arc::new(MemoryStore::new("assets"));

    let report = run(store.clone(), config(false, true), output).await;

    assert!(report.is_success());
    assert!(store
        .calls()
        .await
        .iter()
        .all(|c| matches!(c, StoreCall::Put { scoped: false, .. })));
    assert_eq!(report.upload.overwritten(), 0);
}

#[tokio::test]
async fn conflict_with_cover_retries_once_with_scoped_token() {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store.seed(["webDist/a.js"]).await;

    let report = run(store.clone(), config(false, true), output).await;

    assert!(report.is_success());
    assert_eq!(
        outcome_of(&report, "a.js"),
        &UploadOutcome::Uploaded { overwritten: true }
    );
    assert_eq!(puts_for(&store.calls().await, "webDist/a.js"), [false, true]);
    let stored = store.object("webDist/a.js").await.expect("stored");
    assert_eq!(stored.written_with, "assets:webDist/a.js");
}

#[tokio::test]
async fn failing_retry_ends_task_without_further_attempts() {
    let (_dir, output) = build_dir(&["a.js", "b.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store
        .fail_puts(
            "webDist/a.js",
            [Fault::Status(STATUS_CONFLICT), Fault::Status(STATUS_CONFLICT)],
        )
        .await;

    let report = run(store.clone(), config(false, true), output).await;

    assert!(!report.is_success());
    assert_eq!(
        outcome_of(&report, "a.js"),
        &UploadOutcome::Failed {
            reason: FailureReason::ConflictAfterOverwrite
        }
    );
    assert_eq!(puts_for(&store.calls().await, "webDist/a.js"), [false, true]);
    assert!(outcome_of(&report, "b.js").is_success());
}

#[tokio::test]
async fn retry_with_other_status_is_reported_as_status_failure() {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store
        .fail_puts("webDist/a.js", [Fault::Status(STATUS_CONFLICT), Fault::Status(503)])
        .await;

    let report = run(store.clone(), config(false, true), output).await;

    match outcome_of(&report, "a.js") {
        UploadOutcome::Failed {
            reason: FailureReason::Status { status_code, .. },
        } => assert_eq!(*status_code, 503),
        other => panic!("expected status failure, got {other:?}"),
    }
    assert_eq!(puts_for(&store.calls().await, "webDist/a.js").len(), 2);
}

#[tokio::test]
async fn conflict_without_cover_fails_without_retry() {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store.seed(["webDist/a.js"]).await;

    let report = run(store.clone(), config(false, false), output).await;

    assert!(!report.is_success());
    assert_eq!(
        outcome_of(&report, "a.js"),
        &UploadOutcome::Failed {
            reason: FailureReason::Conflict
        }
    );
    assert_eq!(puts_for(&store.calls().await, "webDist/a.js"), [false]);
}

#[rstest]
#[case::transport(Fault::Transport)]
#[case::server_error(Fault::Status(503))]
#[case::unauthorized(Fault::Status(401))]
#[tokio::test]
async fn non_conflict_failure_is_not_retried_and_spares_siblings(#[case] fault: Fault) {
    let (_dir, output) = build_dir(&["a.js", "b.js", "c.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store.fail_puts("webDist/b.js", [fault]).await;

    let report = run(store.clone(), config(false, true), output).await;

    assert!(!report.is_success());
    assert_eq!(report.upload.succeeded(), 2);
    assert!(!outcome_of(&report, "b.js").is_success());
    assert_eq!(puts_for(&store.calls().await, "webDist/b.js"), [false]);
}

#[tokio::test]
async fn missing_local_file_is_a_transport_failure() {
    let (dir, _) = build_dir(&["a.js"]);
    let output = BuildOutput::new(dir.path(), ["a.js", "ghost.js"]);
    let store = Arc::new(MemoryStore::new("assets"));

    let report = run(store, config(false, false), output).await;

    assert!(matches!(
        outcome_of(&report, "ghost.js"),
        UploadOutcome::Failed {
            reason: FailureReason::Transport { .. }
        }
    ));
    assert!(outcome_of(&report, "a.js").is_success());
}

// ---------------------------------------------------------------------------
// 2. Reconcile phase
// ---------------------------------------------------------------------------

#[tokio::test]
async fn purge_finishes_before_any_upload() {
    let (_dir, output) = build_dir(&["a.js", "b.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    let stale: Vec<String> = (0..1500).map(|i| format!("webDist/old/{i:04}.js")).collect();
    store.seed(stale).await;

    let report = run(store.clone(), config(true, false), output).await;

    let calls = store.calls().await;
    let last_delete = calls
        .iter()
        .rposition(|c| matches!(c, StoreCall::BatchDelete { .. }))
        .expect("delete issued");
    let first_put = calls
        .iter()
        .position(|c| matches!(c, StoreCall::Put { .. }))
        .expect("put issued");
    assert!(last_delete < first_put, "calls out of order: {calls:?}");
    assert!(report.is_success());
    assert_eq!(store.keys().await, ["webDist/a.js", "webDist/b.js"]);
}

#[tokio::test]
async fn purge_of_2500_keys_uses_three_batches() {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store
        .seed((0..2500).map(|i| format!("webDist/old/{i:05}.js")))
        .await;

    let report = run(store.clone(), config(true, false), output).await;

    let batches: Vec<usize> = store
        .calls()
        .await
        .into_iter()
        .filter_map(|c| match c {
            StoreCall::BatchDelete { keys } => Some(keys),
            _ => None,
        })
        .collect();
    assert_eq!(batches, [1000, 1000, 500]);
    assert_eq!(
        report.reconcile,
        ReconcileOutcome::Purged {
            listed: 2500,
            deleted: 2500,
            batches: 3,
            partial_batches: 0,
            failed_batches: 0,
        }
    );
}

#[tokio::test]
async fn empty_prefix_is_noop_success() {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store.seed(["otherDist/keep.js", "site/webDist/keep.js"]).await;

    let report = run(store.clone(), config(true, false), output).await;

    assert_eq!(report.reconcile, ReconcileOutcome::Empty);
    assert!(report.reconcile.is_clean());
    assert!(!store
        .calls()
        .await
        .iter()
        .any(|c| matches!(c, StoreCall::BatchDelete { .. })));
    assert!(store.object("otherDist/keep.js").await.is_some());
    assert!(store.object("site/webDist/keep.js").await.is_some());
}

#[tokio::test]
async fn purge_removes_every_key_starting_with_prefix() {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store
        .seed(["webDist/old.js", "webDistOld.js", "webDist2/x.js", "other/keep.js"])
        .await;

    let report = run(store.clone(), config(true, false), output).await;

    assert!(matches!(
        report.reconcile,
        ReconcileOutcome::Purged {
            listed: 3,
            deleted: 3,
            ..
        }
    ));
    assert_eq!(store.keys().await, ["other/keep.js", "webDist/a.js"]);
}

#[tokio::test]
async fn listing_follows_pagination_to_the_end() {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets").with_page_size(7));
    store
        .seed((0..30).map(|i| format!("webDist/old/{i:02}.js")))
        .await;

    let report = run(store.clone(), config(true, false), output).await;

    let lists = store
        .calls()
        .await
        .iter()
        .filter(|c| matches!(c, StoreCall::List { .. }))
        .count();
    assert_eq!(lists, 5);
    assert!(matches!(
        report.reconcile,
        ReconcileOutcome::Purged { listed: 30, .. }
    ));
}

#[rstest]
#[case::transport(Fault::Transport)]
#[case::status(Fault::Status(401))]
#[tokio::test]
async fn listing_failure_skips_purge_but_still_uploads(#[case] fault: Fault) {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store.seed(["webDist/old.js"]).await;
    store.fail_listing(fault).await;

    let report = run(store.clone(), config(true, false), output).await;

    assert!(matches!(
        report.reconcile,
        ReconcileOutcome::ListingFailed { .. }
    ));
    assert!(report.is_success());
    assert!(store.object("webDist/a.js").await.is_some());
    assert!(store.object("webDist/old.js").await.is_some());
}

#[rstest]
#[case::partial(Fault::Status(298), 1, 0)]
#[case::failed(Fault::Status(599), 0, 1)]
#[case::transport(Fault::Transport, 0, 1)]
#[tokio::test]
async fn batch_problems_are_warnings_only(
    #[case] fault: Fault,
    #[case] partial: usize,
    #[case] failed: usize,
) {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store.seed(["webDist/old1.js", "webDist/old2.js"]).await;
    store.fail_batches([fault]).await;

    let report = run(store.clone(), config(true, false), output).await;

    match &report.reconcile {
        ReconcileOutcome::Purged {
            partial_batches,
            failed_batches,
            ..
        } => {
            assert_eq!(*partial_batches, partial);
            assert_eq!(*failed_batches, failed);
        }
        other => panic!("expected purged, got {other:?}"),
    }
    assert!(!report.reconcile.is_clean());
    assert!(report.is_success());
}

// ---------------------------------------------------------------------------
// 3. Controller
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clear_disabled_never_lists_or_deletes() {
    let (_dir, output) = build_dir(&["a.js"]);
    let store = Arc::new(MemoryStore::new("assets"));
    store.seed(["webDist/old.js"]).await;

    run(store.clone(), config(false, false), output).await;

    assert!(store
        .calls()
        .await
        .iter()
        .all(|c| matches!(c, StoreCall::Put { .. })));
}

#[tokio::test]
async fn empty_build_output_succeeds() {
    let dir = TempDir::new().expect("tempdir");
    let output = BuildOutput::scan(Path::new(dir.path())).expect("scan");
    let store = Arc::new(MemoryStore::new("assets"));

    let report = run(store, config(false, false), output).await;
    assert!(report.is_success());
    assert!(report.upload.files.is_empty());
}
