//! Upload → watcher → status flow over real directories.

mod common;

use common::FakeBackend;
use deckexplain::{
    ExplanationPipeline, QuerySettings, RetryPolicy, StatusService, UploadStore, UploadWatcher,
};
use deckexplain_pptx::fixtures::build_pptx;
use deckexplain_service::UploadStatus;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

struct Service {
    _root: TempDir,
    store: UploadStore,
    status: StatusService,
    watcher: UploadWatcher,
    backend: Arc<FakeBackend>,
}

fn service() -> Service {
    let root = TempDir::new().unwrap();
    let store = UploadStore::new(root.path().join("uploads"));
    let outputs = root.path().join("outputs");
    std::fs::create_dir_all(&outputs).unwrap();

    let backend = Arc::new(FakeBackend::new("Networking"));
    let pipeline = ExplanationPipeline::new(
        backend.clone(),
        QuerySettings::default(),
        RetryPolicy::new(2, Duration::ZERO, Duration::ZERO),
    );

    Service {
        status: StatusService::new(store.clone(), &outputs),
        watcher: UploadWatcher::new(store.clone(), &outputs, pipeline, Duration::from_secs(1)),
        store,
        backend,
        _root: root,
    }
}

#[tokio::test]
async fn test_status_moves_from_pending_to_done() {
    let mut svc = service();
    let receipt = svc
        .store
        .save("talk.pptx", &build_pptx(&[&["TCP"], &["Routing"]]))
        .unwrap();

    let before = svc.status.lookup(&receipt.uid).unwrap();
    assert_eq!(before.status, UploadStatus::Pending);
    assert!(before.detail.as_ref().unwrap().explanation.is_none());

    let scan = svc.watcher.run_once().await.unwrap();
    assert_eq!(scan.processed, vec![receipt.stored_name.clone()]);

    let after = svc.status.lookup(&receipt.uid).unwrap();
    assert_eq!(after.status, UploadStatus::Done);
    let json = serde_json::to_value(&after).unwrap();
    assert_eq!(json["status"], "done");
    assert_eq!(json["explanation"]["1"], "explained slide-1");
    assert_eq!(json["explanation"]["2"], "explained slide-2");
    assert!(
        json["filename"]
            .as_str()
            .unwrap()
            .starts_with(&receipt.uid)
    );
}

#[tokio::test]
async fn test_each_upload_is_processed_once() {
    let mut svc = service();
    svc.store.save("a.pptx", &build_pptx(&[&["one"]])).unwrap();
    svc.store.save("b.pptx", &build_pptx(&[&["two"]])).unwrap();

    let first = svc.watcher.run_once().await.unwrap();
    assert_eq!(first.processed.len(), 2);
    let calls = svc.backend.calls();
    assert_eq!(calls, 4);

    let second = svc.watcher.run_once().await.unwrap();
    assert!(second.is_empty());
    assert_eq!(svc.backend.calls(), calls);
}

#[tokio::test]
async fn test_unknown_uid_reports_not_found() {
    let svc = service();
    let report = svc.status.lookup("does-not-exist").unwrap();
    assert!(!report.is_found());
    assert_eq!(
        serde_json::to_value(&report).unwrap(),
        serde_json::json!({"status": "not found"})
    );
}
