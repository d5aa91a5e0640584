//! Concurrency, cancellation, timeout and store-failure tests

mod helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use helpers::*;
use shiplabel_common::config::{PdfConfig, TimeoutConfig};
use shiplabel_common::events::EventBus;
use shiplabel_ingest::db::{AddressStore, SortOrder};
use shiplabel_ingest::decoders::{
    DecodeError, JsonRowsDecoder, PdfDecoder, SpreadsheetRow, SpreadsheetDecoder,
};
use shiplabel_ingest::models::{ImportInput, PageTokens};
use shiplabel_ingest::services::{
    DuplicateReconciler, ImportCoordinator, ImportError, MaintenanceError, RecordBook,
};
use tokio_util::sync::CancellationToken;

/// PDF decoder that never finishes
struct StalledPdfDecoder;

#[async_trait]
impl PdfDecoder for StalledPdfDecoder {
    async fn decode(&self, _bytes: &[u8]) -> Result<Vec<PageTokens>, DecodeError> {
        std::future::pending().await
    }
}

/// Spreadsheet decoder that never finishes
struct StalledSheetDecoder;

#[async_trait]
impl SpreadsheetDecoder for StalledSheetDecoder {
    async fn decode(&self, _bytes: &[u8]) -> Result<Vec<SpreadsheetRow>, DecodeError> {
        std::future::pending().await
    }
}

async fn setup(store: Arc<FlakyStore>, timeouts: TimeoutConfig) -> (Arc<RecordBook>, ImportCoordinator) {
    let book = Arc::new(
        RecordBook::load(store, Duration::from_millis(timeouts.store_ms))
            .await
            .unwrap(),
    );
    let coordinator = ImportCoordinator::new(
        book.clone(),
        EventBus::new(64),
        &PdfConfig::default(),
        &timeouts,
    );
    (book, coordinator)
}

#[tokio::test]
async fn test_overlapping_maintenance_is_refused() {
    let store = Arc::new(FlakyStore::new().await);
    let (book, _) = setup(store.clone(), TimeoutConfig::default()).await;
    let reconciler = Arc::new(DuplicateReconciler::new(book, EventBus::new(16)));

    store.block_next_select.store(true, Ordering::SeqCst);
    let first = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.reconcile().await })
    };
    store.select_entered.notified().await;

    let second = reconciler.reconcile().await;
    assert!(matches!(second, Err(MaintenanceError::AlreadyRunning)));

    store.release.notify_one();
    assert!(first.await.unwrap().is_ok());

    // Guard released after the first pass
    assert!(reconciler.reconcile().await.is_ok());
}

#[tokio::test]
async fn test_import_waits_for_maintenance_gate() {
    let store = Arc::new(FlakyStore::new().await);
    let (book, coordinator) = setup(store.clone(), TimeoutConfig::default()).await;
    let reconciler = Arc::new(DuplicateReconciler::new(book.clone(), EventBus::new(16)));

    store.block_next_select.store(true, Ordering::SeqCst);
    let pass = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.reconcile().await })
    };
    store.select_entered.notified().await;

    let coordinator = Arc::new(coordinator);
    let import = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            coordinator
                .import_batch(
                    ImportInput::PastedText(label_text("ACME NV", "MARKT 1")),
                    &CancellationToken::new(),
                )
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);

    store.release.notify_one();
    pass.await.unwrap().unwrap();
    let outcome = import.await.unwrap().unwrap();
    assert_eq!(outcome.inserted, 1);
    assert_eq!(book.len().await, 1);
}

#[tokio::test]
async fn test_cancel_during_decode_writes_nothing() {
    let store = Arc::new(FlakyStore::new().await);
    let (book, coordinator) = setup(store.clone(), TimeoutConfig::default()).await;
    let coordinator = coordinator.with_decoders(Arc::new(StalledPdfDecoder), Arc::new(JsonRowsDecoder::new()));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = coordinator
        .import_batch(ImportInput::Pdf(shipping_label_pdf("ACME BELGIUM")), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Cancelled));
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    assert!(book.is_empty().await);
}

#[tokio::test]
async fn test_decoder_timeout_is_decode_error() {
    let store = Arc::new(FlakyStore::new().await);
    let timeouts = TimeoutConfig { decode_ms: 30, store_ms: 10_000 };
    let (_, coordinator) = setup(store.clone(), timeouts).await;
    let coordinator = coordinator.with_decoders(Arc::new(StalledPdfDecoder), Arc::new(StalledSheetDecoder));

    let err = coordinator
        .import_batch(ImportInput::Spreadsheet(b"[]".to_vec()), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Decode(_)));
    assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_store_timeout_is_store_error() {
    let store = Arc::new(FlakyStore::new().await.with_insert_delay(Duration::from_millis(500)));
    let timeouts = TimeoutConfig { decode_ms: 30_000, store_ms: 30 };
    let (book, coordinator) = setup(store.clone(), timeouts).await;

    let err = coordinator
        .import_batch(
            ImportInput::PastedText(label_text("ACME NV", "MARKT 1")),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Store(_)));
    assert!(book.is_empty().await);
}

#[tokio::test]
async fn test_failed_insert_leaves_store_and_snapshot_untouched() {
    let store = Arc::new(FlakyStore::new().await);
    let (book, coordinator) = setup(store.clone(), TimeoutConfig::default()).await;
    store.fail_insert.store(true, Ordering::SeqCst);

    let err = coordinator
        .import_batch(
            ImportInput::PastedText(label_text("ACME NV", "MARKT 1")),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Store(_)));
    assert!(book.is_empty().await);
    assert!(store.sqlite().select(SortOrder::CreatedAscending).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_delete_reports_plan_and_keeps_records() {
    let store = Arc::new(FlakyStore::new().await);
    store.sqlite().insert(&[record("ACME", "S 1")]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.sqlite().insert(&[record("ACME", "S 1")]).await.unwrap();

    let (book, _) = setup(store.clone(), TimeoutConfig::default()).await;
    let reconciler = DuplicateReconciler::new(book, EventBus::new(16));
    store.fail_delete.store(true, Ordering::SeqCst);

    match reconciler.reconcile().await {
        Err(MaintenanceError::DeleteFailed { plan, message }) => {
            assert_eq!(plan.duplicate_ids.len(), 1);
            assert_eq!(plan.survivors, 1);
            assert!(message.contains("locked"));
        }
        other => panic!("expected DeleteFailed, got {:?}", other.map(|r| r.removed)),
    }

    assert_eq!(store.sqlite().select(SortOrder::CreatedAscending).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_reread_after_insert_still_blocks_duplicate() {
    let store = Arc::new(FlakyStore::new().await);
    let (book, coordinator) = setup(store.clone(), TimeoutConfig::default()).await;
    // The import's re-read after insert is the first select from here
    store.fail_select_after(0);

    let first = coordinator
        .import_batch(
            ImportInput::PastedText(label_text("ACME NV", "MARKT 1")),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(first.inserted, 1);
    assert!(book.is_stale());
    assert_eq!(store.sqlite().select(SortOrder::CreatedAscending).await.unwrap().len(), 1);

    let retry = coordinator
        .import_batch(
            ImportInput::PastedText(label_text("ACME NV", "MARKT 1")),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(retry, ImportError::DuplicateConflict { conflicts: 1 }));
    assert!(!book.is_stale());
    assert_eq!(book.len().await, 1);
    assert_eq!(store.sqlite().select(SortOrder::CreatedAscending).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_reread_after_delete_reports_removal() {
    let store = Arc::new(FlakyStore::new().await);
    store.sqlite().insert(&[record("ACME", "S 1")]).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.sqlite().insert(&[record("ACME", "S 1")]).await.unwrap();

    let (book, _) = setup(store.clone(), TimeoutConfig::default()).await;
    let reconciler = DuplicateReconciler::new(book.clone(), EventBus::new(16));

    // Scan succeeds, re-read after delete fails
    store.fail_select_after(1);

    let report = reconciler.reconcile().await.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.remaining, 1);
    assert!(book.is_stale());
    assert_eq!(store.sqlite().select(SortOrder::CreatedAscending).await.unwrap().len(), 1);
}
