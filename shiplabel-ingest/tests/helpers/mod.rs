//! Test helper utilities
//!
//! Shared fixtures and store doubles for the shiplabel-ingest integration
//! tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use shiplabel_common::config::TomlConfig;
use shiplabel_common::{Error, Result};
use shiplabel_ingest::db::{
    init_memory_pool, AddressStore, RecordFilter, RecordPatch, SortOrder, SqliteAddressStore,
};
use shiplabel_ingest::models::AddressRecord;
use shiplabel_ingest::AppState;
use tokio::sync::Notify;
use uuid::Uuid;

/// App state over a fresh in-memory database with default configuration
pub async fn test_app_state() -> AppState {
    let pool = init_memory_pool().await.unwrap();
    AppState::from_pool(pool, &TomlConfig::default()).await.unwrap()
}

/// In-memory SQLite store
pub async fn memory_store() -> SqliteAddressStore {
    SqliteAddressStore::new(init_memory_pool().await.unwrap())
}

/// Pasted label text for one address
pub fn label_text(company: &str, street: &str) -> String {
    format!(
        "Order 1001\nSHIP TO:\nJOHN DOE\n0470 11 22 33\n{}\n{}\n9000 GENT\nBELGIUM\n",
        company, street
    )
}

/// pdf.js-style token dump: one token per visual line, top to bottom
///
/// Empty end-of-line items separate the lines, as pdf.js emits them. Items
/// are written bottom-up so the decoder output is out of reading order.
pub fn pdf_dump(lines: &[&str]) -> Vec<u8> {
    let mut items = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let y = 720.0 - 12.0 * i as f64;
        items.push(json!({ "str": line, "transform": [10, 0, 0, 10, 36.0, y] }));
        items.push(json!({ "str": "", "x": 300.0, "y": y }));
    }
    items.reverse();
    serde_json::to_vec(&json!([{ "page": 1, "items": items }])).unwrap()
}

/// Token dump of a label in the fixed-destination format
pub fn shipping_label_pdf(company: &str) -> Vec<u8> {
    pdf_dump(&[
        "SHIP TO:",
        "JOHN DOE",
        company,
        "Z.4 BROEKOOI 290",
        "UPS STANDARD",
        "BILLING",
        "SENDER BELGIUM NV",
    ])
}

/// Spreadsheet row export
pub fn spreadsheet(rows: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&rows).unwrap()
}

/// Unsaved record with the given identity fields
pub fn record(company: &str, street: &str) -> AddressRecord {
    AddressRecord {
        id: None,
        date: NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(),
        company_name: company.to_string(),
        contact_name: "JOHN DOE".to_string(),
        street: street.to_string(),
        city: "GENT".to_string(),
        state: String::new(),
        country: "BELGIUM".to_string(),
        zip_code: "9000".to_string(),
        mobile_number: "0470112233".to_string(),
        email: "-".to_string(),
        created_at: None,
    }
}

/// Store double: wraps SQLite and can fail, stall or block selected calls
#[derive(Default)]
pub struct FlakyStore {
    inner: Option<SqliteAddressStore>,
    pub fail_insert: AtomicBool,
    pub fail_delete: AtomicBool,
    /// 1-based select call number that fails once; 0 disables
    pub fail_select_number: AtomicUsize,
    pub selects: AtomicUsize,
    pub insert_delay: Option<Duration>,
    /// Next select parks until `release` is notified
    pub block_next_select: AtomicBool,
    pub select_entered: Arc<Notify>,
    pub release: Arc<Notify>,
    pub inserts: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl FlakyStore {
    pub async fn new() -> Self {
        Self {
            inner: Some(memory_store().await),
            ..Default::default()
        }
    }

    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = Some(delay);
        self
    }

    fn inner(&self) -> &SqliteAddressStore {
        self.inner.as_ref().expect("store initialized")
    }

    /// Let `skip` more selects through, then fail the one after
    pub fn fail_select_after(&self, skip: usize) {
        let next = self.selects.load(Ordering::SeqCst) + skip + 1;
        self.fail_select_number.store(next, Ordering::SeqCst);
    }

    /// Direct access, bypassing failure injection
    pub fn sqlite(&self) -> &SqliteAddressStore {
        self.inner()
    }
}

#[async_trait]
impl AddressStore for FlakyStore {
    async fn select(&self, order: SortOrder) -> Result<Vec<AddressRecord>> {
        let number = self.selects.fetch_add(1, Ordering::SeqCst) + 1;
        if self
            .fail_select_number
            .compare_exchange(number, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return Err(Error::Internal("connection reset".to_string()));
        }
        if self.block_next_select.swap(false, Ordering::SeqCst) {
            self.select_entered.notify_one();
            self.release.notified().await;
        }
        self.inner().select(order).await
    }

    async fn insert(&self, records: &[AddressRecord]) -> Result<u64> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(Error::Internal("disk full".to_string()));
        }
        self.inner().insert(records).await
    }

    async fn update(&self, filter: &RecordFilter, patch: &RecordPatch) -> Result<u64> {
        self.inner().update(filter, patch).await
    }

    async fn delete(&self, ids: &[Uuid]) -> Result<u64> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Error::Internal("database is locked".to_string()));
        }
        self.inner().delete(ids).await
    }
}
