//! Shared view of the record store
//!
//! [`RecordBook`] owns the in-memory snapshot of every stored record
//! (`created_at` descending, the listing order) and the write gate. Imports
//! hold the gate across conflict check, insert and re-read; maintenance
//! holds it for its whole pass. Readers only take the snapshot lock.
//!
//! A failed re-read leaves the snapshot marked stale; writers call
//! [`RecordBook::ensure_fresh`] under the gate before checking conflicts.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shiplabel_common::{Error, Result};
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard};
use uuid::Uuid;

use crate::db::{AddressStore, SortOrder};
use crate::models::AddressRecord;

pub struct RecordBook {
    store: Arc<dyn AddressStore>,
    store_timeout: Duration,
    snapshot: RwLock<Vec<AddressRecord>>,
    stale: AtomicBool,
    write_gate: Mutex<()>,
}

impl RecordBook {
    /// Empty snapshot; call [`RecordBook::refresh`] to populate
    pub fn new(store: Arc<dyn AddressStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
            snapshot: RwLock::new(Vec::new()),
            stale: AtomicBool::new(false),
            write_gate: Mutex::new(()),
        }
    }

    /// Build and populate from the store
    pub async fn load(store: Arc<dyn AddressStore>, store_timeout: Duration) -> Result<Self> {
        let book = Self::new(store, store_timeout);
        book.refresh().await?;
        Ok(book)
    }

    /// Enter the write critical section
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Borrow the snapshot
    pub async fn read(&self) -> RwLockReadGuard<'_, Vec<AddressRecord>> {
        self.snapshot.read().await
    }

    /// Copy of every record, newest first
    pub async fn records(&self) -> Vec<AddressRecord> {
        self.snapshot.read().await.clone()
    }

    /// Records matching `query` on any field, newest first
    pub async fn search(&self, query: &str) -> Vec<AddressRecord> {
        self.snapshot
            .read()
            .await
            .iter()
            .filter(|r| r.matches_query(query))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshot.read().await.is_empty()
    }

    /// Re-read the whole store and replace the snapshot
    ///
    /// Returns the new record count. On failure the old snapshot is kept and
    /// marked stale.
    pub async fn refresh(&self) -> Result<usize> {
        let records = match self
            .timed("select", self.store.select(SortOrder::CreatedDescending))
            .await
        {
            Ok(records) => records,
            Err(e) => {
                self.stale.store(true, Ordering::SeqCst);
                return Err(e);
            }
        };
        let total = records.len();
        *self.snapshot.write().await = records;
        self.stale.store(false, Ordering::SeqCst);

        tracing::debug!(total, "Record snapshot refreshed");
        Ok(total)
    }

    /// Whether the last re-read failed and the snapshot may miss stored rows
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::SeqCst)
    }

    /// Re-read the store if the snapshot is stale; callers hold the write gate
    pub async fn ensure_fresh(&self) -> Result<()> {
        if self.is_stale() {
            tracing::info!("Snapshot stale, re-reading store before write");
            self.refresh().await?;
        }
        Ok(())
    }

    /// Full store scan, oldest first
    pub async fn select_ascending(&self) -> Result<Vec<AddressRecord>> {
        self.timed("select", self.store.select(SortOrder::CreatedAscending))
            .await
    }

    /// Insert a batch; callers hold the write gate
    pub async fn insert(&self, records: &[AddressRecord]) -> Result<u64> {
        self.timed("insert", self.store.insert(records)).await
    }

    /// Delete by id; callers hold the write gate
    pub async fn delete(&self, ids: &[Uuid]) -> Result<u64> {
        self.timed("delete", self.store.delete(ids)).await
    }

    async fn timed<T, F>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.store_timeout.as_millis() as u64, "Store call timed out");
                Err(Error::Timeout(format!(
                    "store {} exceeded {} ms",
                    op,
                    self.store_timeout.as_millis()
                )))
            }
        }
    }
}
