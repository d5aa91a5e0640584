//! Duplicate detection and maintenance reconciliation
//!
//! Two records describe the same physical address when their
//! [`IdentityKey`]s are equal. Imports are rejected outright when any
//! candidate collides with a stored record. The maintenance pass collapses
//! each key down to its most recently created record.
//!
//! Planning ([`plan_reconciliation`]) is pure; [`DuplicateReconciler`]
//! applies a plan against the store under the write gate.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use shiplabel_common::events::{EventBus, LabelEvent};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::record_book::RecordBook;
use crate::models::AddressRecord;

/// Lower-cased (company, street, city, zip, country)
///
/// Contact, state, phone and email do not take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey {
    company_name: String,
    street: String,
    city: String,
    zip_code: String,
    country: String,
}

impl IdentityKey {
    pub fn of(record: &AddressRecord) -> Self {
        Self {
            company_name: record.company_name.to_lowercase(),
            street: record.street.to_lowercase(),
            city: record.city.to_lowercase(),
            zip_code: record.zip_code.to_lowercase(),
            country: record.country.to_lowercase(),
        }
    }
}

/// Number of `candidates` whose key already exists in `existing`
pub fn find_conflicts(candidates: &[AddressRecord], existing: &[AddressRecord]) -> usize {
    let stored: HashSet<IdentityKey> = existing.iter().map(IdentityKey::of).collect();
    candidates
        .iter()
        .filter(|c| stored.contains(&IdentityKey::of(c)))
        .count()
}

/// Outcome of planning a maintenance pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationPlan {
    /// Distinct identity keys seen
    pub survivors: usize,
    /// Records to delete, in discovery order
    pub duplicate_ids: Vec<Uuid>,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.duplicate_ids.is_empty()
    }
}

/// Mark every record that is not the newest for its identity key
///
/// `records` must be in ascending `created_at` order. On an exact timestamp
/// tie the record appearing later wins. Records without an id are never
/// marked.
pub fn plan_reconciliation(records: &[AddressRecord]) -> ReconciliationPlan {
    let mut best: HashMap<IdentityKey, &AddressRecord> = HashMap::new();
    let mut duplicate_ids = Vec::new();

    for record in records {
        let key = IdentityKey::of(record);
        let current = best.get(&key).map(|r| (r.id, r.created_at));
        match current {
            None => {
                best.insert(key, record);
            }
            Some((current_id, current_created)) if record.created_at >= current_created => {
                duplicate_ids.extend(current_id);
                best.insert(key, record);
            }
            Some(_) => {
                duplicate_ids.extend(record.id);
            }
        }
    }

    ReconciliationPlan {
        survivors: best.len(),
        duplicate_ids,
    }
}

/// Maintenance pass failures
#[derive(Debug, Error)]
pub enum MaintenanceError {
    /// Another pass holds the overlap guard
    #[error("Reconciliation already running")]
    AlreadyRunning,

    /// Reading the store failed
    #[error("Store error: {0}")]
    Store(#[from] shiplabel_common::Error),

    /// Batch delete failed; nothing was removed
    #[error("Failed to delete {} duplicates: {message}", .plan.duplicate_ids.len())]
    DeleteFailed {
        plan: ReconciliationPlan,
        message: String,
    },
}

/// Result of a completed maintenance pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub removed: usize,
    pub remaining: usize,
}

/// Applies reconciliation plans against the shared record book
pub struct DuplicateReconciler {
    book: Arc<RecordBook>,
    event_bus: EventBus,
    running: Mutex<()>,
}

impl DuplicateReconciler {
    pub fn new(book: Arc<RecordBook>, event_bus: EventBus) -> Self {
        Self {
            book,
            event_bus,
            running: Mutex::new(()),
        }
    }

    /// Delete every older duplicate in the store
    ///
    /// Refuses to start while another pass is running. Idempotent: a second
    /// pass over an unchanged store removes nothing.
    pub async fn reconcile(&self) -> Result<ReconciliationReport, MaintenanceError> {
        let _running = self
            .running
            .try_lock()
            .map_err(|_| MaintenanceError::AlreadyRunning)?;
        let _gate = self.book.lock_writes().await;

        let records = self.book.select_ascending().await?;
        let plan = plan_reconciliation(&records);

        let removed = if plan.is_empty() {
            0
        } else {
            match self.book.delete(&plan.duplicate_ids).await {
                Ok(_) => plan.duplicate_ids.len(),
                Err(e) => {
                    tracing::error!(
                        duplicates = plan.duplicate_ids.len(),
                        error = %e,
                        "Duplicate deletion failed"
                    );
                    return Err(MaintenanceError::DeleteFailed {
                        plan,
                        message: e.to_string(),
                    });
                }
            }
        };

        let remaining = match self.book.refresh().await {
            Ok(total) => total,
            Err(e) => {
                tracing::warn!(removed, error = %e, "Re-read after reconciliation failed, snapshot stale");
                records.len() - removed
            }
        };

        tracing::info!(
            scanned = records.len(),
            removed,
            remaining,
            "Duplicate reconciliation complete"
        );

        if removed > 0 {
            self.event_bus.emit_lossy(LabelEvent::DuplicatesRemoved {
                removed,
                remaining,
                timestamp: shiplabel_common::time::now(),
            });
        }

        Ok(ReconciliationReport { removed, remaining })
    }
}
