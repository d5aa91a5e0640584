//! One-time data migrations
//!
//! Migrations here are never run at startup. Each is invoked explicitly and
//! records itself in the `settings` table so that a second invocation is
//! refused unless forced.

use chrono::NaiveDate;
use shiplabel_common::db::{get_setting, set_setting};
use shiplabel_common::Result;

use super::addresses::{AddressStore, RecordFilter, RecordPatch, SqliteAddressStore};

/// Settings key recording the date-stamp migration
pub const STAMP_DATES_KEY: &str = "migration.stamp_dates";

/// Result of a date-stamp invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StampOutcome {
    /// Every record's `date` was overwritten
    Applied { date: NaiveDate, updated: u64 },
    /// Already applied earlier; nothing changed
    AlreadyApplied { previous: String },
}

/// Overwrite the `date` of every stored record with `date`
///
/// `created_at` and all other fields are untouched.
pub async fn stamp_all_dates(
    store: &SqliteAddressStore,
    date: NaiveDate,
    force: bool,
) -> Result<StampOutcome> {
    let previous: Option<String> = get_setting(store.pool(), STAMP_DATES_KEY).await?;

    if let Some(previous) = previous {
        if !force {
            tracing::warn!(
                previous = %previous,
                "Date stamp migration already applied, skipping"
            );
            return Ok(StampOutcome::AlreadyApplied { previous });
        }
    }

    let updated = store
        .update(&RecordFilter::All, &RecordPatch { date: Some(date) })
        .await?;

    set_setting(store.pool(), STAMP_DATES_KEY, date.format("%Y-%m-%d")).await?;

    tracing::info!(date = %date, updated, force, "Date stamp migration applied");

    Ok(StampOutcome::Applied { date, updated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory_pool, SortOrder};
    use crate::models::AddressRecord;

    fn record(company: &str) -> AddressRecord {
        AddressRecord {
            id: None,
            date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            company_name: company.to_string(),
            contact_name: String::new(),
            street: "MAIN STREET 1".to_string(),
            city: String::new(),
            state: String::new(),
            country: String::new(),
            zip_code: String::new(),
            mobile_number: String::new(),
            email: "-".to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_stamp_runs_once_unless_forced() {
        let store = SqliteAddressStore::new(init_memory_pool().await.unwrap());
        store.insert(&[record("A"), record("B")]).await.unwrap();
        let stamp = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();

        let first = stamp_all_dates(&store, stamp, false).await.unwrap();
        assert_eq!(first, StampOutcome::Applied { date: stamp, updated: 2 });

        let second = stamp_all_dates(&store, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), false)
            .await
            .unwrap();
        assert_eq!(
            second,
            StampOutcome::AlreadyApplied { previous: "2025-02-14".to_string() }
        );

        let records = store.select(SortOrder::CreatedAscending).await.unwrap();
        assert!(records.iter().all(|r| r.date == stamp));

        let forced_date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let forced = stamp_all_dates(&store, forced_date, true).await.unwrap();
        assert_eq!(forced, StampOutcome::Applied { date: forced_date, updated: 2 });
    }

    #[tokio::test]
    async fn test_stamp_preserves_created_at() {
        let store = SqliteAddressStore::new(init_memory_pool().await.unwrap());
        store.insert(&[record("A")]).await.unwrap();
        let before = store.select(SortOrder::CreatedAscending).await.unwrap();

        stamp_all_dates(&store, NaiveDate::from_ymd_opt(2025, 2, 14).unwrap(), false)
            .await
            .unwrap();

        let after = store.select(SortOrder::CreatedAscending).await.unwrap();
        assert_eq!(after[0].created_at, before[0].created_at);
        assert_eq!(after[0].id, before[0].id);
    }
}
