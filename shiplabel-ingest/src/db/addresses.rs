//! Address record persistence
//!
//! [`AddressStore`] is the store collaborator: ordered full scan, batch
//! insert, bulk update and bulk delete-by-id, each atomic per call. The
//! store alone assigns `id` and `created_at`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use shiplabel_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::models::AddressRecord;

/// Scan order over `created_at`; equal timestamps keep insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    CreatedAscending,
    CreatedDescending,
}

/// Which records an update applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    All,
    Ids(Vec<Uuid>),
}

/// Fields to overwrite; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub date: Option<NaiveDate>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
    }
}

/// Persistent record store
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Every stored record in `order`
    async fn select(&self, order: SortOrder) -> Result<Vec<AddressRecord>>;

    /// Persist a batch in one transaction, assigning `id` and `created_at`
    ///
    /// Incoming `id`/`created_at` values are ignored.
    async fn insert(&self, records: &[AddressRecord]) -> Result<u64>;

    /// Apply `patch` to every record matched by `filter`
    async fn update(&self, filter: &RecordFilter, patch: &RecordPatch) -> Result<u64>;

    /// Delete the given ids in one statement
    async fn delete(&self, ids: &[Uuid]) -> Result<u64>;
}

/// SQLite-backed [`AddressStore`]
#[derive(Clone)]
pub struct SqliteAddressStore {
    db: SqlitePool,
}

impl SqliteAddressStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }
}

const SELECT_COLUMNS: &str = "SELECT id, date, company_name, contact_name, street, city, state, \
     country, zip_code, mobile_number, email, created_at FROM addresses";

/// Timestamp text that sorts lexicographically in time order
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn record_from_row(row: &SqliteRow) -> Result<AddressRecord> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))?;

    let date_str: String = row.get("date");
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
        .map_err(|e| Error::Internal(format!("Invalid date '{}' in database: {}", date_str, e)))?;

    let created_str: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_str)
        .map_err(|e| Error::Internal(format!("Failed to parse created_at: {}", e)))?
        .with_timezone(&Utc);

    Ok(AddressRecord {
        id: Some(id),
        date,
        company_name: row.get("company_name"),
        contact_name: row.get("contact_name"),
        street: row.get("street"),
        city: row.get("city"),
        state: row.get("state"),
        country: row.get("country"),
        zip_code: row.get("zip_code"),
        mobile_number: row.get("mobile_number"),
        email: row.get("email"),
        created_at: Some(created_at),
    })
}

#[async_trait]
impl AddressStore for SqliteAddressStore {
    async fn select(&self, order: SortOrder) -> Result<Vec<AddressRecord>> {
        let sql = match order {
            SortOrder::CreatedAscending => {
                format!("{} ORDER BY created_at ASC, rowid ASC", SELECT_COLUMNS)
            }
            SortOrder::CreatedDescending => {
                format!("{} ORDER BY created_at DESC, rowid DESC", SELECT_COLUMNS)
            }
        };

        let rows = sqlx::query(&sql).fetch_all(&self.db).await?;
        rows.iter().map(record_from_row).collect()
    }

    async fn insert(&self, records: &[AddressRecord]) -> Result<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let created_at = format_timestamp(Utc::now());
        let mut tx = self.db.begin().await?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO addresses (
                    id, date, company_name, contact_name, street, city, state,
                    country, zip_code, mobile_number, email, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(record.date.format("%Y-%m-%d").to_string())
            .bind(&record.company_name)
            .bind(&record.contact_name)
            .bind(&record.street)
            .bind(&record.city)
            .bind(&record.state)
            .bind(&record.country)
            .bind(&record.zip_code)
            .bind(&record.mobile_number)
            .bind(&record.email)
            .bind(&created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = records.len(), created_at = %created_at, "Inserted address batch");

        Ok(records.len() as u64)
    }

    async fn update(&self, filter: &RecordFilter, patch: &RecordPatch) -> Result<u64> {
        let Some(date) = patch.date else {
            return Ok(0);
        };

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE addresses SET date = ");
        builder.push_bind(date.format("%Y-%m-%d").to_string());

        match filter {
            RecordFilter::All => {}
            RecordFilter::Ids(ids) if ids.is_empty() => return Ok(0),
            RecordFilter::Ids(ids) => {
                builder.push(" WHERE id IN (");
                let mut separated = builder.separated(", ");
                for id in ids {
                    separated.push_bind(id.to_string());
                }
                separated.push_unseparated(")");
            }
        }

        let result = builder.build().execute(&self.db).await?;

        tracing::debug!(rows = result.rows_affected(), date = %date, "Updated record dates");

        Ok(result.rows_affected())
    }

    async fn delete(&self, ids: &[Uuid]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("DELETE FROM addresses WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.db).await?;

        tracing::debug!(requested = ids.len(), deleted = result.rows_affected(), "Deleted records");

        Ok(result.rows_affected())
    }
}
