//! Record listing

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{models::AddressRecord, AppState};

/// GET /records query
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    /// Case-insensitive substring over every field
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordListResponse {
    pub count: usize,
    pub records: Vec<AddressRecord>,
}

/// GET /records?q=
///
/// Stored records, newest first, optionally filtered.
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Json<RecordListResponse> {
    let book = state.coordinator.book();
    let records = match query.q.as_deref() {
        Some(q) => book.search(q).await,
        None => book.records().await,
    };

    Json(RecordListResponse {
        count: records.len(),
        records,
    })
}

pub fn record_routes() -> Router<AppState> {
    Router::new().route("/records", get(list_records))
}
