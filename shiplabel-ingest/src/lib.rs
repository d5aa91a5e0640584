//! shiplabel-ingest library interface
//!
//! Shipping-label address ingest: PDF token dumps, spreadsheet rows and
//! pasted text are turned into normalized address records, guarded against
//! duplicates, and stored in SQLite.

pub mod api;
pub mod db;
pub mod decoders;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use shiplabel_common::config::TomlConfig;
use shiplabel_common::events::EventBus;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::db::SqliteAddressStore;
use crate::services::{DuplicateReconciler, ImportCoordinator, RecordBook};

/// Event bus capacity
pub const EVENT_CAPACITY: usize = 100;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ImportCoordinator>,
    pub reconciler: Arc<DuplicateReconciler>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Cancelled on shutdown; imports run on child tokens
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        coordinator: Arc<ImportCoordinator>,
        reconciler: Arc<DuplicateReconciler>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            coordinator,
            reconciler,
            event_bus,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Wire the pipeline over an initialized pool
    ///
    /// Loads the record snapshot from the store.
    pub async fn from_pool(db: SqlitePool, config: &TomlConfig) -> shiplabel_common::Result<Self> {
        let event_bus = EventBus::new(EVENT_CAPACITY);
        let store = Arc::new(SqliteAddressStore::new(db));
        let book = Arc::new(
            RecordBook::load(
                store,
                shiplabel_common::time::millis_to_duration(config.timeouts.store_ms),
            )
            .await?,
        );

        let coordinator = Arc::new(ImportCoordinator::new(
            Arc::clone(&book),
            event_bus.clone(),
            &config.pdf,
            &config.timeouts,
        ));
        let reconciler = Arc::new(DuplicateReconciler::new(book, event_bus.clone()));

        Ok(Self::new(coordinator, reconciler, event_bus))
    }

    /// Remember the most recent failure for `/health`
    pub async fn record_error(&self, message: String) {
        *self.last_error.write().await = Some(message);
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::import_routes())
        .merge(api::record_routes())
        .merge(api::maintenance_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
