//! Maintenance endpoints

use axum::{extract::State, routing::post, Json, Router};

use crate::{error::ApiResult, services::ReconciliationReport, AppState};

/// POST /maintenance/reconcile
///
/// Runs one duplicate reconciliation pass. 409 while another pass runs.
pub async fn reconcile(State(state): State<AppState>) -> ApiResult<Json<ReconciliationReport>> {
    match state.reconciler.reconcile().await {
        Ok(report) => Ok(Json(report)),
        Err(err) => {
            state.record_error(err.to_string()).await;
            Err(err.into())
        }
    }
}

pub fn maintenance_routes() -> Router<AppState> {
    Router::new().route("/maintenance/reconcile", post(reconcile))
}
