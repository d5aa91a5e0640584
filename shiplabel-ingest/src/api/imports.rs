//! Import endpoints
//!
//! POST /import/pdf, POST /import/spreadsheet (raw body), POST /import/text

use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{error::ApiResult, models::ImportInput, AppState};

/// POST /import/text request
#[derive(Debug, Deserialize)]
pub struct TextImportRequest {
    pub text: String,
}

/// Response for every successful import
#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub inserted: usize,
    pub total: usize,
}

/// POST /import/pdf
///
/// Body is a positioned-token dump of the label PDF.
pub async fn import_pdf(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<ImportResponse>> {
    run_import(&state, ImportInput::Pdf(body.to_vec())).await
}

/// POST /import/spreadsheet
///
/// Body is the row dump of the first sheet.
pub async fn import_spreadsheet(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ImportResponse>> {
    run_import(&state, ImportInput::Spreadsheet(body.to_vec())).await
}

/// POST /import/text
pub async fn import_text(
    State(state): State<AppState>,
    Json(request): Json<TextImportRequest>,
) -> ApiResult<Json<ImportResponse>> {
    run_import(&state, ImportInput::PastedText(request.text)).await
}

async fn run_import(state: &AppState, input: ImportInput) -> ApiResult<Json<ImportResponse>> {
    // Server shutdown cancels in-flight imports
    let cancel = state.shutdown.child_token();

    match state.coordinator.import_batch(input, &cancel).await {
        Ok(outcome) => Ok(Json(ImportResponse {
            inserted: outcome.inserted,
            total: outcome.records.len(),
        })),
        Err(err) => {
            state.record_error(err.to_string()).await;
            Err(err.into())
        }
    }
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/import/pdf", post(import_pdf))
        .route("/import/spreadsheet", post(import_spreadsheet))
        .route("/import/text", post(import_text))
}
