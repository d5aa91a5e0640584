//! HTTP server and routing integration tests

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shiplabel_ingest::build_router;
use tower::ServiceExt;

use helpers::*;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_raw(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_router(test_app_state().await);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["module"], "shiplabel-ingest");
    assert_eq!(json["records"], 0);
    assert!(json.get("last_error").is_none());
}

#[tokio::test]
async fn test_text_import_then_duplicate_conflict() {
    let app = build_router(test_app_state().await);
    let text = label_text("ACME NV", "KERKSTRAAT 5");

    let response = app
        .clone()
        .oneshot(post_json("/import/text", json!({ "text": text })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["inserted"], 1);
    assert_eq!(json["total"], 1);

    let response = app
        .oneshot(post_json("/import/text", json!({ "text": text })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_unusable_text_is_address_not_found() {
    let state = test_app_state().await;
    let app = build_router(state.clone());

    let response = app
        .oneshot(post_json("/import/text", json!({ "text": "hello\nworld" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "ADDRESS_NOT_FOUND");
    assert_eq!(json["error"]["message"], "Address not found");
    assert!(state.last_error.read().await.is_some());
}

#[tokio::test]
async fn test_pdf_and_spreadsheet_uploads() {
    let app = build_router(test_app_state().await);

    let response = app
        .clone()
        .oneshot(post_raw("/import/pdf", shipping_label_pdf("ACME BELGIUM CORP")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let rows = spreadsheet(json!([
        { "Company Name": "BETA NV", "Street": "DAM 1", "City": "GENT" }
    ]));
    let response = app
        .clone()
        .oneshot(post_raw("/import/spreadsheet", rows))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["total"], 2);

    let response = app
        .oneshot(post_raw("/import/spreadsheet", b"[]".to_vec()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "DECODE_FAILED");
}

#[tokio::test]
async fn test_records_listing_and_search() {
    let app = build_router(test_app_state().await);

    for company in ["ACME NV", "BETA NV"] {
        let response = app
            .clone()
            .oneshot(post_json("/import/text", json!({ "text": label_text(company, "MARKT 1") })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/records").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["records"][0]["company_name"], "BETA NV");
    assert_eq!(json["records"][0]["email"], "-");

    let response = app
        .oneshot(Request::builder().uri("/records?q=acme").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["records"][0]["company_name"], "ACME NV");
}

#[tokio::test]
async fn test_reconcile_endpoint() {
    let app = build_router(test_app_state().await);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/maintenance/reconcile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["removed"], 0);
    assert_eq!(json["remaining"], 0);
}

#[tokio::test]
async fn test_events_endpoint_is_sse() {
    let app = build_router(test_app_state().await);

    let response = app
        .oneshot(Request::builder().uri("/events").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/event-stream"));
}
