//! Router-level tests for the REST adapter and its control plane.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use api_mock_server::config::RestConfig;
use api_mock_server::{control, rest, ResponseTable};

fn api_router(table: &Arc<ResponseTable>) -> Router {
    rest::router(Arc::clone(table), &RestConfig::default().catalogue())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_most_specific_response_wins() {
    let table = Arc::new(ResponseTable::new());
    table.set("orders.tBTCUSD", json!([42]));
    table.set("orders", json!([41]));

    let response = api_router(&table)
        .oneshot(post_json("/v2/auth/r/orders/tBTCUSD/hist", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([42]));

    let response = api_router(&table)
        .oneshot(post_json("/v2/auth/r/orders/tETHUSD/hist", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([41]));
}

#[tokio::test]
async fn test_query_params_feed_the_key_template() {
    let table = Arc::new(ResponseTable::new());
    // public_trades.{symbol}.{start}.{end}.{limit}.{sort} with only
    // symbol + limit supplied falls back to the symbol-level entry.
    table.set("public_trades.tBTCUSD", json!([[1001, 1524784806000i64, 0.05]]));

    let response = api_router(&table)
        .oneshot(get("/v2/trades/tBTCUSD/hist?limit=25"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([[1001, 1524784806000i64, 0.05]]));
}

#[tokio::test]
async fn test_unknown_arguments_reports_probed_keys() {
    let table = Arc::new(ResponseTable::new());

    let response = api_router(&table)
        .oneshot(get("/v2/ticker/tXRPUSD"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], json!("unknown arguments"));
    assert_eq!(body["keys"], json!(["ticker.tXRPUSD", "ticker"]));
}

#[tokio::test]
async fn test_corrupt_entry_is_a_server_error() {
    let table = Arc::new(ResponseTable::new());
    table.set_raw("tickers", "[oops");

    let response = api_router(&table).oneshot(get("/v2/tickers")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], json!("bad response json"));
}

#[tokio::test]
async fn test_explicit_null_is_served_not_missing() {
    let table = Arc::new(ResponseTable::new());
    table.set("wallets", Value::Null);

    let response = api_router(&table)
        .oneshot(post_json("/v2/auth/r/wallets", "{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, Value::Null);
}

#[tokio::test]
async fn test_control_plane_set_then_get() {
    let table = Arc::new(ResponseTable::new());

    let response = control::router(Arc::clone(&table))
        .oneshot(post_json("/f_offers.fUSD", r#"[[41215275, "fUSD", 1000]]"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = control::router(Arc::clone(&table))
        .oneshot(get("/f_offers.fUSD"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([[41215275, "fUSD", 1000]]));
}

#[tokio::test]
async fn test_control_plane_unknown_key_is_404() {
    let table = Arc::new(ResponseTable::new());

    let response = control::router(table)
        .oneshot(get("/not.a.key"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], json!("unknown key"));
}

#[tokio::test]
async fn test_control_plane_write_visible_to_api() {
    let table = Arc::new(ResponseTable::new());

    let response = control::router(Arc::clone(&table))
        .oneshot(post_json("/ticker.tBTCUSD", "[7000.1, 7000.2]"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = api_router(&table)
        .oneshot(get("/v2/ticker/tBTCUSD"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([7000.1, 7000.2]));
}
