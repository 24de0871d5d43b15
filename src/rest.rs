//! REST request/response adapter.
//!
//! Builds an axum router from the route catalogue. Each handler merges the
//! request's path, query, and body parameters, resolves through the fallback
//! engine, and maps the outcome to the wire: 200 with the matched body, 404
//! with the probed key list, or 500 when the matched entry is unusable.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::dispatch::{Dispatcher, Outcome};
use crate::resolver::{merge_params, RouteTemplate};
use crate::routes::{HttpMethod, RouteSpec};
use crate::table::ResponseTable;

/// Build the mocked-API router from a route catalogue.
pub fn router(table: Arc<ResponseTable>, catalogue: &[RouteSpec]) -> Router {
    let dispatcher = Dispatcher::new(table);
    let mut app = Router::new();

    for spec in catalogue {
        let template = RouteTemplate::parse(&spec.key);
        let dispatcher = dispatcher.clone();

        let handler = move |Path(path): Path<HashMap<String, String>>,
                            Query(query): Query<HashMap<String, String>>,
                            body: Option<Json<Value>>| async move {
            serve_route(
                &dispatcher,
                &template,
                &path,
                &query,
                body.map(|Json(value)| value),
            )
        };

        app = match spec.effective_method() {
            HttpMethod::Get => app.route(&spec.path, get(handler)),
            HttpMethod::Post => app.route(&spec.path, post(handler)),
        };
    }

    app
}

fn serve_route(
    dispatcher: &Dispatcher,
    template: &RouteTemplate,
    path_params: &HashMap<String, String>,
    query_params: &HashMap<String, String>,
    body: Option<Value>,
) -> Response {
    let params = merge_params(path_params, query_params, body.as_ref());

    match dispatcher.resolve(template, &params) {
        Ok(Outcome::Found(value)) => Json(value).into_response(),
        Ok(Outcome::NotFound { tried }) => {
            debug!(keys = ?tried, "no response configured for request");
            (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "unknown arguments", "keys": tried })),
            )
                .into_response()
        }
        Err(err) => {
            warn!(%err, "matched response is unusable");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "bad response json" })),
            )
                .into_response()
        }
    }
}
