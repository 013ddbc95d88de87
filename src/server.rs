use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::coordinator::Coordinator;
use crate::engine::Engine;
use crate::request::Request;

#[derive(Deserialize, Default)]
pub struct OutputParams {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn router<E: Engine>(coordinator: Coordinator<E>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::POST])
        .allow_headers(Any);
    Router::new()
        .route("/mindy", post(handle_mindy::<E>))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(coordinator)
}

async fn handle_mindy<E: Engine>(
    State(coordinator): State<Coordinator<E>>,
    Query(params): Query<OutputParams>,
    Json(req): Json<Request>,
) -> Response {
    let started = std::time::Instant::now();
    let result = coordinator.execute(req).await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    match result {
        Ok(results) => {
            info!(ms = elapsed_ms, indexes = results.len(), code = 200, "mindy request");
            if params.format.as_deref() == Some("csv") {
                ([(header::CONTENT_TYPE, "text/csv")], results.to_csv()).into_response()
            } else {
                (StatusCode::OK, Json(results)).into_response()
            }
        }
        Err(e) => {
            let status = if e.is_validation() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
            let msg = if e.is_validation() { format!("{e}") } else { format!("querying pilosa: {e}") };
            warn!(%msg, code = %status.as_u16(), ms = elapsed_ms, "mindy request");
            (status, Json(ErrorResponse { error: msg })).into_response()
        }
    }
}
