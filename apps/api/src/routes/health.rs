use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "roast-api"
    }))
}

/// GET /health/model
/// Sends a one-line probe to the model. 503 when it does not answer.
pub async fn model_health_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let model = state.analyzer.model();
    let reachable = model.check_connection().await;
    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        status,
        Json(json!({
            "status": if reachable { "ok" } else { "unavailable" },
            "model": model.model_name()
        })),
    )
}
