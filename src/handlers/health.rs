use axum::response::Json;
use serde_json::{json, Value};
use tracing::instrument;

/// Liveness check for `GET /api/health`
#[instrument(name = "health_check")]
pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}
