use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::error;

use super::AppState;

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Reports whether the database answers a trivial query.
pub(crate) async fn db_health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let result = state
        .db()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .and_then(|db| db.ping());
    match result {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "connected" }))),
        Err(e) => {
            error!("database health check failed: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "detail": format!("{e:#}") })),
            )
        }
    }
}
