use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, routing::get, Json, Router};

use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/internal/sync", get(sync_status))
}

pub async fn health() -> axum::response::Response {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response()
}

/// Index propagation status: retry backlog plus snapshots parked for
/// manual reconciliation.
pub async fn sync_status(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let dead = services.sync.dead_letters();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "pendingRetries": services.sync.pending_retries(),
            "deadLetters": dead,
        })),
    )
        .into_response()
}
