//! Liveness probe

use axum::Json;

use crate::models::HealthResponse;

/// Always `{"ok": true}`; never touches the object store.
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}
