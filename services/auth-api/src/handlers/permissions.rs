//! Permission catalog handler

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/permissions
pub async fn list_permissions(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.auth.catalog().list().to_vec())
}
