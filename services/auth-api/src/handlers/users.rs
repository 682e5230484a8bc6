//! User management handlers

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use warden_types::User;

use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<User>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(user) = payload?;
    let created = state.auth.users().create(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/users
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.auth.users().list().await?))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    subject: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<User>> {
    let Path(subject) = subject?;
    Ok(Json(state.auth.users().get(&subject).await?))
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    subject: Result<Path<String>, PathRejection>,
    payload: Result<Json<User>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Path(subject) = subject?;
    let Json(user) = payload?;
    Ok(Json(state.auth.users().update(&subject, user).await?))
}

/// DELETE /api/users/{id}
///
/// Soft delete: the record stays, flagged so it can no longer sign in
pub async fn delete_user(
    State(state): State<AppState>,
    subject: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(subject) = subject?;
    state.auth.users().delete(&subject).await?;
    Ok(StatusCode::NO_CONTENT)
}
