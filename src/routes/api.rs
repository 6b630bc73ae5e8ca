// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile API routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{PublicUser, User, UserUpdateRequest};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Extension, Json, Router,
};
use std::sync::Arc;
use validator::Validate;

/// Routes anyone may call.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/{id}", get(get_public_user))
}

/// Routes for the signed-in user.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/user/me", get(get_me).put(update_me))
}

// ─── Public Profiles ─────────────────────────────────────────

/// Public view of another user. Never includes the email.
async fn get_public_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>> {
    let user_id: i64 = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid user ID".to_string()))?;

    let user = state
        .db
        .get_public_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

    Ok(Json(user))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(profile))
}

/// Update current user's display name.
async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    body: std::result::Result<Json<UserUpdateRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let Json(request) = body.map_err(|_| AppError::BadRequest("Invalid JSON".to_string()))?;

    request
        .validate()
        .map_err(|_| AppError::BadRequest("Name must be 1 to 255 characters".to_string()))?;

    let updated = state
        .db
        .update_name(user.user_id, &request.name, chrono::Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    tracing::info!(user_id = user.user_id, "User updated display name");

    Ok(Json(updated))
}
