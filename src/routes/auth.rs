// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth sign-in routes.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::models::LoginResponse;
use crate::AppState;

/// Cookie binding the issued `state` to the browser that started sign-in.
pub const STATE_COOKIE: &str = "oauth_state";

/// Scope of the state cookie; covers both login and callback.
pub const STATE_COOKIE_PATH: &str = "/auth/google";

const STATE_COOKIE_MINUTES: i64 = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google/login", get(google_login))
        .route("/auth/google/callback", get(google_callback))
}

/// Start OAuth flow - redirect to Google's consent screen.
async fn google_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let request = state
        .google
        .build_authorization_url()
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;

    let cookie = Cookie::build((STATE_COOKIE, request.state))
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax)
        .path(STATE_COOKIE_PATH)
        .max_age(time::Duration::minutes(STATE_COOKIE_MINUTES))
        .build();

    tracing::info!("Starting Google sign-in, redirecting to consent screen");

    Ok((jar.add(cookie), Redirect::temporary(&request.url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code, reconcile the user, issue a session token.
///
/// The state cookie is single-use and cleared whatever the outcome.
async fn google_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let expected_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::build((STATE_COOKIE, "")).path(STATE_COOKIE_PATH));

    match complete_sign_in(&state, expected_state.as_deref(), params).await {
        Ok(body) => (jar, Json(body)).into_response(),
        Err(e) => (jar, e).into_response(),
    }
}

async fn complete_sign_in(
    state: &AppState,
    expected_state: Option<&str>,
    params: CallbackParams,
) -> Result<LoginResponse> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Err(AppError::BadRequest("Authorization was not granted".to_string()));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Code not found".to_string()))?;

    if !state_matches(expected_state, params.state.as_deref()) {
        tracing::warn!("OAuth state missing or mismatched, possible CSRF");
        return Err(AppError::BadRequest("Invalid state parameter".to_string()));
    }

    tracing::info!("Exchanging authorization code for access token");
    let access_token = state.google.exchange_code(&code).await?;
    let profile = state.google.fetch_profile(&access_token).await?;

    let user = state.reconciler.reconcile(&profile).await?;

    let token = state
        .tokens
        .issue(user.id)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    tracing::info!(user_id = user.id, "Google sign-in complete");

    Ok(LoginResponse { user, token })
}

/// Compare the cookie copy of `state` with the one Google echoed back.
fn state_matches(expected: Option<&str>, received: Option<&str>) -> bool {
    match (expected, received) {
        (Some(expected), Some(received)) if !expected.is_empty() => {
            expected.as_bytes().ct_eq(received.as_bytes()).into()
        }
        _ => false,
    }
}
