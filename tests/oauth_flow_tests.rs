// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google sign-in flow tests against a fake provider.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use mindtips_auth::models::LoginResponse;
use mindtips_auth::routes::auth::STATE_COOKIE;
use mindtips_auth::services::OAuthError;
use serde_json::json;
use tower::ServiceExt;
use wiremock::{
    matchers::{body_string_contains, header as header_eq, method, path},
    Mock, MockServer, ResponseTemplate,
};

mod common;

const ACCESS_TOKEN: &str = "ya29.test-access-token";

async fn mock_token_success(server: &MockServer, code: &str) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(format!("code={}", code)))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "token_type": "Bearer",
            "expires_in": 3599,
        })))
        .mount(server)
        .await;
}

async fn mock_token_error(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=bad-code"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Malformed auth code.",
        })))
        .mount(server)
        .await;
}

async fn mock_userinfo(server: &MockServer, profile: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header_eq("authorization", format!("Bearer {}", ACCESS_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile))
        .mount(server)
        .await;
}

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

/// Run /auth/google/login and return the state from the cookie it set.
async fn start_login(app: &common::TestApp) -> (Response, String) {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/auth/google/login")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let cookie = set_cookie_headers(&response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{}=", STATE_COOKIE)))
        .expect("login should set the state cookie");
    let state = cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches(&format!("{}=", STATE_COOKIE))
        .to_string();

    (response, state)
}

async fn callback(app: &common::TestApp, query: &str, cookie_state: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(format!("/auth/google/callback?{}", query));
    if let Some(state) = cookie_state {
        builder = builder.header(header::COOKIE, format!("{}={}", STATE_COOKIE, state));
    }
    app.router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_redirects_with_state() {
    let app = common::create_test_app();
    let (response, state) = start_login(&app).await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/auth?"));
    assert!(location.contains(&format!("state={}", state)));
    assert!(location.contains("response_type=code"));
    assert!(location.contains("client_id=test_client_id"));
    assert_eq!(state.len(), 43, "32 bytes of base64url without padding");

    let cookie = set_cookie_headers(&response).remove(0);
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/auth/google"));
    assert!(!cookie.contains("Secure"));
}

#[tokio::test]
async fn test_exchange_bad_code_fails() {
    let server = MockServer::start().await;
    mock_token_error(&server).await;
    let app = common::create_test_app_with_provider(&server.uri());

    let result = app.state.google.exchange_code("bad-code").await;
    assert!(matches!(result, Err(OAuthError::ExchangeFailed(_))));
}

#[tokio::test]
async fn test_exchange_unreachable_provider_fails() {
    // Nothing listens on port 9 (discard); the request fails at connect.
    let app = common::create_test_app_with_provider("http://127.0.0.1:9");

    let result = app.state.google.exchange_code("any-code").await;
    assert!(matches!(result, Err(OAuthError::ExchangeFailed(_))));
}

#[tokio::test]
async fn test_fetch_profile_decodes_fields() {
    let server = MockServer::start().await;
    mock_userinfo(
        &server,
        json!({
            "id": "g-123",
            "email": "a@x.com",
            "verified_email": true,
            "name": "A",
            "picture": "p.png",
        }),
    )
    .await;
    let app = common::create_test_app_with_provider(&server.uri());

    let profile = app.state.google.fetch_profile(ACCESS_TOKEN).await.unwrap();
    assert_eq!(profile.id, "g-123");
    assert_eq!(profile.email, "a@x.com");
    assert_eq!(profile.name, "A");
    assert_eq!(profile.picture, "p.png");
}

#[tokio::test]
async fn test_fetch_profile_malformed_response_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;
    let app = common::create_test_app_with_provider(&server.uri());

    let result = app.state.google.fetch_profile(ACCESS_TOKEN).await;
    assert!(matches!(result, Err(OAuthError::ProfileFetchFailed(_))));
}

#[tokio::test]
async fn test_fetch_profile_rejected_token_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let app = common::create_test_app_with_provider(&server.uri());

    let result = app.state.google.fetch_profile("revoked").await;
    assert!(matches!(result, Err(OAuthError::ProfileFetchFailed(_))));
}

#[tokio::test]
async fn test_callback_full_sign_in() {
    let server = MockServer::start().await;
    mock_token_success(&server, "good-code").await;
    mock_userinfo(
        &server,
        json!({"id": "g-123", "email": "a@x.com", "name": "A", "picture": "p.png"}),
    )
    .await;
    let app = common::create_test_app_with_provider(&server.uri());

    let (_, state) = start_login(&app).await;
    let response = callback(&app, &format!("code=good-code&state={}", state), Some(&state)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The state cookie is single-use.
    let cleared = set_cookie_headers(&response)
        .into_iter()
        .find(|c| c.starts_with(&format!("{}=", STATE_COOKIE)))
        .expect("callback should clear the state cookie");
    assert!(cleared.contains("Max-Age=0"));

    let body = common::json_body(response).await;
    let login: LoginResponse = serde_json::from_value(body).unwrap();
    assert_eq!(login.user.google_id, "g-123");
    assert_eq!(login.user.email, "a@x.com");
    assert_eq!(app.state.tokens.verify(&login.token).unwrap(), login.user.id);

    // The issued token opens protected routes.
    let me = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/user/me")
                .header(header::AUTHORIZATION, format!("Bearer {}", login.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_repeat_sign_in_same_user_no_write() {
    let server = MockServer::start().await;
    mock_token_success(&server, "good-code").await;
    mock_userinfo(
        &server,
        json!({"id": "g-123", "email": "a@x.com", "name": "A", "picture": "p.png"}),
    )
    .await;
    let app = common::create_test_app_with_provider(&server.uri());

    let (_, state) = start_login(&app).await;
    let first = callback(&app, &format!("code=good-code&state={}", state), Some(&state)).await;
    let first: LoginResponse = serde_json::from_value(common::json_body(first).await).unwrap();
    let writes_after_first = app.memory.write_count();

    let (_, state) = start_login(&app).await;
    let second = callback(&app, &format!("code=good-code&state={}", state), Some(&state)).await;
    let second: LoginResponse = serde_json::from_value(common::json_body(second).await).unwrap();

    assert_eq!(first.user, second.user);
    assert_eq!(app.memory.user_count(), 1);
    assert_eq!(app.memory.write_count(), writes_after_first);
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let app = common::create_test_app();
    let (_, state) = start_login(&app).await;

    let response = callback(&app, &format!("state={}", state), Some(&state)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_state_mismatch_is_bad_request() {
    let app = common::create_test_app();
    let (_, state) = start_login(&app).await;

    let response = callback(&app, "code=good-code&state=forged", Some(&state)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_without_state_cookie_is_bad_request() {
    let app = common::create_test_app();
    let (_, state) = start_login(&app).await;

    let response = callback(&app, &format!("code=good-code&state={}", state), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_exchange_failure_is_generic() {
    let server = MockServer::start().await;
    mock_token_error(&server).await;
    let app = common::create_test_app_with_provider(&server.uri());

    let (_, state) = start_login(&app).await;
    let response = callback(&app, &format!("code=bad-code&state={}", state), Some(&state)).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = common::json_body(response).await;
    assert_eq!(body["error"], "sign_in_failed");
    assert!(body.get("details").is_none());
    assert_eq!(app.memory.user_count(), 0);
}

#[tokio::test]
async fn test_callback_provider_error_param() {
    let app = common::create_test_app();
    let (_, state) = start_login(&app).await;

    let response = callback(
        &app,
        &format!("error=access_denied&state={}", state),
        Some(&state),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
