// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::Response;
use mindtips_auth::config::Config;
use mindtips_auth::db::{FirestoreDb, MemoryDb, UserDb};
use mindtips_auth::routes::create_router;
use mindtips_auth::services::GoogleEndpoints;
use mindtips_auth::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_firestore() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test app handles.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    pub memory: MemoryDb,
}

/// Create a test app backed by the in-memory store.
#[allow(dead_code)]
pub fn create_test_app() -> TestApp {
    build_app(None)
}

/// Create a test app whose Google client talks to a fake provider at `base_url`.
#[allow(dead_code)]
pub fn create_test_app_with_provider(base_url: &str) -> TestApp {
    build_app(Some(GoogleEndpoints {
        auth_url: format!("{}/auth", base_url),
        token_url: format!("{}/token", base_url),
        userinfo_url: format!("{}/userinfo", base_url),
    }))
}

fn build_app(endpoints: Option<GoogleEndpoints>) -> TestApp {
    let memory = MemoryDb::new();
    let mut state = AppState::new(Config::test_default(), UserDb::Memory(memory.clone()))
        .expect("Failed to build app state");

    if let Some(endpoints) = endpoints {
        state.google = state.google.clone().with_endpoints(endpoints);
    }

    let state = Arc::new(state);
    TestApp {
        router: create_router(state.clone()),
        state,
        memory,
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
