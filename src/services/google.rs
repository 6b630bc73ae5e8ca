// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth client for the authorization-code sign-in flow.
//!
//! Handles:
//! - Building the consent redirect with a random `state`
//! - Exchanging the returned code for an access token
//! - Fetching the signed-in user's profile
//!
//! Provider calls are made once with a bounded timeout and never retried.

use crate::config::Config;
use crate::models::ProviderProfile;
use anyhow::Context;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Random bytes in each `state` value.
pub const STATE_BYTES: usize = 32;

/// Scopes requested at consent: stable identity, email and profile.
pub const SCOPES: [&str; 3] = [
    "openid",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    #[error("Could not build authorization URL: {0}")]
    AuthorizationUrl(String),
}

/// Provider endpoints. Overridable so tests can point at a fake provider.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

/// Consent redirect plus the `state` the callback must echo back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// Token endpoint response. Only the access token is used.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    endpoints: GoogleEndpoints,
    rng: SystemRandom,
}

impl GoogleOAuthClient {
    /// Create a client from the startup configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building OAuth HTTP client")?;

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_url: config.google_redirect_url.clone(),
            endpoints: GoogleEndpoints::default(),
            rng: SystemRandom::new(),
        })
    }

    /// Point the client at different provider endpoints.
    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Build the consent URL with a fresh, unguessable `state`.
    pub fn build_authorization_url(&self) -> Result<AuthorizationRequest, OAuthError> {
        let state = self.generate_state()?;
        let scope = SCOPES.join(" ");

        let url = reqwest::Url::parse_with_params(
            &self.endpoints.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state.as_str()),
            ],
        )
        .map_err(|e| OAuthError::AuthorizationUrl(e.to_string()))?;

        Ok(AuthorizationRequest {
            url: url.into(),
            state,
        })
    }

    /// Exchange an authorization code for a provider access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::ExchangeFailed(format!("HTTP {}: {}", status, body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::ExchangeFailed(format!("JSON parse error: {}", e)))?;

        Ok(token.access_token)
    }

    /// Fetch the profile of the user the access token belongs to.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<ProviderProfile, OAuthError> {
        let response = self
            .http
            .get(&self.endpoints.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                OAuthError::ProfileFetchFailed(format!("Userinfo request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::ProfileFetchFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let profile: ProviderProfile = response
            .json()
            .await
            .map_err(|e| OAuthError::ProfileFetchFailed(format!("JSON parse error: {}", e)))?;

        if profile.id.trim().is_empty() {
            return Err(OAuthError::ProfileFetchFailed(
                "profile has no account id".to_string(),
            ));
        }

        Ok(profile)
    }

    fn generate_state(&self) -> Result<String, OAuthError> {
        let mut bytes = [0u8; STATE_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| OAuthError::AuthorizationUrl("system RNG failure".to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}
