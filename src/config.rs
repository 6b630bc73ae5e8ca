// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The configuration is read once at startup and passed explicitly into the
//! services that need it. Nothing here is global.

use std::env;

/// Signing secret used when `JWT_SECRET` is not set outside production.
pub const DEV_JWT_SECRET: &str = "your-default-secret-key-change-in-production";

/// Callback URL used when `GOOGLE_REDIRECT_URL` is not set outside production.
pub const DEV_REDIRECT_URL: &str = "http://localhost:8080/auth/google/callback";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Google OAuth client ID (public)
    pub google_client_id: String,
    /// Where Google sends the browser back after consent
    pub google_redirect_url: String,
    /// GCP project holding the Firestore database; `None` selects the in-memory store
    pub gcp_project_id: Option<String>,
    /// Server port
    pub port: u16,
    /// True when `APP_ENV=production`
    pub production: bool,

    // --- Secrets ---
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// HMAC key for session tokens (raw bytes)
    pub jwt_secret: Vec<u8>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Outside production, missing values fall back to development defaults.
    /// In production every secret must be present and the signing secret must
    /// not be the development default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let production = env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let config = Self {
            google_client_id: read_var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_redirect_url: read_var("GOOGLE_REDIRECT_URL")
                .unwrap_or_else(|| DEV_REDIRECT_URL.to_string()),
            gcp_project_id: read_var("GCP_PROJECT_ID"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", "not a valid port number"))?,
            production,
            google_client_secret: read_var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            jwt_secret: read_var("JWT_SECRET")
                .unwrap_or_else(|| DEV_JWT_SECRET.to_string())
                .into_bytes(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that must not serve traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET", "must not be empty"));
        }

        if !self.production {
            if self.jwt_secret == DEV_JWT_SECRET.as_bytes() {
                tracing::warn!("JWT_SECRET not set, using development default");
            }
            return Ok(());
        }

        if self.jwt_secret == DEV_JWT_SECRET.as_bytes() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.google_client_id.is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_ID"));
        }
        if self.google_client_secret.is_empty() {
            return Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET"));
        }
        if !self.google_redirect_url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "GOOGLE_REDIRECT_URL",
                "must use https in production",
            ));
        }
        // The in-memory store restarts IDs at 1, so old tokens would map to new users.
        if self.gcp_project_id.is_none() {
            return Err(ConfigError::Missing("GCP_PROJECT_ID"));
        }
        Ok(())
    }

    /// Whether cookies set by the sign-in flow need the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.google_redirect_url.starts_with("https://")
    }

    /// Isolated configuration for tests.
    pub fn test_default() -> Self {
        Self {
            google_client_id: "test_client_id".to_string(),
            google_redirect_url: DEV_REDIRECT_URL.to_string(),
            gcp_project_id: None,
            port: 8080,
            production: false,
            google_client_secret: "test_secret".to_string(),
            jwt_secret: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }
}

/// Read a variable, treating empty and whitespace-only values as unset.
fn read_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors. Any of these is fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
