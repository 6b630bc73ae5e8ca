// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the local user ID. Nothing is stored
//! server-side; a token stops working when it expires or the secret changes.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Fixed `sub` claim on every session token.
pub const TOKEN_SUBJECT: &str = "user_auth";

/// Session lifetime.
pub const TOKEN_TTL_HOURS: i64 = 24;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Local user ID
    pub user_id: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Always `user_auth`
    pub sub: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad encoding, bad signature, wrong algorithm or expired.
    /// Deliberately carries no detail.
    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Issues and verifies session tokens with a single symmetric secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
    }

    /// Codec with a non-default lifetime. A negative `ttl` mints tokens that
    /// are already expired.
    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        // Only HS256 is accepted; `none` and asymmetric algorithms are refused.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation.sub = Some(TOKEN_SUBJECT.to_string());

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Create a session token for a user.
    pub fn issue(&self, user_id: i64) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            sub: TOKEN_SUBJECT.to_string(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Check a session token and return the user ID it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.user_id)
            .map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "Session token rejected");
                TokenError::InvalidCredential
            })
    }
}
