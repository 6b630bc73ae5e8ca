// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Mind Tips backend: Google sign-in and session authentication.
//!
//! Users sign in through Google's authorization-code flow. The backend keeps
//! one local user per Google account and hands out a signed session token
//! that protected routes check on every request.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::UserDb;
use services::{GoogleOAuthClient, IdentityReconciler, TokenCodec};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: UserDb,
    pub tokens: TokenCodec,
    pub google: GoogleOAuthClient,
    pub reconciler: IdentityReconciler,
}

impl AppState {
    /// Wire the services from one configuration and one user store.
    pub fn new(config: Config, db: UserDb) -> anyhow::Result<Self> {
        let tokens = TokenCodec::new(&config.jwt_secret);
        let google = GoogleOAuthClient::new(&config)?;
        let reconciler = IdentityReconciler::new(db.clone());

        Ok(Self {
            config,
            db,
            tokens,
            google,
            reconciler,
        })
    }
}
