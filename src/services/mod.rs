// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod google;
pub mod reconciler;
pub mod token;

pub use google::{AuthorizationRequest, GoogleEndpoints, GoogleOAuthClient, OAuthError};
pub use reconciler::IdentityReconciler;
pub use token::{TokenCodec, TokenError};
