// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod user;

pub use user::{LoginResponse, NewUser, ProviderProfile, PublicUser, User, UserUpdateRequest};
