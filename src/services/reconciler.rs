// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Maps a Google profile to exactly one local user.
//!
//! First sign-in creates the user. Later sign-ins refresh email, name and
//! picture when Google's copy changed, and write nothing when it did not.

use crate::db::{StoreError, UserDb};
use crate::models::{NewUser, ProviderProfile, User};
use chrono::Utc;

#[derive(Clone)]
pub struct IdentityReconciler {
    db: UserDb,
}

impl IdentityReconciler {
    pub fn new(db: UserDb) -> Self {
        Self { db }
    }

    /// Find or create the local user for a Google profile.
    pub async fn reconcile(&self, profile: &ProviderProfile) -> Result<User, StoreError> {
        match self.db.find_by_external_id(&profile.id).await? {
            Some(user) => self.refresh(user, profile).await,
            None => self.create_or_adopt(profile).await,
        }
    }

    /// Create the user. If a concurrent sign-in won the race, re-read once
    /// and continue with the row it created.
    async fn create_or_adopt(&self, profile: &ProviderProfile) -> Result<User, StoreError> {
        match self
            .db
            .create_user(NewUser::from_profile(profile, Utc::now()))
            .await
        {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Created user on first sign-in");
                Ok(user)
            }
            Err(StoreError::Conflict) => {
                tracing::info!("Concurrent first sign-in detected, re-reading user");
                let user = self
                    .db
                    .find_by_external_id(&profile.id)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Backend("User missing after create conflict".to_string())
                    })?;
                self.refresh(user, profile).await
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh(&self, mut user: User, profile: &ProviderProfile) -> Result<User, StoreError> {
        if !user.diverges_from(profile) {
            return Ok(user);
        }

        user.email = profile.email.clone();
        user.name = profile.name.clone();
        user.picture_url = profile.picture.clone();
        user.updated_at = Utc::now();

        self.db.update_profile_fields(&user).await?;
        tracing::info!(user_id = user.id, "Refreshed user profile from Google");
        Ok(user)
    }
}
