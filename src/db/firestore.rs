// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed user operations.
//!
//! Layout:
//! - `users/{id}`: the user document, keyed by local numeric ID
//! - `identities/{google_id}`: link from Google account to local ID
//!
//! Both are written with create-only inserts. The identity link is the
//! uniqueness constraint: a second insert for the same Google account fails
//! with a conflict instead of producing a second user.

use crate::db::{collections, StoreError};
use crate::models::{NewUser, User};
use chrono::{DateTime, Utc};
use firestore::errors::FirestoreError;
use firestore::paths;
use serde::{Deserialize, Serialize};

/// How many numeric IDs to try before giving up when other instances
/// are claiming IDs at the same time.
const MAX_ID_CLAIM_ATTEMPTS: i64 = 16;

/// Link document in the `identities` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdentityLink {
    user_id: i64,
    google_id: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: firestore::FirestoreDb,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Backend(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by local ID.
    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        self.client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(backend)
    }

    /// Get the user linked to a Google account.
    pub async fn find_by_external_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        let link: Option<IdentityLink> = self
            .client
            .fluent()
            .select()
            .by_id_in(collections::IDENTITIES)
            .obj()
            .one(&identity_doc_id(google_id))
            .await
            .map_err(backend)?;

        let Some(link) = link else {
            return Ok(None);
        };

        match self.get_user(link.user_id).await? {
            Some(user) => Ok(Some(user)),
            None => Err(StoreError::Backend(format!(
                "Identity link points at missing user {}",
                link.user_id
            ))),
        }
    }

    /// Create a user: claim a fresh numeric ID, then link the Google account.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let user = self.claim_user_id(new_user).await?;

        let link = IdentityLink {
            user_id: user.id,
            google_id: user.google_id.clone(),
        };

        let inserted: Result<IdentityLink, FirestoreError> = self
            .client
            .fluent()
            .insert()
            .into(collections::IDENTITIES)
            .document_id(identity_doc_id(&user.google_id))
            .object(&link)
            .execute()
            .await;

        match inserted {
            Ok(_) => {
                tracing::debug!(user_id = user.id, "User document and identity link created");
                Ok(user)
            }
            Err(e) => {
                // Release the claimed ID; the identity belongs to someone else
                // or the link write failed outright.
                self.delete_user_doc(user.id).await;
                match e {
                    FirestoreError::DataConflictError(_) => Err(StoreError::Conflict),
                    other => Err(backend(other)),
                }
            }
        }
    }

    /// Overwrite the user document with new profile fields.
    pub async fn update_profile_fields(&self, user: &User) -> Result<(), StoreError> {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(backend)?;
        Ok(())
    }

    /// Write only `name` and `updated_at`, leaving profile fields owned by
    /// sign-in untouched.
    pub async fn update_name(
        &self,
        user_id: i64,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let Some(mut user) = self.get_user(user_id).await? else {
            return Ok(None);
        };
        user.name = name.to_string();
        user.updated_at = now;

        let updated: User = self
            .client
            .fluent()
            .update()
            .fields(paths!(User::{name, updated_at}))
            .in_col(collections::USERS)
            .document_id(user_id.to_string())
            .object(&user)
            .execute()
            .await
            .map_err(backend)?;
        Ok(Some(updated))
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Insert the user document under the next free numeric ID.
    async fn claim_user_id(&self, new_user: NewUser) -> Result<User, StoreError> {
        let first_candidate = self.max_user_id().await? + 1;

        for candidate in first_candidate..first_candidate + MAX_ID_CLAIM_ATTEMPTS {
            let user = new_user.clone().into_user(candidate);

            let inserted: Result<User, FirestoreError> = self
                .client
                .fluent()
                .insert()
                .into(collections::USERS)
                .document_id(candidate.to_string())
                .object(&user)
                .execute()
                .await;

            match inserted {
                Ok(_) => return Ok(user),
                Err(FirestoreError::DataConflictError(_)) => {
                    tracing::debug!(candidate, "User ID taken, trying next");
                }
                Err(e) => return Err(backend(e)),
            }
        }

        Err(StoreError::Backend(format!(
            "Could not claim a user ID after {} attempts",
            MAX_ID_CLAIM_ATTEMPTS
        )))
    }

    /// Highest user ID in use, or 0 when there are no users.
    async fn max_user_id(&self) -> Result<i64, StoreError> {
        let top: Vec<User> = self
            .client
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("id", firestore::FirestoreQueryDirection::Descending)])
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(backend)?;

        Ok(top.first().map(|u| u.id).unwrap_or(0))
    }

    async fn delete_user_doc(&self, user_id: i64) {
        let result = self
            .client
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id.to_string())
            .execute()
            .await;

        if let Err(e) = result {
            tracing::error!(user_id, error = %e, "Failed to release claimed user ID");
        }
    }
}

/// Google IDs are numeric today, but encode anyway so a `/` can never
/// escape the collection.
fn identity_doc_id(google_id: &str) -> String {
    urlencoding::encode(google_id).into_owned()
}

fn backend(e: FirestoreError) -> StoreError {
    StoreError::Backend(e.to_string())
}
