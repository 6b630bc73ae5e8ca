//! Database layer (Firestore, or in-memory for tests and local dev).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::models::{NewUser, PublicUser, User};
use chrono::{DateTime, Utc};

/// Collection names as constants.
pub mod collections {
    /// User documents keyed by local numeric ID
    pub const USERS: &str = "users";
    /// Google account ID -> local user ID (create-only)
    pub const IDENTITIES: &str = "identities";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A user for this Google account was created concurrently.
    #[error("User for this identity already exists")]
    Conflict,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// User storage. Every backend keeps at most one user per Google account.
#[derive(Clone)]
pub enum UserDb {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl UserDb {
    /// Connect to Firestore when a project is configured, otherwise keep users in memory.
    pub async fn connect(project_id: Option<&str>) -> Result<Self, StoreError> {
        match project_id {
            Some(project) => Ok(UserDb::Firestore(FirestoreDb::new(project).await?)),
            None => {
                tracing::warn!("GCP_PROJECT_ID not set, users are kept in memory");
                Ok(UserDb::Memory(MemoryDb::new()))
            }
        }
    }

    pub async fn find_by_external_id(&self, google_id: &str) -> Result<Option<User>, StoreError> {
        match self {
            UserDb::Firestore(db) => db.find_by_external_id(google_id).await,
            UserDb::Memory(db) => Ok(db.find_by_external_id(google_id)),
        }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        match self {
            UserDb::Firestore(db) => db.get_user(user_id).await,
            UserDb::Memory(db) => Ok(db.get_user(user_id)),
        }
    }

    pub async fn get_public_user(&self, user_id: i64) -> Result<Option<PublicUser>, StoreError> {
        Ok(self.get_user(user_id).await?.as_ref().map(PublicUser::from))
    }

    /// Insert a new user. Fails with [`StoreError::Conflict`] if the Google
    /// account already has one.
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        match self {
            UserDb::Firestore(db) => db.create_user(new_user).await,
            UserDb::Memory(db) => db.create_user(new_user),
        }
    }

    /// Write email, name, picture and updated_at of an existing user in one write.
    pub async fn update_profile_fields(&self, user: &User) -> Result<(), StoreError> {
        match self {
            UserDb::Firestore(db) => db.update_profile_fields(user).await,
            UserDb::Memory(db) => db.update_profile_fields(user),
        }
    }

    /// Change a user's display name. Returns `None` if the user does not exist.
    ///
    /// Only `name` and `updated_at` are written, so a concurrent sign-in
    /// refresh of email or picture is not overwritten.
    pub async fn update_name(
        &self,
        user_id: i64,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        match self {
            UserDb::Firestore(db) => db.update_name(user_id, name, now).await,
            UserDb::Memory(db) => Ok(db.update_name(user_id, name, now)),
        }
    }
}
