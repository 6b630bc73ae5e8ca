//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Local user record. One per distinct Google account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Local numeric ID (also used as document ID)
    pub id: i64,
    pub email: String,
    pub name: String,
    /// Google account ID; set on creation and never changed
    pub google_id: String,
    pub picture_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// True when the provider's copy of a mutable field differs from ours.
    pub fn diverges_from(&self, profile: &ProviderProfile) -> bool {
        self.email != profile.email
            || self.name != profile.name
            || self.picture_url != profile.picture
    }
}

/// Fields needed to create a user; the store assigns the ID.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub google_id: String,
    pub picture_url: String,
    pub now: DateTime<Utc>,
}

impl NewUser {
    pub fn from_profile(profile: &ProviderProfile, now: DateTime<Utc>) -> Self {
        Self {
            email: profile.email.clone(),
            name: profile.name.clone(),
            google_id: profile.id.clone(),
            picture_url: profile.picture.clone(),
            now,
        }
    }

    pub fn into_user(self, id: i64) -> User {
        User {
            id,
            email: self.email,
            name: self.name,
            google_id: self.google_id,
            picture_url: self.picture_url,
            created_at: self.now,
            updated_at: self.now,
        }
    }
}

/// Profile returned by Google's userinfo endpoint. Transient; never stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

/// What other users may see about a user. Never includes the email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub picture_url: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            picture_url: user.picture_url.clone(),
        }
    }
}

/// Body returned by the OAuth callback.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// Self-service profile edit.
#[derive(Debug, Deserialize, Validate)]
pub struct UserUpdateRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
}
