// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory user store.

use crate::db::StoreError;
use crate::models::{NewUser, User};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

struct Inner {
    users: DashMap<i64, User>,
    /// Google account ID -> user ID. The entry lock makes create atomic per identity.
    identities: DashMap<String, i64>,
    next_id: AtomicI64,
    writes: AtomicUsize,
}

/// Process-local user store. Clones share the same data.
#[derive(Clone)]
pub struct MemoryDb {
    inner: Arc<Inner>,
}

impl Default for MemoryDb {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDb {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                users: DashMap::new(),
                identities: DashMap::new(),
                next_id: AtomicI64::new(1),
                writes: AtomicUsize::new(0),
            }),
        }
    }

    pub fn find_by_external_id(&self, google_id: &str) -> Option<User> {
        let user_id = *self.inner.identities.get(google_id)?;
        self.get_user(user_id)
    }

    pub fn get_user(&self, user_id: i64) -> Option<User> {
        self.inner.users.get(&user_id).map(|u| u.clone())
    }

    pub fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        match self.inner.identities.entry(new_user.google_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let user_id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
                let user = new_user.into_user(user_id);
                self.inner.users.insert(user_id, user.clone());
                slot.insert(user_id);
                self.inner.writes.fetch_add(1, Ordering::SeqCst);
                Ok(user)
            }
        }
    }

    pub fn update_profile_fields(&self, user: &User) -> Result<(), StoreError> {
        let mut stored = self
            .inner
            .users
            .get_mut(&user.id)
            .ok_or_else(|| StoreError::Backend(format!("User {} does not exist", user.id)))?;
        stored.email = user.email.clone();
        stored.name = user.name.clone();
        stored.picture_url = user.picture_url.clone();
        stored.updated_at = user.updated_at;
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Change only the display name; other fields keep their stored values.
    pub fn update_name(&self, user_id: i64, name: &str, now: DateTime<Utc>) -> Option<User> {
        let mut stored = self.inner.users.get_mut(&user_id)?;
        stored.name = name.to_string();
        stored.updated_at = now;
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Some(stored.clone())
    }

    /// Number of writes performed so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    pub fn user_count(&self) -> usize {
        self.inner.users.len()
    }
}
