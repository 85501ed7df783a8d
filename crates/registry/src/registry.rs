//! User registry implementation
//!
//! Keeps every registered user in memory, in insertion order, behind a
//! single lock so id assignment and the email uniqueness check stay
//! atomic with the insert.

use crate::errors::*;
use crate::types::*;
use crate::validation::{validate_new_user, validate_user_update};
use parking_lot::RwLock;

/// In-memory user registry
///
/// Ids come from a monotonically increasing counter and are never reused,
/// not even after a delete. All methods take `&self`, so a single instance
/// can be shared behind an `Arc` by every request handler.
#[derive(Debug)]
pub struct UserRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Debug)]
struct RegistryInner {
    /// Registered users, oldest first
    users: Vec<User>,
    /// Next id to hand out; advances only when a registration succeeds
    next_id: u64,
}

impl UserRegistry {
    /// Create an empty registry; the first registered user gets id 1
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                users: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Register a new user
    ///
    /// Field checks run before the uniqueness check, so a payload that is
    /// both invalid and a duplicate reports the field errors. A failed
    /// registration never consumes an id.
    pub fn register(&self, new_user: NewUser) -> Result<User> {
        let errors = validate_new_user(&new_user);
        if !errors.is_empty() {
            return Err(RegistryError::ValidationFailed { errors });
        }

        // Presence of both fields is guaranteed by validation above
        let name = new_user.name.unwrap_or_default();
        let email = new_user.email.unwrap_or_default();

        let mut inner = self.inner.write();
        if inner.users.iter().any(|user| user.email == email) {
            return Err(RegistryError::EmailAlreadyInUse { email });
        }

        let user = User {
            id: inner.next_id,
            name,
            email,
            age: new_user.age,
        };
        inner.next_id += 1;
        inner.users.push(user.clone());

        Ok(user)
    }

    /// List all users in registration order
    pub fn list(&self) -> Vec<User> {
        self.inner.read().users.clone()
    }

    /// Fetch a user by id
    pub fn get(&self, id: u64) -> Result<User> {
        let inner = self.inner.read();
        inner
            .users
            .iter()
            .find(|user| user.id == id)
            .cloned()
            .ok_or(RegistryError::UserNotFound { id })
    }

    /// Apply a partial update to an existing user
    ///
    /// Present fields overwrite the stored values, including `age: 0`;
    /// absent fields are left alone, so a stored age cannot be cleared.
    /// The payload is validated before the lookup, so a bad payload wins
    /// over an unknown id. Email uniqueness is only enforced at
    /// registration time; an update can introduce a duplicate.
    pub fn update(&self, id: u64, update: UserUpdate) -> Result<User> {
        let errors = validate_user_update(&update);
        if !errors.is_empty() {
            return Err(RegistryError::ValidationFailed { errors });
        }

        let mut inner = self.inner.write();
        let user = inner
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(RegistryError::UserNotFound { id })?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(age) = update.age {
            user.age = Some(age);
        }

        Ok(user.clone())
    }

    /// Remove a user by id
    ///
    /// The id stays retired; later registrations keep drawing from the
    /// counter.
    pub fn remove(&self, id: u64) -> Result<()> {
        let mut inner = self.inner.write();
        let index = inner
            .users
            .iter()
            .position(|user| user.id == id)
            .ok_or(RegistryError::UserNotFound { id })?;
        inner.users.remove(index);

        Ok(())
    }

    /// Number of registered users
    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    /// Whether the registry holds no users
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
