//! Storage for the logged-in user's identifier.
//!
//! The identifier is set once the login callback lands, read on every
//! protected operation and cleared on logout or auth escalation. A missing
//! identifier means "not logged in".

mod keychain;

use std::sync::RwLock;

use tracing::debug;

use crate::model::UserId;

pub use keychain::KeyringSessionStore;

/// Error type for session storage.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to access keyring.
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    /// The in-memory store lock was poisoned by a panicking writer.
    #[error("Session store lock poisoned")]
    Poisoned,
}

/// Key-value persistence of the current user id.
pub trait SessionStore: Send + Sync {
    /// Remember the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set_user_id(&self, user_id: &UserId) -> Result<(), SessionError>;

    /// The logged-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn user_id(&self) -> Result<Option<UserId>, SessionError>;

    /// Forget the logged-in user. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn clear(&self) -> Result<(), SessionError>;

    /// Whether a user id is stored. Read failures count as logged out.
    fn is_logged_in(&self) -> bool {
        matches!(self.user_id(), Ok(Some(_)))
    }
}

/// Session store that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    user_id: RwLock<Option<UserId>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a user id.
    #[must_use]
    pub fn with_user(user_id: UserId) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn set_user_id(&self, user_id: &UserId) -> Result<(), SessionError> {
        *self.user_id.write().map_err(|_| SessionError::Poisoned)? = Some(user_id.clone());
        debug!("Session set for user {user_id}");
        Ok(())
    }

    fn user_id(&self) -> Result<Option<UserId>, SessionError> {
        Ok(self
            .user_id
            .read()
            .map_err(|_| SessionError::Poisoned)?
            .clone())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.user_id.write().map_err(|_| SessionError::Poisoned)? = None;
        debug!("Session cleared");
        Ok(())
    }
}
