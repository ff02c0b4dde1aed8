//! Session persistence in the system keyring.
//!
//! Uses the platform's native credential storage:
//! - Linux: Secret Service (GNOME Keyring, `KWallet`)
//! - macOS: Keychain
//! - Windows: Credential Manager

use keyring::Entry;
use tracing::{debug, warn};

use super::{SessionError, SessionStore};
use crate::model::UserId;

/// Service name used for keyring entries.
const SERVICE_NAME: &str = "actionbot";

/// Entry name under which the user id is stored.
const USER_ID_ENTRY: &str = "user_id";

/// Session store backed by the system keyring, surviving restarts.
#[derive(Debug, Clone)]
pub struct KeyringSessionStore {
    service: String,
    entry: String,
}

impl Default for KeyringSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringSessionStore {
    /// Store under the default service name.
    #[must_use]
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Store under a custom service name (useful to isolate profiles).
    #[must_use]
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entry: USER_ID_ENTRY.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry, SessionError> {
        Ok(Entry::new(&self.service, &self.entry)?)
    }
}

impl SessionStore for KeyringSessionStore {
    fn set_user_id(&self, user_id: &UserId) -> Result<(), SessionError> {
        self.entry()?.set_password(user_id.as_str())?;
        debug!("Stored session for user {user_id} in keyring");
        Ok(())
    }

    fn user_id(&self) -> Result<Option<UserId>, SessionError> {
        match self.entry()?.get_password() {
            Ok(id) if id.is_empty() => Ok(None),
            Ok(id) => Ok(Some(UserId::new(id))),
            Err(keyring::Error::NoEntry) => {
                debug!("No session found in keyring");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), SessionError> {
        match self.entry()?.delete_credential() {
            Ok(()) => {
                debug!("Deleted session from keyring");
                Ok(())
            }
            Err(keyring::Error::NoEntry) => {
                debug!("No session to delete from keyring");
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete session from keyring: {e}");
                Err(e.into())
            }
        }
    }
}
