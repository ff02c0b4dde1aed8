//! Turning backend auth failures into a forced logout.
//!
//! Any component that talks to the backend hands its transport errors to
//! [`AuthEscalation::inspect`]. When the error means the user's access is
//! gone, the stored session is cleared and every subscriber is told to go
//! back to the welcome screen.

use std::fmt;
use std::sync::Arc;

use actionbot_api::ApiError;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::session::{SessionError, SessionStore};

/// Words that mark an error message as an authentication failure.
///
/// Matched case-insensitively as substrings of the error's message and
/// description.
pub const AUTH_ERROR_KEYWORDS: [&str; 11] = [
    "token",
    "unauthorized",
    "unauthenticated",
    "access denied",
    "invalid credentials",
    "authentication",
    "permission",
    "revoked",
    "re-authenticate",
    "expired",
    "invalid_grant",
];

/// The parts of an error that decide whether it is an auth failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSignature {
    /// HTTP status, if the error carried one.
    pub status: Option<u16>,
    /// Primary message.
    pub message: Option<String>,
    /// Secondary description.
    pub description: Option<String>,
}

impl From<&ApiError> for ErrorSignature {
    fn from(err: &ApiError) -> Self {
        Self {
            status: err.status(),
            message: err.message(),
            description: err.description().map(ToString::to_string),
        }
    }
}

/// Whether an error means the user is no longer authorized.
///
/// 401 and 403 always count. Other errors count when their text contains one
/// of [`AUTH_ERROR_KEYWORDS`].
#[must_use]
pub fn is_auth_error(signature: &ErrorSignature) -> bool {
    if matches!(signature.status, Some(401 | 403)) {
        return true;
    }

    [&signature.message, &signature.description]
        .into_iter()
        .flatten()
        .map(|text| text.to_lowercase())
        .any(|text| AUTH_ERROR_KEYWORDS.iter().any(|keyword| text.contains(keyword)))
}

/// Where the presentation layer should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Back to the login screen.
    Welcome {
        /// Whether the user was logged out because access was revoked.
        access_revoked: bool,
    },
}

/// Process-wide escalation point for auth failures.
///
/// Clones share the same session store and redirect channel.
#[derive(Clone)]
pub struct AuthEscalation {
    session: Arc<dyn SessionStore>,
    redirect: Arc<watch::Sender<Option<Redirect>>>,
}

impl fmt::Debug for AuthEscalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEscalation")
            .field("redirect", &*self.redirect.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthEscalation {
    /// Create an escalation point over a session store.
    #[must_use]
    pub fn new(session: Arc<dyn SessionStore>) -> Self {
        let (redirect, _) = watch::channel(None);
        Self {
            session,
            redirect: Arc::new(redirect),
        }
    }

    /// The session store this escalation point clears.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Receive every redirect published from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Redirect>> {
        self.redirect.subscribe()
    }

    /// Last redirect published, if any.
    #[must_use]
    pub fn current(&self) -> Option<Redirect> {
        *self.redirect.borrow()
    }

    /// Check an error and log the user out if it is an auth failure.
    ///
    /// Returns whether the error escalated.
    pub fn inspect(&self, err: &ApiError) -> bool {
        if !is_auth_error(&ErrorSignature::from(err)) {
            return false;
        }

        warn!("Backend rejected credentials, ending session: {err}");
        if let Err(e) = self.session.clear() {
            error!("Failed to clear session after auth failure: {e}");
        }
        self.redirect.send_replace(Some(Redirect::Welcome {
            access_revoked: true,
        }));
        true
    }

    /// Log out on the user's request.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be cleared.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.session.clear()?;
        info!("User logged out");
        self.redirect.send_replace(Some(Redirect::Welcome {
            access_revoked: false,
        }));
        Ok(())
    }
}
