//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Backend request failed.
    #[error("Backend error: {0}")]
    Api(#[from] actionbot_api::ApiError),

    /// Session storage failed.
    #[error("Session error: {0}")]
    Session(#[from] crate::session::SessionError),

    /// Reply workflow rejected an operation.
    #[error("Reply error: {0}")]
    Reply(#[from] crate::reply::ReplyError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No user is logged in.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The backend revoked access; the session has been torn down.
    #[error("Access revoked, please log in again")]
    AccessRevoked,

    /// An operation needed a selected message but none is selected.
    #[error("No message selected")]
    NoSelection,

    /// A message id is not part of the current inbox.
    #[error("Message not found: {0}")]
    UnknownMessage(String),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
