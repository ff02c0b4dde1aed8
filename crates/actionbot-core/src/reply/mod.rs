//! Reply drafting and sending for the selected message.
//!
//! ```text
//! Idle ──begin_generate──▶ Generating ──ok──▶ Drafted ──begin_send──▶ Sending ──ok──▶ Sent
//!  ▲                           │                ▲                       │
//!  └──────────err──────────────┘                └──────────err──────────┘
//! ```
//!
//! Backend failures never reach the user verbatim: they are logged and
//! replaced by a generic [`Notice`]. A failed send keeps the draft so the
//! user can retry.

mod workflow;

use std::fmt;
use std::time::Duration;

use actionbot_api::ApiError;

use crate::model::MessageId;

pub use workflow::ReplyWorkflow;

/// Notice shown when a draft could not be generated.
pub const GENERATE_FAILED: &str = "Failed to generate reply. Please try again.";

/// Notice shown after a reply went out.
pub const SEND_SUCCEEDED: &str = "Reply sent successfully!";

/// Notice shown when a reply could not be sent.
pub const SEND_FAILED: &str = "Failed to send reply. Please try again.";

/// How long the success notice stays up before the caller moves on.
pub const DEFAULT_SEND_COMPLETE_DELAY: Duration = Duration::from_millis(1500);

/// Where the reply of the selected message stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyState {
    /// Nothing drafted yet.
    #[default]
    Idle,
    /// Waiting for the backend to draft a reply.
    Generating,
    /// A draft is ready for editing.
    Drafted,
    /// Waiting for the backend to send the draft.
    Sending,
    /// The reply went out.
    Sent,
}

impl ReplyState {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Drafted => "drafted",
            Self::Sending => "sending",
            Self::Sent => "sent",
        }
    }

    /// Whether a backend request is outstanding.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Generating | Self::Sending)
    }
}

impl fmt::Display for ReplyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing outcome message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Something went well.
    Success(String),
    /// Something failed.
    Error(String),
}

impl Notice {
    /// The text to display.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Error(text) => text,
        }
    }

    /// Whether this notice reports a failure.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Proof that a transition was started, needed to complete it.
///
/// A ticket goes stale once the workflow moves on (another transition
/// starts, the draft is cleared, or it belongs to a different message).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTicket {
    message_id: MessageId,
    epoch: u64,
}

impl ReplyTicket {
    /// Message the transition was started for.
    #[must_use]
    pub const fn message_id(&self) -> &MessageId {
        &self.message_id
    }
}

/// What the caller should do once a send finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendCompletion {
    /// The reply went out and the notice was displayed; refresh the inbox
    /// and deselect the message.
    Completed,
}

/// Errors from the reply workflow.
#[derive(Debug, thiserror::Error)]
pub enum ReplyError {
    /// The operation is not allowed in the current state.
    #[error("cannot {action} while {from}")]
    InvalidTransition {
        /// State the workflow was in.
        from: ReplyState,
        /// Operation that was attempted.
        action: &'static str,
    },

    /// The draft is empty once whitespace is removed.
    #[error("reply text is empty")]
    EmptyDraft,

    /// The ticket belongs to a transition that was superseded.
    #[error("reply operation is no longer current")]
    Stale,

    /// The backend call failed.
    #[error("reply request failed: {0}")]
    Backend(ApiError),
}

impl ReplyError {
    /// The transport error behind this failure, if any.
    #[must_use]
    pub const fn backend_error(&self) -> Option<&ApiError> {
        match self {
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}
