//! # actionbot-core
//!
//! Orchestration layer for the `ActionBot` email triage client.
//!
//! This crate provides:
//! - Domain models (messages, categories, classifications, drafts)
//! - **Classification Pipeline** - batch-bounded concurrent classification of a whole inbox
//! - **Category Filter** - per-category counts and single-category filtering
//! - **Reply Workflow** - draft generation, editing and sending for the selected message
//! - **Auth Escalation** - session teardown when the backend reports revoked access
//! - Session storage (memory or system keyring) and settings
//!
//! Classification itself happens in the backend; this crate only decides
//! when to ask, how many requests are in flight, and what to do with the
//! answers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod escalation;
pub mod filter;
pub mod inbox;
pub mod model;
pub mod pipeline;
pub mod reply;
pub mod service;
pub mod session;
pub mod settings;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use escalation::{AUTH_ERROR_KEYWORDS, AuthEscalation, ErrorSignature, Redirect, is_auth_error};
pub use filter::{CategoryCount, CategoryFilter, filtered_messages, summarize};
pub use inbox::{InboxOptions, InboxSession, SelectedMessage};
pub use model::{
    Category, Classification, DraftReply, MessageDetail, MessageId, MessageSummary, ThreadId,
    UserId,
};
pub use pipeline::{
    ClassificationFailure, ClassificationIndex, ClassificationPipeline, DEFAULT_BATCH_SIZE,
    PipelineEvent, PipelineRun, RunId, RunReport,
};
pub use reply::{Notice, ReplyError, ReplyState, ReplyTicket, ReplyWorkflow, SendCompletion};
pub use service::TriageBackend;
pub use session::{KeyringSessionStore, MemorySessionStore, SessionError, SessionStore};
pub use settings::{SessionBackend, Settings};

pub use actionbot_api::{ApiClient, ApiError, UserProfile};
