//! # actionbot-api
//!
//! Typed HTTP adapter for the ActionBot triage backend.
//!
//! The backend owns the mailbox and the inference model. This crate only
//! speaks its HTTP contract and normalizes the responses into stable shapes:
//!
//! - **Auth**: login URL discovery and user profile lookup
//! - **Inbox**: message listing
//! - **Classification**: per-message category, action and justification
//! - **Replies**: AI draft generation and sending
//!
//! ## Example
//!
//! ```ignore
//! use actionbot_api::ApiClient;
//!
//! let client = ApiClient::new("http://localhost:3000")?;
//! let messages = client.list_messages("user-123").await?;
//!
//! for message in &messages {
//!     let classification = client.fetch_classification("user-123", &message.id).await?;
//!     println!("{}: {:?}", message.subject, classification.category);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
pub mod types;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use error::{ApiError, Result};
pub use types::{EmailListItem, FetchedClassification, ReplyDraft, SendReceipt, UserProfile};
