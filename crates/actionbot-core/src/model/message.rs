//! Message, classification and draft models.

use std::fmt;

use actionbot_api::{EmailListItem, FetchedClassification};
use serde::{Deserialize, Serialize};

use super::Category;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Provider identifier of a message.
    MessageId
);
string_id!(
    /// Provider identifier of a thread.
    ThreadId
);
string_id!(
    /// Backend identifier of the logged-in user.
    UserId
);

/// One message of the inbox listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    /// Unique identifier.
    pub id: MessageId,
    /// Thread the message belongs to.
    pub thread_id: ThreadId,
    /// Subject line.
    pub subject: String,
    /// Sender.
    pub from: String,
    /// Date as sent by the provider.
    pub date: String,
    /// Preview of the body.
    pub snippet: String,
}

impl From<EmailListItem> for MessageSummary {
    fn from(item: EmailListItem) -> Self {
        Self {
            id: MessageId(item.id),
            thread_id: ThreadId(item.thread_id),
            subject: item.subject,
            from: item.from,
            date: item.date,
            snippet: item.snippet,
        }
    }
}

/// Category the classifier assigned to one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Classified message.
    pub message_id: MessageId,
    /// Normalized category.
    pub category: Category,
    /// Suggested action.
    pub action: Option<String>,
    /// Model justification.
    pub justification: Option<String>,
}

impl Classification {
    /// Build a classification from a backend answer.
    ///
    /// Returns `None` when the backend produced no category: such a message
    /// stays unclassified rather than landing in [`Category::Other`].
    #[must_use]
    pub fn from_fetched(message_id: MessageId, fetched: &FetchedClassification) -> Option<Self> {
        let label = fetched.category.as_deref()?;
        Some(Self {
            message_id,
            category: Category::parse(label),
            action: fetched.action.clone(),
            justification: fetched.justification.clone(),
        })
    }
}

/// A message opened for reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDetail {
    /// Listing entry, with the snippet replaced by the fuller text when available.
    pub summary: MessageSummary,
    /// Full body, if the backend sent one.
    pub body: Option<String>,
    /// Classification returned alongside the body.
    pub classification: Option<Classification>,
}

impl MessageDetail {
    /// Merge a listing entry with the backend's detail answer.
    #[must_use]
    pub fn from_fetched(summary: MessageSummary, fetched: FetchedClassification) -> Self {
        let classification = Classification::from_fetched(summary.id.clone(), &fetched);
        let mut summary = summary;
        if let Some(text) = fetched.body.clone().or(fetched.snippet) {
            summary.snippet = text;
        }

        Self {
            summary,
            body: fetched.body,
            classification,
        }
    }
}

/// Editable AI-generated reply for the selected message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftReply {
    /// Message being answered.
    pub message_id: MessageId,
    /// Current draft text.
    pub text: String,
    /// Subject the backend will use for the reply.
    pub subject_echo: String,
}
