//! Request and response types for the backend HTTP contract.
//!
//! Public types are the normalized shapes handed to callers. The private
//! `*Response` types mirror what the backend actually sends and are only
//! used for deserialization.

use serde::{Deserialize, Serialize};

/// One entry of the inbox listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailListItem {
    /// Provider message identifier.
    pub id: String,
    /// Provider thread identifier.
    #[serde(default)]
    pub thread_id: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Sender as displayed by the provider.
    #[serde(default)]
    pub from: String,
    /// Date header as sent by the provider.
    #[serde(default)]
    pub date: String,
    /// Short preview of the body.
    #[serde(default)]
    pub snippet: String,
}

/// Normalized classification of one message.
///
/// `category` is kept exactly as the backend sent it. A missing category
/// means the message is unclassified; mapping unknown labels to a default
/// bucket is the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedClassification {
    /// Category label, if the model produced one.
    pub category: Option<String>,
    /// Suggested action.
    pub action: Option<String>,
    /// Model justification for the category.
    pub justification: Option<String>,
    /// Full message body, when the backend includes it.
    pub body: Option<String>,
    /// Message snippet, when the backend includes it.
    pub snippet: Option<String>,
}

/// AI-generated reply draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyDraft {
    /// Draft body text (empty if the backend returned none).
    pub text: String,
    /// Subject line the reply will carry.
    pub subject: String,
    /// Message the draft answers.
    pub message_id: String,
}

/// Acknowledgement of a sent reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    /// Optional backend message.
    pub message: Option<String>,
}

/// Profile of the logged-in user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Avatar URL.
    #[serde(default)]
    pub picture: Option<String>,
}

/// `GET /auth/login`
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub url: String,
}

/// `GET /gmail/list/{user}`
#[derive(Debug, Deserialize)]
pub(crate) struct ListEmailsResponse {
    #[serde(default)]
    pub messages: Option<Vec<EmailListItem>>,
}

impl ListEmailsResponse {
    pub(crate) fn into_messages(self) -> Vec<EmailListItem> {
        self.messages.unwrap_or_default()
    }
}

/// Classification fields, in either the nested or the flattened response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ClassificationPayload {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub justification: Option<String>,
}

impl ClassificationPayload {
    /// `category` when it carries a label, `classification` otherwise.
    fn take_label(&mut self) -> Option<String> {
        non_blank(self.category.take()).or_else(|| non_blank(self.classification.take()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessagePayload {
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// `GET /gmail/fetch/{user}/{message}`
///
/// Two shapes are accepted: `{result: {category, ...}, message: {body, ...}}`
/// and the flattened `{category, classification, action, justification,
/// body}`. The nested `result` wins when both are present, and `category`
/// wins over `classification` unless it is null or blank.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FetchEmailResponse {
    #[serde(default)]
    pub result: Option<ClassificationPayload>,
    #[serde(default)]
    pub message: Option<MessagePayload>,
    #[serde(flatten)]
    pub flat: ClassificationPayload,
    #[serde(default)]
    pub body: Option<String>,
}

impl FetchEmailResponse {
    pub(crate) fn normalize(self) -> FetchedClassification {
        let mut flat = self.flat;
        let (category, action, justification) = match self.result {
            Some(mut result) => (
                result.take_label().or_else(|| flat.take_label()),
                result.action.or(flat.action),
                result.justification.or(flat.justification),
            ),
            None => (flat.take_label(), flat.action, flat.justification),
        };
        let message = self.message.unwrap_or_default();

        FetchedClassification {
            category,
            action: non_blank(action),
            justification: non_blank(justification),
            body: non_blank(message.body.or(self.body)),
            snippet: non_blank(message.snippet),
        }
    }
}

/// `POST /gmail/reply/{user}/{message}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReplyResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub reply_draft: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ReplyResponse {
    pub(crate) fn normalize(self, requested_id: &str) -> ReplyDraft {
        ReplyDraft {
            text: self.reply_draft.unwrap_or_default(),
            subject: self.subject.unwrap_or_default(),
            message_id: self
                .message_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| requested_id.to_string()),
        }
    }
}

/// Body of `POST /gmail/send/{user}/{message}`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendRequest<'a> {
    pub reply_text: &'a str,
}

/// `POST /gmail/send/{user}/{message}`
#[derive(Debug, Deserialize)]
pub(crate) struct SendResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

const fn default_success() -> bool {
    true
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
