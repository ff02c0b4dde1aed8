//! The backend collaborator contract and its HTTP implementation.

use actionbot_api::{
    ApiClient, ApiError, FetchedClassification, ReplyDraft, SendReceipt, UserProfile,
};
use async_trait::async_trait;

use crate::model::{MessageId, MessageSummary, UserId};

/// Operations the triage backend offers.
///
/// Every call is a suspension point; implementations must be safe to call
/// concurrently from several tasks.
#[async_trait]
pub trait TriageBackend: Send + Sync {
    /// List the inbox of a user.
    async fn list_messages(&self, user: &UserId) -> Result<Vec<MessageSummary>, ApiError>;

    /// Classify one message. Also returns the message body when available.
    async fn classify(
        &self,
        user: &UserId,
        message: &MessageId,
    ) -> Result<FetchedClassification, ApiError>;

    /// Ask the model to draft a reply.
    async fn generate_reply(
        &self,
        user: &UserId,
        message: &MessageId,
    ) -> Result<ReplyDraft, ApiError>;

    /// Send a reply.
    async fn send_reply(
        &self,
        user: &UserId,
        message: &MessageId,
        text: &str,
    ) -> Result<SendReceipt, ApiError>;

    /// Profile of a user.
    async fn user_profile(&self, user: &UserId) -> Result<UserProfile, ApiError>;
}

#[async_trait]
impl TriageBackend for ApiClient {
    async fn list_messages(&self, user: &UserId) -> Result<Vec<MessageSummary>, ApiError> {
        let items = Self::list_messages(self, user.as_str()).await?;
        Ok(items.into_iter().map(MessageSummary::from).collect())
    }

    async fn classify(
        &self,
        user: &UserId,
        message: &MessageId,
    ) -> Result<FetchedClassification, ApiError> {
        self.fetch_classification(user.as_str(), message.as_str())
            .await
    }

    async fn generate_reply(
        &self,
        user: &UserId,
        message: &MessageId,
    ) -> Result<ReplyDraft, ApiError> {
        Self::generate_reply(self, user.as_str(), message.as_str()).await
    }

    async fn send_reply(
        &self,
        user: &UserId,
        message: &MessageId,
        text: &str,
    ) -> Result<SendReceipt, ApiError> {
        Self::send_reply(self, user.as_str(), message.as_str(), text).await
    }

    async fn user_profile(&self, user: &UserId) -> Result<UserProfile, ApiError> {
        Self::user_profile(self, user.as_str()).await
    }
}
