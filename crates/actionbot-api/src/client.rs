//! HTTP client for the triage backend.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, Result};
use crate::types::{
    EmailListItem, FetchEmailResponse, FetchedClassification, ListEmailsResponse, LoginResponse,
    ReplyDraft, ReplyResponse, SendReceipt, SendRequest, SendResponse, UserProfile,
};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed client for the backend HTTP API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http_client: Client,
}

impl ApiClient {
    /// Creates a client with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let http_client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    /// Base URL requests are issued against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds an endpoint URL, percent-encoding every segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {url}");
        let response = self.http_client.get(url).send().await?;
        decode(check_status(response).await?).await
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {url}");
        let response = self.http_client.post(url).json(body).send().await?;
        decode(check_status(response).await?).await
    }

    /// Asks the backend where to send the user to log in.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the returned URL is invalid.
    pub async fn login_url(&self) -> Result<Url> {
        let response: LoginResponse = self.get_json(self.endpoint(&["auth", "login"])?).await?;
        Ok(Url::parse(&response.url)?)
    }

    /// Fetches the profile of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn user_profile(&self, user_id: &str) -> Result<UserProfile> {
        self.get_json(self.endpoint(&["auth", "profile", user_id])?)
            .await
    }

    /// Lists the inbox of a user.
    ///
    /// A response without a `messages` field is an empty inbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn list_messages(&self, user_id: &str) -> Result<Vec<EmailListItem>> {
        let response: ListEmailsResponse = self
            .get_json(self.endpoint(&["gmail", "list", user_id])?)
            .await?;
        Ok(response.into_messages())
    }

    /// Fetches one message together with its classification.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn fetch_classification(
        &self,
        user_id: &str,
        message_id: &str,
    ) -> Result<FetchedClassification> {
        let response: FetchEmailResponse = self
            .get_json(self.endpoint(&["gmail", "fetch", user_id, message_id])?)
            .await?;
        Ok(response.normalize())
    }

    /// Asks the backend to draft a reply to a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend reports failure.
    pub async fn generate_reply(&self, user_id: &str, message_id: &str) -> Result<ReplyDraft> {
        let response: ReplyResponse = self
            .post_json(
                self.endpoint(&["gmail", "reply", user_id, message_id])?,
                &serde_json::json!({}),
            )
            .await?;

        if !response.success {
            return Err(ApiError::Rejected {
                message: response.message,
            });
        }
        Ok(response.normalize(message_id))
    }

    /// Sends a reply to a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend reports failure.
    pub async fn send_reply(
        &self,
        user_id: &str,
        message_id: &str,
        reply_text: &str,
    ) -> Result<SendReceipt> {
        let response: SendResponse = self
            .post_json(
                self.endpoint(&["gmail", "send", user_id, message_id])?,
                &SendRequest { reply_text },
            )
            .await?;

        if !response.success {
            return Err(ApiError::Rejected {
                message: response.message,
            });
        }
        Ok(SendReceipt {
            message: response.message,
        })
    }
}

/// Reads a successful response body as JSON.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// Turns a non-success response into an [`ApiError::Status`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("Backend returned {status}");
    Err(ApiError::from_status(status.as_u16(), &body))
}
