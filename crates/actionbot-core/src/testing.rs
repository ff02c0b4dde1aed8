//! Scripted backend shared by unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use actionbot_api::{ApiError, FetchedClassification, ReplyDraft, SendReceipt, UserProfile};
use async_trait::async_trait;

use crate::model::{MessageId, MessageSummary, ThreadId, UserId};
use crate::service::TriageBackend;

/// A listing entry with predictable fields.
pub fn message(id: &str) -> MessageSummary {
    MessageSummary {
        id: MessageId::from(id),
        thread_id: ThreadId::from(format!("t-{id}")),
        subject: format!("Subject {id}"),
        from: "sender@example.com".to_string(),
        date: "2024-01-15T10:30:00Z".to_string(),
        snippet: format!("Snippet {id}"),
    }
}

/// Messages `m1..=mN`.
pub fn inbox(count: usize) -> Vec<MessageSummary> {
    (1..=count).map(|i| message(&format!("m{i}"))).collect()
}

#[derive(Debug, Clone)]
enum Outcome {
    Category(String),
    NoCategory,
    Failure(u16, String),
}

/// Backend with canned answers that records how it was called.
pub struct ScriptedBackend {
    inbox: Mutex<Vec<MessageSummary>>,
    list_failure: Mutex<Option<(u16, String)>>,
    outcomes: HashMap<String, Outcome>,
    default_outcome: Outcome,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    draft: Mutex<Result<String, (u16, String)>>,
    send_failure: Mutex<Option<(u16, String)>>,
    profile_failure: Option<(u16, String)>,
    classify_calls: AtomicUsize,
    list_calls: AtomicUsize,
    generate_calls: AtomicUsize,
    send_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    settled: AtomicUsize,
    start_log: Mutex<Vec<(String, usize)>>,
    sent_texts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            inbox: Mutex::new(Vec::new()),
            list_failure: Mutex::new(None),
            outcomes: HashMap::new(),
            default_outcome: Outcome::NoCategory,
            delays: HashMap::new(),
            default_delay: Duration::from_millis(10),
            draft: Mutex::new(Ok("Thanks, I will take a look.".to_string())),
            send_failure: Mutex::new(None),
            profile_failure: None,
            classify_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            generate_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            settled: AtomicUsize::new(0),
            start_log: Mutex::new(Vec::new()),
            sent_texts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_inbox(self, messages: Vec<MessageSummary>) -> Self {
        self.set_inbox(messages);
        self
    }

    pub fn with_list_failure(self, status: u16, message: &str) -> Self {
        *self.list_failure.lock().unwrap() = Some((status, message.to_string()));
        self
    }

    pub fn with_category(mut self, id: &str, category: &str) -> Self {
        self.outcomes
            .insert(id.to_string(), Outcome::Category(category.to_string()));
        self
    }

    pub fn with_no_category(mut self, id: &str) -> Self {
        self.outcomes.insert(id.to_string(), Outcome::NoCategory);
        self
    }

    pub fn with_failure(mut self, id: &str, status: u16, message: &str) -> Self {
        self.outcomes
            .insert(id.to_string(), Outcome::Failure(status, message.to_string()));
        self
    }

    pub fn with_default_category(mut self, category: &str) -> Self {
        self.default_outcome = Outcome::Category(category.to_string());
        self
    }

    pub fn with_default_failure(mut self, status: u16, message: &str) -> Self {
        self.default_outcome = Outcome::Failure(status, message.to_string());
        self
    }

    pub fn with_delay(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(id.to_string(), delay);
        self
    }

    pub const fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn with_draft_failure(self, status: u16, message: &str) -> Self {
        *self.draft.lock().unwrap() = Err((status, message.to_string()));
        self
    }

    pub fn with_profile_failure(mut self, status: u16, message: &str) -> Self {
        self.profile_failure = Some((status, message.to_string()));
        self
    }

    pub fn set_inbox(&self, messages: Vec<MessageSummary>) {
        *self.inbox.lock().unwrap() = messages;
    }

    pub fn set_draft(&self, text: &str) {
        *self.draft.lock().unwrap() = Ok(text.to_string());
    }

    pub fn set_send_failure(&self, failure: Option<(u16, &str)>) {
        *self.send_failure.lock().unwrap() =
            failure.map(|(status, message)| (status, message.to_string()));
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// `(message id, requests settled when it started)` in start order.
    pub fn start_log(&self) -> Vec<(String, usize)> {
        self.start_log.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent_texts.lock().unwrap().clone()
    }
}

fn status_error(status: u16, message: &str) -> ApiError {
    ApiError::Status {
        status,
        message: Some(message.to_string()),
        description: None,
    }
}

#[async_trait]
impl TriageBackend for ScriptedBackend {
    async fn list_messages(&self, _user: &UserId) -> Result<Vec<MessageSummary>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some((status, message)) = self.list_failure.lock().unwrap().clone() {
            return Err(status_error(status, &message));
        }
        Ok(self.inbox.lock().unwrap().clone())
    }

    async fn classify(
        &self,
        _user: &UserId,
        message: &MessageId,
    ) -> Result<FetchedClassification, ApiError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        self.start_log.lock().unwrap().push((
            message.as_str().to_string(),
            self.settled.load(Ordering::SeqCst),
        ));

        let delay = self
            .delays
            .get(message.as_str())
            .copied()
            .unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.settled.fetch_add(1, Ordering::SeqCst);

        let outcome = self
            .outcomes
            .get(message.as_str())
            .cloned()
            .unwrap_or_else(|| self.default_outcome.clone());
        let body = Some(format!("Body of {message}"));
        match outcome {
            Outcome::Category(category) => Ok(FetchedClassification {
                category: Some(category),
                action: Some("Review".to_string()),
                justification: None,
                body,
                snippet: None,
            }),
            Outcome::NoCategory => Ok(FetchedClassification {
                body,
                ..FetchedClassification::default()
            }),
            Outcome::Failure(status, text) => Err(status_error(status, &text)),
        }
    }

    async fn generate_reply(
        &self,
        _user: &UserId,
        message: &MessageId,
    ) -> Result<ReplyDraft, ApiError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.default_delay).await;
        let draft = self.draft.lock().unwrap().clone();
        match draft {
            Ok(text) => Ok(ReplyDraft {
                text,
                subject: "Re: Subject".to_string(),
                message_id: message.as_str().to_string(),
            }),
            Err((status, text)) => Err(status_error(status, &text)),
        }
    }

    async fn send_reply(
        &self,
        _user: &UserId,
        _message: &MessageId,
        text: &str,
    ) -> Result<SendReceipt, ApiError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.default_delay).await;
        let failure = self.send_failure.lock().unwrap().clone();
        if let Some((status, message)) = failure {
            return Err(status_error(status, &message));
        }
        self.sent_texts.lock().unwrap().push(text.to_string());
        Ok(SendReceipt::default())
    }

    async fn user_profile(&self, _user: &UserId) -> Result<UserProfile, ApiError> {
        if let Some((status, message)) = &self.profile_failure {
            return Err(status_error(*status, message));
        }
        Ok(UserProfile {
            name: Some("Test User".to_string()),
            email: Some("test@example.com".to_string()),
            picture: None,
        })
    }
}
