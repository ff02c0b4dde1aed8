//! One inbox session of the logged-in user.
//!
//! [`InboxSession`] ties the pieces together the way the inbox screen uses
//! them: it lists and classifies the inbox, keeps the category filter and
//! the selected message, and drives the reply of that message. Every backend
//! error passes through [`AuthEscalation`] first.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use actionbot_api::{ApiError, UserProfile};
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::escalation::AuthEscalation;
use crate::filter::{CategoryCount, CategoryFilter, summarize};
use crate::model::{Category, MessageDetail, MessageId, MessageSummary, UserId};
use crate::pipeline::{
    ClassificationFailure, ClassificationIndex, ClassificationPipeline, DEFAULT_BATCH_SIZE,
    PipelineEvent, PipelineRun, RunReport,
};
use crate::reply::{DEFAULT_SEND_COMPLETE_DELAY, Notice, ReplyError, ReplyWorkflow, SendCompletion};
use crate::service::TriageBackend;
use crate::settings::Settings;

/// Notice shown when the inbox could not be listed.
pub const LOAD_FAILED: &str = "Failed to load emails. Please try again.";

/// Notice shown when a message could not be opened.
pub const DETAIL_FAILED: &str = "Failed to load email details. Please try again.";

/// Tunables of an inbox session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboxOptions {
    /// Concurrent classification requests per batch.
    pub batch_size: usize,
    /// How long the "sent" notice stays up before the inbox refreshes.
    pub send_complete_delay: Duration,
}

impl Default for InboxOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            send_complete_delay: DEFAULT_SEND_COMPLETE_DELAY,
        }
    }
}

impl From<&Settings> for InboxOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            batch_size: settings.batch_size,
            send_complete_delay: settings.send_complete_delay(),
        }
    }
}

/// The message the user opened, with its reply.
#[derive(Debug, Clone)]
pub struct SelectedMessage {
    /// Listing entry.
    pub summary: MessageSummary,
    /// Full content.
    pub detail: MessageDetail,
    /// Reply of this message. Never carried over from another message.
    pub reply: ReplyWorkflow,
}

/// Inbox of the logged-in user.
pub struct InboxSession {
    backend: Arc<dyn TriageBackend>,
    escalation: AuthEscalation,
    user: UserId,
    options: InboxOptions,
    messages: Vec<MessageSummary>,
    pipeline: ClassificationPipeline,
    filter: CategoryFilter,
    selected: Option<SelectedMessage>,
    notice: Option<Notice>,
}

impl fmt::Debug for InboxSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboxSession")
            .field("user", &self.user)
            .field("messages", &self.messages.len())
            .field("pipeline", &self.pipeline)
            .field("filter", &self.filter)
            .field("selected", &self.selected.as_ref().map(|s| &s.summary.id))
            .finish_non_exhaustive()
    }
}

impl InboxSession {
    /// Open the inbox of the user stored in the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if no user id is stored, or a session
    /// error if the store cannot be read.
    pub fn open(
        backend: Arc<dyn TriageBackend>,
        escalation: AuthEscalation,
        options: InboxOptions,
    ) -> Result<Self> {
        let user = escalation.session().user_id()?.ok_or(Error::NotLoggedIn)?;
        debug!("Opening inbox of user {user}");

        let pipeline = ClassificationPipeline::new(Arc::clone(&backend), options.batch_size);
        Ok(Self {
            backend,
            escalation,
            user,
            options,
            messages: Vec::new(),
            pipeline,
            filter: CategoryFilter::new(),
            selected: None,
            notice: None,
        })
    }

    /// The logged-in user.
    #[must_use]
    pub const fn user(&self) -> &UserId {
        &self.user
    }

    /// Session tunables.
    #[must_use]
    pub const fn options(&self) -> &InboxOptions {
        &self.options
    }

    /// Every listed message, in listing order.
    #[must_use]
    pub fn messages(&self) -> &[MessageSummary] {
        &self.messages
    }

    /// Classifications gathered so far.
    #[must_use]
    pub const fn index(&self) -> &ClassificationIndex {
        self.pipeline.index()
    }

    /// Progress of the last classification run.
    #[must_use]
    pub const fn progress(&self) -> Option<&PipelineRun> {
        self.pipeline.progress()
    }

    /// Inbox-level notice, if an operation failed.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// List the inbox without classifying it.
    ///
    /// Classifications from an earlier run are kept.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessRevoked`] when the backend rejects the user.
    /// Other failures are returned as [`Error::Api`] with a notice set.
    pub async fn refresh_listing(&mut self) -> Result<()> {
        self.notice = None;

        match self.backend.list_messages(&self.user).await {
            Ok(messages) => {
                info!("Loaded {} messages", messages.len());
                self.messages = messages;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load emails: {e}");
                self.notice = Some(Notice::Error(LOAD_FAILED.to_string()));
                Err(self.escalate(e))
            }
        }
    }

    /// List the inbox and classify every message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessRevoked`] when the backend rejects the user,
    /// either while listing or while classifying. Other listing failures are
    /// returned as [`Error::Api`] with a notice set.
    pub async fn load(&mut self) -> Result<RunReport> {
        self.load_with(|_| {}).await
    }

    /// Like [`load`](Self::load), showing every pipeline event to `observe`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub async fn load_with(&mut self, mut observe: impl FnMut(&PipelineEvent)) -> Result<RunReport> {
        self.refresh_listing().await?;

        let escalation = &self.escalation;
        let mut revoked = false;
        let report = self
            .pipeline
            .run_with(&self.user, &self.messages, |event| {
                observe(event);
                if let PipelineEvent::Item {
                    outcome: Err(ClassificationFailure::Backend(e)),
                    ..
                } = event
                    && escalation.inspect(e)
                {
                    revoked = true;
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            })
            .await;

        if revoked {
            return Err(Error::AccessRevoked);
        }
        Ok(report)
    }

    /// Messages under the current category filter.
    #[must_use]
    pub fn visible_messages(&self) -> Vec<&MessageSummary> {
        self.filter.apply(&self.messages, self.pipeline.index())
    }

    /// Per-category counts, most frequent first.
    #[must_use]
    pub fn summary(&self) -> Vec<CategoryCount> {
        summarize(self.pipeline.index())
    }

    /// Currently selected category.
    #[must_use]
    pub const fn selected_category(&self) -> Option<Category> {
        self.filter.selected()
    }

    /// Toggle a category and open its first message.
    ///
    /// Returns the id of the message that was opened, if any.
    ///
    /// # Errors
    ///
    /// Same as [`select_message`](Self::select_message).
    pub async fn select_category(&mut self, category: Category) -> Result<Option<MessageId>> {
        let first = self
            .filter
            .select(category, &self.messages, self.pipeline.index());
        if let Some(message_id) = &first {
            self.select_message(message_id).await?;
        }
        Ok(first)
    }

    /// Show every message again.
    pub const fn clear_category(&mut self) {
        self.filter.clear();
    }

    /// Open a message. Its reply starts from scratch.
    ///
    /// On failure the previous selection stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMessage`] if the id is not listed,
    /// [`Error::AccessRevoked`] when the backend rejects the user, and
    /// [`Error::Api`] with a notice set for other failures.
    pub async fn select_message(&mut self, message_id: &MessageId) -> Result<&SelectedMessage> {
        let summary = self
            .messages
            .iter()
            .find(|m| &m.id == message_id)
            .cloned()
            .ok_or_else(|| Error::UnknownMessage(message_id.to_string()))?;

        self.notice = None;
        let fetched = match self.backend.classify(&self.user, message_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!("Failed to load email details for {message_id}: {e}");
                self.notice = Some(Notice::Error(DETAIL_FAILED.to_string()));
                return Err(self.escalate(e));
            }
        };

        let selected = self.selected.insert(SelectedMessage {
            detail: MessageDetail::from_fetched(summary.clone(), fetched),
            reply: ReplyWorkflow::new(message_id.clone()),
            summary,
        });
        Ok(&*selected)
    }

    /// The open message.
    #[must_use]
    pub const fn selected(&self) -> Option<&SelectedMessage> {
        self.selected.as_ref()
    }

    /// Close the open message, dropping its reply.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Reply of the open message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSelection`] if no message is open.
    pub fn reply_mut(&mut self) -> Result<&mut ReplyWorkflow> {
        self.selected
            .as_mut()
            .map(|selected| &mut selected.reply)
            .ok_or(Error::NoSelection)
    }

    /// Draft a reply to the open message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSelection`], [`Error::AccessRevoked`], or the
    /// workflow's [`ReplyError`].
    pub async fn generate_reply(&mut self) -> Result<()> {
        let selected = self.selected.as_mut().ok_or(Error::NoSelection)?;
        let result = selected
            .reply
            .generate(self.backend.as_ref(), &self.user)
            .await;
        result.map_err(|e| self.escalate_reply(e))
    }

    /// Send the draft of the open message.
    ///
    /// After a successful send the inbox is reloaded and the message closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSelection`], [`Error::AccessRevoked`], the
    /// workflow's [`ReplyError`], or any error of the reload.
    pub async fn send_reply(&mut self) -> Result<SendCompletion> {
        let delay = self.options.send_complete_delay;
        let selected = self.selected.as_mut().ok_or(Error::NoSelection)?;
        let result = selected
            .reply
            .send(self.backend.as_ref(), &self.user, delay)
            .await;
        let completion = result.map_err(|e| self.escalate_reply(e))?;

        self.on_reply_sent().await?;
        Ok(completion)
    }

    /// Close the open message and reload the inbox.
    ///
    /// An inbox that was classified before is classified again. One that was
    /// only listed is only listed again, and `None` is returned.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub async fn on_reply_sent(&mut self) -> Result<Option<RunReport>> {
        self.deselect();
        if self.pipeline.current_run().is_some() {
            self.load().await.map(Some)
        } else {
            self.refresh_listing().await.map(|()| None)
        }
    }

    /// Profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessRevoked`] when the backend rejects the user,
    /// [`Error::Api`] otherwise.
    pub async fn profile(&self) -> Result<UserProfile> {
        self.backend
            .user_profile(&self.user)
            .await
            .map_err(|e| self.escalate(e))
    }

    fn escalate(&self, err: ApiError) -> Error {
        if self.escalation.inspect(&err) {
            Error::AccessRevoked
        } else {
            Error::Api(err)
        }
    }

    fn escalate_reply(&self, err: ReplyError) -> Error {
        match err {
            ReplyError::Backend(api) => {
                if self.escalation.inspect(&api) {
                    Error::AccessRevoked
                } else {
                    Error::Reply(ReplyError::Backend(api))
                }
            }
            other => Error::Reply(other),
        }
    }
}
