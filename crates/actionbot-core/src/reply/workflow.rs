//! Reply state machine for one message.

use std::time::Duration;

use actionbot_api::{ApiError, ReplyDraft, SendReceipt};
use tracing::{debug, error, info};

use super::{
    GENERATE_FAILED, Notice, ReplyError, ReplyState, ReplyTicket, SEND_FAILED, SEND_SUCCEEDED,
    SendCompletion,
};
use crate::model::{DraftReply, MessageId, UserId};
use crate::service::TriageBackend;

/// Draft and send state of the selected message.
///
/// Built fresh for every selection so nothing leaks between messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyWorkflow {
    message_id: MessageId,
    state: ReplyState,
    draft: Option<DraftReply>,
    notice: Option<Notice>,
    epoch: u64,
}

impl ReplyWorkflow {
    /// An idle workflow for `message_id`.
    #[must_use]
    pub const fn new(message_id: MessageId) -> Self {
        Self {
            message_id,
            state: ReplyState::Idle,
            draft: None,
            notice: None,
            epoch: 0,
        }
    }

    /// Message being answered.
    #[must_use]
    pub const fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ReplyState {
        self.state
    }

    /// Current draft, if any.
    #[must_use]
    pub const fn draft(&self) -> Option<&DraftReply> {
        self.draft.as_ref()
    }

    /// Outcome message to display, if any.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Start drafting a reply. Allowed only while idle.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::InvalidTransition`] outside [`ReplyState::Idle`].
    pub fn begin_generate(&mut self) -> Result<ReplyTicket, ReplyError> {
        self.expect_state(ReplyState::Idle, "generate a reply")?;
        self.state = ReplyState::Generating;
        self.notice = None;
        Ok(self.next_ticket())
    }

    /// Finish drafting with the backend's answer.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::Stale`] for a superseded ticket, leaving the
    /// workflow untouched. Returns [`ReplyError::Backend`] after moving back
    /// to [`ReplyState::Idle`] with an error notice.
    pub fn complete_generate(
        &mut self,
        ticket: &ReplyTicket,
        result: Result<ReplyDraft, ApiError>,
    ) -> Result<(), ReplyError> {
        self.check_ticket(ticket, ReplyState::Generating)?;

        match result {
            Ok(draft) => {
                debug!("Draft ready for message {}", self.message_id);
                self.draft = Some(DraftReply {
                    message_id: self.message_id.clone(),
                    text: draft.text,
                    subject_echo: draft.subject,
                });
                self.state = ReplyState::Drafted;
                Ok(())
            }
            Err(e) => {
                error!("Failed to generate reply for message {}: {e}", self.message_id);
                self.state = ReplyState::Idle;
                self.notice = Some(Notice::Error(GENERATE_FAILED.to_string()));
                Err(ReplyError::Backend(e))
            }
        }
    }

    /// Replace the draft text.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::InvalidTransition`] unless a draft is ready.
    pub fn edit_draft(&mut self, text: impl Into<String>) -> Result<(), ReplyError> {
        self.expect_state(ReplyState::Drafted, "edit the draft")?;
        if let Some(draft) = self.draft.as_mut() {
            draft.text = text.into();
        }
        Ok(())
    }

    /// Start sending the draft. Returns the ticket and the text to send.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::InvalidTransition`] unless a draft is ready, and
    /// [`ReplyError::EmptyDraft`] when it holds only whitespace. Neither
    /// changes the state.
    pub fn begin_send(&mut self) -> Result<(ReplyTicket, String), ReplyError> {
        self.expect_state(ReplyState::Drafted, "send the reply")?;
        let text = self
            .draft
            .as_ref()
            .map(|draft| draft.text.clone())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ReplyError::EmptyDraft);
        }

        self.state = ReplyState::Sending;
        self.notice = None;
        Ok((self.next_ticket(), text))
    }

    /// Finish sending with the backend's answer.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::Stale`] for a superseded ticket, leaving the
    /// workflow untouched. Returns [`ReplyError::Backend`] after moving back
    /// to [`ReplyState::Drafted`] with the draft intact and an error notice.
    pub fn complete_send(
        &mut self,
        ticket: &ReplyTicket,
        result: Result<SendReceipt, ApiError>,
    ) -> Result<(), ReplyError> {
        self.check_ticket(ticket, ReplyState::Sending)?;

        match result {
            Ok(_) => {
                info!("Reply sent for message {}", self.message_id);
                self.draft = None;
                self.state = ReplyState::Sent;
                self.notice = Some(Notice::Success(SEND_SUCCEEDED.to_string()));
                Ok(())
            }
            Err(e) => {
                error!("Failed to send reply for message {}: {e}", self.message_id);
                self.state = ReplyState::Drafted;
                self.notice = Some(Notice::Error(SEND_FAILED.to_string()));
                Err(ReplyError::Backend(e))
            }
        }
    }

    /// Discard the draft and any notice.
    ///
    /// # Errors
    ///
    /// Returns [`ReplyError::InvalidTransition`] while sending.
    pub fn clear(&mut self) -> Result<(), ReplyError> {
        if self.state == ReplyState::Sending {
            return Err(ReplyError::InvalidTransition {
                from: self.state,
                action: "clear the reply",
            });
        }
        self.draft = None;
        self.notice = None;
        self.state = ReplyState::Idle;
        self.epoch += 1;
        Ok(())
    }

    /// Ask the backend for a draft.
    ///
    /// # Errors
    ///
    /// Same as [`begin_generate`](Self::begin_generate) and
    /// [`complete_generate`](Self::complete_generate). A transport failure is
    /// returned as [`ReplyError::Backend`] so the caller can inspect it.
    pub async fn generate(
        &mut self,
        backend: &dyn TriageBackend,
        user: &UserId,
    ) -> Result<(), ReplyError> {
        let ticket = self.begin_generate()?;
        let result = backend.generate_reply(user, &self.message_id).await;
        self.complete_generate(&ticket, result)
    }

    /// Send the draft, then keep the success notice up for `delay`.
    ///
    /// # Errors
    ///
    /// Same as [`begin_send`](Self::begin_send) and
    /// [`complete_send`](Self::complete_send). A transport failure is
    /// returned as [`ReplyError::Backend`] so the caller can inspect it.
    pub async fn send(
        &mut self,
        backend: &dyn TriageBackend,
        user: &UserId,
        delay: Duration,
    ) -> Result<SendCompletion, ReplyError> {
        let (ticket, text) = self.begin_send()?;
        let result = backend.send_reply(user, &self.message_id, &text).await;
        self.complete_send(&ticket, result)?;

        tokio::time::sleep(delay).await;
        Ok(SendCompletion::Completed)
    }

    fn expect_state(&self, expected: ReplyState, action: &'static str) -> Result<(), ReplyError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ReplyError::InvalidTransition {
                from: self.state,
                action,
            })
        }
    }

    fn next_ticket(&mut self) -> ReplyTicket {
        self.epoch += 1;
        ReplyTicket {
            message_id: self.message_id.clone(),
            epoch: self.epoch,
        }
    }

    fn check_ticket(&self, ticket: &ReplyTicket, pending: ReplyState) -> Result<(), ReplyError> {
        if ticket.message_id == self.message_id && ticket.epoch == self.epoch && self.state == pending
        {
            Ok(())
        } else {
            debug!(
                "Ignoring stale reply completion for message {}",
                ticket.message_id
            );
            Err(ReplyError::Stale)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::reply::DEFAULT_SEND_COMPLETE_DELAY;
    use crate::testing::ScriptedBackend;

    fn draft(text: &str) -> ReplyDraft {
        ReplyDraft {
            text: text.to_string(),
            subject: "Re: Hello".to_string(),
            message_id: "m1".to_string(),
        }
    }

    fn server_error() -> ApiError {
        ApiError::Status {
            status: 500,
            message: Some("model crashed".to_string()),
            description: None,
        }
    }

    fn drafted(text: &str) -> ReplyWorkflow {
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));
        let ticket = workflow.begin_generate().unwrap();
        workflow.complete_generate(&ticket, Ok(draft(text))).unwrap();
        workflow
    }

    #[test]
    fn test_generate_success() {
        let workflow = drafted("Sounds good.");
        assert_eq!(workflow.state(), ReplyState::Drafted);
        let draft = workflow.draft().unwrap();
        assert_eq!(draft.text, "Sounds good.");
        assert_eq!(draft.subject_echo, "Re: Hello");
        assert_eq!(draft.message_id, MessageId::from("m1"));
        assert_eq!(workflow.notice(), None);
    }

    #[test]
    fn test_generate_failure_returns_to_idle() {
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));
        let ticket = workflow.begin_generate().unwrap();
        assert_eq!(workflow.state(), ReplyState::Generating);

        let err = workflow
            .complete_generate(&ticket, Err(server_error()))
            .unwrap_err();
        assert!(err.backend_error().is_some());
        assert_eq!(workflow.state(), ReplyState::Idle);
        assert_eq!(
            workflow.notice(),
            Some(&Notice::Error(GENERATE_FAILED.to_string()))
        );
        assert!(!workflow.notice().unwrap().text().contains("crashed"));

        // An error-flagged idle workflow can try again.
        assert!(workflow.begin_generate().is_ok());
        assert_eq!(workflow.notice(), None);
    }

    #[test]
    fn test_generate_only_from_idle() {
        let mut workflow = drafted("text");
        let err = workflow.begin_generate().unwrap_err();
        assert!(matches!(
            err,
            ReplyError::InvalidTransition {
                from: ReplyState::Drafted,
                ..
            }
        ));
    }

    #[test]
    fn test_edit_requires_draft() {
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));
        assert!(workflow.edit_draft("hi").is_err());

        let mut workflow = drafted("original");
        workflow.edit_draft("edited").unwrap();
        assert_eq!(workflow.draft().unwrap().text, "edited");
    }

    #[test]
    fn test_send_rejects_blank_draft() {
        let mut workflow = drafted("text");
        workflow.edit_draft("   \n\t").unwrap();

        assert!(matches!(workflow.begin_send(), Err(ReplyError::EmptyDraft)));
        assert_eq!(workflow.state(), ReplyState::Drafted);
    }

    #[test]
    fn test_send_requires_draft() {
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));
        assert!(matches!(
            workflow.begin_send(),
            Err(ReplyError::InvalidTransition {
                from: ReplyState::Idle,
                ..
            })
        ));
    }

    #[test]
    fn test_send_failure_keeps_draft() {
        let mut workflow = drafted("Please find attached.");
        let (ticket, text) = workflow.begin_send().unwrap();
        assert_eq!(text, "Please find attached.");
        assert_eq!(workflow.state(), ReplyState::Sending);

        let err = workflow
            .complete_send(&ticket, Err(server_error()))
            .unwrap_err();
        assert!(matches!(err, ReplyError::Backend(_)));
        assert_eq!(workflow.state(), ReplyState::Drafted);
        assert_eq!(workflow.draft().unwrap().text, "Please find attached.");
        assert_eq!(
            workflow.notice(),
            Some(&Notice::Error(SEND_FAILED.to_string()))
        );
    }

    #[test]
    fn test_send_success() {
        let mut workflow = drafted("Done.");
        let (ticket, _) = workflow.begin_send().unwrap();
        workflow
            .complete_send(&ticket, Ok(SendReceipt::default()))
            .unwrap();

        assert_eq!(workflow.state(), ReplyState::Sent);
        assert_eq!(workflow.draft(), None);
        assert_eq!(
            workflow.notice(),
            Some(&Notice::Success(SEND_SUCCEEDED.to_string()))
        );
    }

    #[test]
    fn test_clear() {
        let mut workflow = drafted("text");
        workflow.clear().unwrap();
        assert_eq!(workflow.state(), ReplyState::Idle);
        assert_eq!(workflow.draft(), None);

        let mut sending = drafted("text");
        sending.begin_send().unwrap();
        assert!(sending.clear().is_err());
        assert_eq!(sending.state(), ReplyState::Sending);
    }

    #[test]
    fn test_clear_discards_notice() {
        let mut failed = drafted("text");
        let (ticket, _) = failed.begin_send().unwrap();
        failed.complete_send(&ticket, Err(server_error())).unwrap_err();
        assert_eq!(failed.state(), ReplyState::Drafted);
        assert!(failed.notice().is_some_and(Notice::is_error));

        failed.clear().unwrap();
        assert_eq!(failed.state(), ReplyState::Idle);
        assert_eq!(failed.notice(), None);

        let mut sent = drafted("text");
        let (ticket, _) = sent.begin_send().unwrap();
        sent.complete_send(&ticket, Ok(SendReceipt::default())).unwrap();
        assert_eq!(sent.state(), ReplyState::Sent);
        assert!(sent.notice().is_some());

        sent.clear().unwrap();
        assert_eq!(sent.state(), ReplyState::Idle);
        assert_eq!(sent.notice(), None);
    }

    #[test]
    fn test_clear_makes_ticket_stale() {
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));
        let ticket = workflow.begin_generate().unwrap();
        workflow.clear().unwrap();

        let err = workflow
            .complete_generate(&ticket, Ok(draft("late")))
            .unwrap_err();
        assert!(matches!(err, ReplyError::Stale));
        assert_eq!(workflow.state(), ReplyState::Idle);
        assert_eq!(workflow.draft(), None);
    }

    #[test]
    fn test_ticket_of_other_message_is_stale() {
        let mut first = ReplyWorkflow::new(MessageId::from("a"));
        let ticket = first.begin_generate().unwrap();

        let mut second = ReplyWorkflow::new(MessageId::from("b"));
        second.begin_generate().unwrap();
        assert!(matches!(
            second.complete_generate(&ticket, Ok(draft("for a"))),
            Err(ReplyError::Stale)
        ));
        assert_eq!(second.state(), ReplyState::Generating);
    }

    #[test]
    fn test_ticket_completes_once() {
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));
        let ticket = workflow.begin_generate().unwrap();
        workflow.complete_generate(&ticket, Ok(draft("one"))).unwrap();
        assert!(matches!(
            workflow.complete_generate(&ticket, Ok(draft("two"))),
            Err(ReplyError::Stale)
        ));
        assert_eq!(workflow.draft().unwrap().text, "one");
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_waits_before_completing() {
        let backend = Arc::new(ScriptedBackend::new());
        let user = UserId::from("u");
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));

        workflow.generate(backend.as_ref(), &user).await.unwrap();
        workflow.edit_draft("Edited reply").unwrap();

        let started = tokio::time::Instant::now();
        let completion = workflow
            .send(backend.as_ref(), &user, DEFAULT_SEND_COMPLETE_DELAY)
            .await
            .unwrap();

        assert_eq!(completion, SendCompletion::Completed);
        assert!(started.elapsed() >= DEFAULT_SEND_COMPLETE_DELAY);
        assert_eq!(backend.sent_texts(), vec!["Edited reply".to_string()]);
        assert_eq!(workflow.state(), ReplyState::Sent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_then_retry() {
        let backend = Arc::new(ScriptedBackend::new());
        let user = UserId::from("u");
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));
        workflow.generate(backend.as_ref(), &user).await.unwrap();

        backend.set_send_failure(Some((502, "bad gateway")));
        let started = tokio::time::Instant::now();
        let err = workflow
            .send(backend.as_ref(), &user, DEFAULT_SEND_COMPLETE_DELAY)
            .await
            .unwrap_err();
        assert_eq!(err.backend_error().and_then(ApiError::status), Some(502));
        assert!(started.elapsed() < DEFAULT_SEND_COMPLETE_DELAY);
        assert_eq!(workflow.state(), ReplyState::Drafted);

        backend.set_send_failure(None);
        workflow
            .send(backend.as_ref(), &user, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(backend.send_calls(), 2);
        assert_eq!(workflow.state(), ReplyState::Sent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_draft_makes_no_request() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_draft("  ");
        let user = UserId::from("u");
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));
        workflow.generate(backend.as_ref(), &user).await.unwrap();

        let err = workflow
            .send(backend.as_ref(), &user, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::EmptyDraft));
        assert_eq!(backend.send_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_failure_surfaces_transport_error() {
        let backend = Arc::new(ScriptedBackend::new().with_draft_failure(401, "Token expired"));
        let user = UserId::from("u");
        let mut workflow = ReplyWorkflow::new(MessageId::from("m1"));

        let err = workflow.generate(backend.as_ref(), &user).await.unwrap_err();
        assert_eq!(err.backend_error().and_then(ApiError::status), Some(401));
        assert_eq!(workflow.state(), ReplyState::Idle);
        assert!(workflow.notice().unwrap().is_error());
    }
}
