//! Batch-sequenced classification runs.

use std::collections::HashSet;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::Arc;

use actionbot_api::ApiError;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use super::index::{ClassificationIndex, PipelineRun, RunId};
use crate::model::{Classification, MessageId, MessageSummary, UserId};
use crate::service::TriageBackend;

/// Default number of concurrent classification requests.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Why a message ended up unclassified.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationFailure {
    /// The backend answered without a category.
    #[error("backend returned no category")]
    Unclassified,

    /// The classification request failed.
    #[error("classification request failed: {0}")]
    Backend(ApiError),

    /// The request task ended without producing an answer.
    #[error("classification task ended unexpectedly")]
    Aborted,
}

/// Something that happened during a run.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A batch of requests was issued.
    BatchStarted {
        /// Run that produced the event.
        run: RunId,
        /// Zero-based batch number.
        batch: usize,
        /// Number of requests in the batch.
        size: usize,
    },
    /// One message settled.
    Item {
        /// Run that produced the event.
        run: RunId,
        /// Settled message.
        message_id: MessageId,
        /// Classification, or why there is none.
        outcome: Result<Classification, ClassificationFailure>,
    },
    /// A batch fully settled.
    Progress {
        /// Run that produced the event.
        run: RunId,
        /// Messages accounted for so far.
        completed: usize,
        /// Messages in the run.
        total: usize,
    },
    /// Every message is accounted for.
    Finished {
        /// Run that produced the event.
        run: RunId,
    },
}

impl PipelineEvent {
    /// Run that produced this event.
    #[must_use]
    pub const fn run(&self) -> RunId {
        match self {
            Self::BatchStarted { run, .. }
            | Self::Item { run, .. }
            | Self::Progress { run, .. }
            | Self::Finished { run } => *run,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Run identifier.
    pub run: RunId,
    /// Messages in the run.
    pub total: usize,
    /// Messages that received a category.
    pub classified: usize,
    /// Messages left unclassified.
    pub failed: usize,
    /// Every progress value reported, in order.
    pub progress: Vec<usize>,
}

/// Classifies an inbox in sequential batches of concurrent requests.
///
/// Owns the [`ClassificationIndex`] and the [`PipelineRun`] progress of the
/// current inbox session. Only events of the current run are applied.
pub struct ClassificationPipeline {
    backend: Arc<dyn TriageBackend>,
    batch_size: usize,
    last_run: u64,
    run: Option<PipelineRun>,
    finished: bool,
    index: ClassificationIndex,
    events_tx: mpsc::UnboundedSender<PipelineEvent>,
    events_rx: mpsc::UnboundedReceiver<PipelineEvent>,
    driver: Option<JoinHandle<()>>,
}

impl fmt::Debug for ClassificationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationPipeline")
            .field("batch_size", &self.batch_size)
            .field("run", &self.run)
            .field("finished", &self.finished)
            .field("classified", &self.index.len())
            .finish_non_exhaustive()
    }
}

impl ClassificationPipeline {
    /// Create a pipeline. A `batch_size` of zero is treated as one.
    #[must_use]
    pub fn new(backend: Arc<dyn TriageBackend>, batch_size: usize) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            backend,
            batch_size: batch_size.max(1),
            last_run: 0,
            run: None,
            finished: true,
            index: ClassificationIndex::new(),
            events_tx,
            events_rx,
            driver: None,
        }
    }

    /// Number of concurrent requests per batch.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Classifications gathered by the current run.
    #[must_use]
    pub const fn index(&self) -> &ClassificationIndex {
        &self.index
    }

    /// Progress of the current run, if one was started.
    #[must_use]
    pub const fn progress(&self) -> Option<&PipelineRun> {
        self.run.as_ref()
    }

    /// Identifier of the current run.
    #[must_use]
    pub fn current_run(&self) -> Option<RunId> {
        self.run.map(|run| run.run_id)
    }

    /// Whether the current run has delivered all of its events.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Start classifying `messages`, superseding any previous run.
    ///
    /// The index is cleared immediately. Results are applied as they are
    /// pulled through [`next_event`](Self::next_event).
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&mut self, user: &UserId, messages: &[MessageSummary]) -> RunId {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }

        self.last_run += 1;
        let run_id = RunId(self.last_run);
        self.index.clear();
        self.run = Some(PipelineRun::new(run_id, messages.len()));
        self.finished = false;

        let message_ids: Vec<MessageId> = messages.iter().map(|m| m.id.clone()).collect();
        info!(
            "Starting classification {run_id}: {} messages in batches of {}",
            message_ids.len(),
            self.batch_size
        );

        self.driver = Some(tokio::spawn(drive_run(
            Arc::clone(&self.backend),
            user.clone(),
            message_ids,
            self.batch_size,
            run_id,
            self.events_tx.clone(),
        )));

        run_id
    }

    /// Wait for the next event of the current run and apply it.
    ///
    /// Events left over from superseded runs are discarded. Returns `None`
    /// once the current run has finished or was abandoned.
    pub async fn next_event(&mut self) -> Option<PipelineEvent> {
        loop {
            let current = self.run.as_ref()?.run_id;
            if self.finished {
                return None;
            }

            let event = self.events_rx.recv().await?;
            if event.run() != current {
                debug!("Discarding event of superseded {}", event.run());
                continue;
            }

            self.apply(&event);
            return Some(event);
        }
    }

    /// Start a run and drive it to completion.
    pub async fn run(&mut self, user: &UserId, messages: &[MessageSummary]) -> RunReport {
        self.run_with(user, messages, |_| ControlFlow::Continue(()))
            .await
    }

    /// Start a run and drive it, showing every applied event to `observe`.
    ///
    /// Returning [`ControlFlow::Break`] abandons the run; the report then
    /// covers the events seen so far.
    pub async fn run_with(
        &mut self,
        user: &UserId,
        messages: &[MessageSummary],
        mut observe: impl FnMut(&PipelineEvent) -> ControlFlow<()>,
    ) -> RunReport {
        let run = self.start(user, messages);
        let mut report = RunReport {
            run,
            total: messages.len(),
            classified: 0,
            failed: 0,
            progress: Vec::new(),
        };

        while let Some(event) = self.next_event().await {
            match &event {
                PipelineEvent::Item { outcome: Ok(_), .. } => report.classified += 1,
                PipelineEvent::Item {
                    outcome: Err(_), ..
                } => report.failed += 1,
                PipelineEvent::Progress { completed, .. } => report.progress.push(*completed),
                PipelineEvent::BatchStarted { .. } | PipelineEvent::Finished { .. } => {}
            }

            if observe(&event).is_break() {
                warn!("Classification {run} abandoned");
                self.abandon();
                break;
            }
        }

        report
    }

    /// Stop following the current run.
    ///
    /// Requests already sent are not recalled; their answers are dropped.
    pub fn abandon(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
        self.finished = true;
        if let Some(run) = self.run.as_mut() {
            run.in_flight = 0;
        }
    }

    fn apply(&mut self, event: &PipelineEvent) {
        let Some(run) = self.run.as_mut() else {
            return;
        };

        match event {
            PipelineEvent::BatchStarted { size, .. } => run.in_flight = *size,
            PipelineEvent::Item { outcome, .. } => {
                run.in_flight = run.in_flight.saturating_sub(1);
                if let Ok(classification) = outcome {
                    self.index.insert(classification);
                }
            }
            PipelineEvent::Progress { completed, .. } => {
                run.completed = run.completed.max(*completed);
                run.in_flight = 0;
            }
            PipelineEvent::Finished { .. } => {
                run.completed = run.total;
                run.in_flight = 0;
                self.finished = true;
                self.driver = None;
            }
        }
    }
}

impl Drop for ClassificationPipeline {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

/// Issue every batch of a run, one batch at a time.
async fn drive_run(
    backend: Arc<dyn TriageBackend>,
    user: UserId,
    message_ids: Vec<MessageId>,
    batch_size: usize,
    run: RunId,
    events: mpsc::UnboundedSender<PipelineEvent>,
) {
    let total = message_ids.len();

    for (batch, chunk) in message_ids.chunks(batch_size).enumerate() {
        if events
            .send(PipelineEvent::BatchStarted {
                run,
                batch,
                size: chunk.len(),
            })
            .is_err()
        {
            return;
        }
        debug!("{run}: batch {batch} with {} requests", chunk.len());

        let mut pending: HashSet<MessageId> = chunk.iter().cloned().collect();
        let mut tasks = JoinSet::new();
        for message_id in chunk {
            let backend = Arc::clone(&backend);
            let user = user.clone();
            let message_id = message_id.clone();
            tasks.spawn(async move {
                let outcome = classify_one(backend.as_ref(), &user, &message_id).await;
                (message_id, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((message_id, outcome)) => {
                    pending.remove(&message_id);
                    if events
                        .send(PipelineEvent::Item {
                            run,
                            message_id,
                            outcome,
                        })
                        .is_err()
                    {
                        return;
                    }
                }
                Err(e) => warn!("{run}: classification task failed: {e}"),
            }
        }

        for message_id in pending {
            let event = PipelineEvent::Item {
                run,
                message_id,
                outcome: Err(ClassificationFailure::Aborted),
            };
            if events.send(event).is_err() {
                return;
            }
        }

        let completed = ((batch + 1) * batch_size).min(total);
        if events
            .send(PipelineEvent::Progress {
                run,
                completed,
                total,
            })
            .is_err()
        {
            return;
        }
    }

    info!("Classification {run} finished");
    let _ = events.send(PipelineEvent::Finished { run });
}

async fn classify_one(
    backend: &dyn TriageBackend,
    user: &UserId,
    message_id: &MessageId,
) -> Result<Classification, ClassificationFailure> {
    match backend.classify(user, message_id).await {
        Ok(fetched) => Classification::from_fetched(message_id.clone(), &fetched).ok_or_else(|| {
            warn!("No category returned for message {message_id}");
            ClassificationFailure::Unclassified
        }),
        Err(e) => {
            warn!("Failed to classify message {message_id}: {e}");
            Err(ClassificationFailure::Backend(e))
        }
    }
}
