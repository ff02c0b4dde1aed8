//! Inbox classification pipeline.
//!
//! A run classifies every listed message through the backend:
//! - Messages are split into consecutive batches of `batch_size`
//! - All requests of a batch are issued concurrently
//! - The next batch starts only when every request of the current one settled
//! - Failures leave the message unclassified; nothing is retried
//!
//! Peak load on the backend is therefore `batch_size` requests, while the
//! latency of a batch is that of its slowest request.
//!
//! # Superseded runs
//!
//! Starting a new run clears the index and makes the previous run stale.
//! Every event carries the [`RunId`] of the run that produced it; events of a
//! stale run are dropped before they can touch the index.
//!
//! # Example
//!
//! ```ignore
//! use actionbot_core::pipeline::{ClassificationPipeline, PipelineEvent};
//!
//! let mut pipeline = ClassificationPipeline::new(backend, 5);
//! pipeline.start(&user, &messages);
//!
//! while let Some(event) = pipeline.next_event().await {
//!     if let PipelineEvent::Progress { completed, total, .. } = event {
//!         println!("{completed}/{total}");
//!     }
//! }
//! ```

mod index;
mod run;

pub use index::{ClassificationIndex, PipelineRun, RunId};
pub use run::{
    ClassificationFailure, ClassificationPipeline, DEFAULT_BATCH_SIZE, PipelineEvent, RunReport,
};
