//! Backend service seam.
//!
//! Every component above the transport talks to the backend through
//! [`TriageBackend`], so tests can swap the HTTP client for a scripted one.

mod backend;

pub use backend::TriageBackend;
