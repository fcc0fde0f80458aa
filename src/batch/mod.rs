//! Batch orchestration across many episodes.
//!
//! - [`offsets::Offsets`] -- the `(agent_id, frame)` accumulator threaded
//!   between episodes.
//! - [`orchestrator::BatchOrchestrator`] -- runs a named preset sequentially
//!   or with an ordered concurrent window.

pub mod offsets;
pub mod orchestrator;

pub use offsets::Offsets;
pub use orchestrator::{BatchOrchestrator, BatchSummary, EpisodeJob, RunMode};
