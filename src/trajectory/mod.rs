//! Trajectory recording and dataset output.
//!
//! This module provides:
//! - [`types::AgentTrajectory`], [`types::Episode`] -- what one simulated
//!   episode produced.
//! - [`collector::TrajectoryCollector`] -- the per-tick control loop that
//!   steers agents to their goals and records their positions.
//! - [`writer::DatasetWriter`] -- appends episodes to the shared text dataset
//!   with frame and agent offsets.

pub mod collector;
pub mod types;
pub mod writer;

// Re-export the most commonly used items at the module level.
pub use collector::TrajectoryCollector;
pub use types::{AgentTrajectory, Episode};
pub use writer::{read_records, DatasetRecord, DatasetStats, DatasetWriter};
