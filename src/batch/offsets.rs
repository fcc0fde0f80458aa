//! The running `(agent_id, frame)` offsets that stitch episodes into one
//! dataset.

use serde::{Deserialize, Serialize};

use crate::trajectory::DatasetStats;

/// Offsets to apply to the next episode written.
///
/// Threaded explicitly through the batch: each flush consumes the current
/// value and returns the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offsets {
    /// First agent id of the next episode.
    pub agent_id: u64,
    /// First frame of the next episode.
    pub frame: u64,
}

impl Offsets {
    /// Offsets for the episode after one with `num_agents` agents whose last
    /// written frame was `last_frame`.
    ///
    /// Frames resume `frame_gap` after the last written frame. An episode
    /// that wrote nothing leaves the frame offset unchanged, but its agent
    /// ids are still consumed.
    pub fn advance(self, num_agents: usize, last_frame: Option<u64>, frame_gap: u64) -> Self {
        Self {
            agent_id: self.agent_id + num_agents as u64,
            frame: last_frame.map_or(self.frame, |last| last + frame_gap),
        }
    }

    /// Offsets that continue a dataset already holding `stats`.
    pub fn resume(stats: &DatasetStats, frame_gap: u64) -> Self {
        Self {
            agent_id: stats.max_agent_id.map_or(0, |id| id + 1),
            frame: stats.max_frame.map_or(0, |last| last + frame_gap),
        }
    }
}
