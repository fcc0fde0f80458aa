//! Core trajectory data types recorded by the episode driver.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

// ---------------------------------------------------------------------------
// Per-agent trajectory
// ---------------------------------------------------------------------------

/// Engine-produced positions of one agent, one per retained tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentTrajectory {
    /// Ordered positions; index `t` is the position after tick `t + 1`.
    pub positions: Vec<Vec2>,
    /// Tick (1-based) on which the agent came within tolerance of its goal.
    pub reached_at: Option<usize>,
}

impl AgentTrajectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn last(&self) -> Option<&Vec2> {
        self.positions.last()
    }

    pub fn reached(&self) -> bool {
        self.reached_at.is_some()
    }
}

// ---------------------------------------------------------------------------
// Full episode
// ---------------------------------------------------------------------------

/// The outcome of running one scenario to arrival or the step cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Unique identifier (UUID v4), used to correlate log lines.
    pub id: String,
    /// Pattern label of the scenario that was simulated.
    pub pattern: String,
    /// One trajectory per agent, in engine id order.
    pub trajectories: Vec<AgentTrajectory>,
    /// Ticks executed.
    pub step_count: usize,
}

impl Episode {
    pub fn num_agents(&self) -> usize {
        self.trajectories.len()
    }

    /// Whether every agent arrived before the step cap.
    pub fn all_reached(&self) -> bool {
        self.trajectories.iter().all(AgentTrajectory::reached)
    }

    pub fn reached_count(&self) -> usize {
        self.trajectories.iter().filter(|t| t.reached()).count()
    }

    /// Total number of recorded positions across all agents.
    pub fn num_samples(&self) -> usize {
        self.trajectories.iter().map(AgentTrajectory::len).sum()
    }

    /// Length of the longest trajectory.
    pub fn longest(&self) -> usize {
        self.trajectories
            .iter()
            .map(AgentTrajectory::len)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::vec2;

    fn trajectory(len: usize, reached_at: Option<usize>) -> AgentTrajectory {
        AgentTrajectory {
            positions: (0..len).map(|t| vec2(t as f64, 0.0)).collect(),
            reached_at,
        }
    }

    #[test]
    fn episode_summaries() {
        let episode = Episode {
            id: "ep".into(),
            pattern: "circle_crossing".into(),
            trajectories: vec![trajectory(3, Some(3)), trajectory(5, None)],
            step_count: 5,
        };
        assert_eq!(episode.num_agents(), 2);
        assert_eq!(episode.num_samples(), 8);
        assert_eq!(episode.longest(), 5);
        assert_eq!(episode.reached_count(), 1);
        assert!(!episode.all_reached());
    }

    #[test]
    fn empty_episode_has_no_longest() {
        let episode = Episode {
            id: "ep".into(),
            pattern: "lattice_line".into(),
            trajectories: Vec::new(),
            step_count: 0,
        };
        assert_eq!(episode.longest(), 0);
        assert!(episode.all_reached());
    }
}
