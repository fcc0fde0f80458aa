//! Core engine trait and its configuration types.
//!
//! Every velocity-obstacle engine (or test stand-in) implements the
//! [`SimulationEngine`] trait so that the episode driver can step it
//! uniformly.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::PresetEntry;
use crate::geometry::Vec2;

/// Static parameters an engine is configured with for one episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineParams {
    /// Simulated seconds per tick.
    pub time_step: f64,
    /// Radius within which other agents are considered neighbours.
    pub neighbor_dist: f64,
    /// Maximum number of neighbours taken into account.
    pub max_neighbors: usize,
    /// Look-ahead horizon for agent-agent avoidance (the reaction time).
    pub time_horizon: f64,
    /// Look-ahead horizon for static obstacles.
    pub time_horizon_obst: f64,
    /// Agent body radius.
    pub radius: f64,
    /// Speed ceiling applied by the engine.
    pub max_speed: f64,
}

/// Named engine configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineProfile {
    /// Fine-grained 60 Hz stepping with a short horizon.
    Default,
    /// Neighbour distance and horizon follow the preset's clearance and
    /// reaction time.
    CollisionAvoidance,
    /// Tuned for the circle-lattice scenes.
    Circle,
    /// Long horizon, slow agents; tuned for randomised circle crossings.
    RandomCircle,
}

impl EngineProfile {
    /// Resolve the profile into concrete parameters for one preset entry.
    pub fn params(&self, entry: &PresetEntry) -> EngineParams {
        match self {
            Self::Default => EngineParams {
                time_step: 1.0 / 60.0,
                neighbor_dist: 1.5,
                max_neighbors: 5,
                time_horizon: 1.5,
                time_horizon_obst: 2.0,
                radius: 0.4,
                max_speed: 2.0,
            },
            Self::CollisionAvoidance => EngineParams {
                time_step: 1.0 / 2.5,
                neighbor_dist: entry.min_clearance,
                max_neighbors: 10,
                time_horizon: entry.reaction_time,
                time_horizon_obst: 2.0,
                radius: 0.4,
                max_speed: 2.0,
            },
            Self::Circle => EngineParams {
                time_step: 1.0 / 2.5,
                neighbor_dist: 2.0,
                max_neighbors: 10,
                time_horizon: 2.0,
                time_horizon_obst: 2.0,
                radius: 0.4,
                max_speed: 1.2,
            },
            Self::RandomCircle => EngineParams {
                time_step: 1.0 / 4.0,
                neighbor_dist: 10.0,
                max_neighbors: 10,
                time_horizon: 5.0,
                time_horizon_obst: 5.0,
                radius: 0.3,
                max_speed: 1.0,
            },
        }
    }
}

/// The capability the driver needs from a multi-agent avoidance engine.
///
/// Agent ids are handed out in call order starting at 0. `Send` lets the
/// orchestrator move an engine onto a blocking worker thread.
pub trait SimulationEngine: Send {
    /// Short name used in logs and test-mode output file names.
    const LABEL: &'static str;

    /// Register an agent at `position` and return its id.
    fn add_agent(&mut self, position: Vec2) -> usize;

    /// Set the velocity the agent would take absent any avoidance.
    fn set_agent_pref_velocity(&mut self, agent_id: usize, velocity: Vec2) -> Result<()>;

    /// Advance every agent by one tick.
    fn do_step(&mut self);

    /// Current position of an agent.
    fn agent_position(&self, agent_id: usize) -> Result<Vec2>;

    /// Number of registered agents.
    fn num_agents(&self) -> usize;
}
