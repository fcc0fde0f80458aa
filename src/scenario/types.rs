//! Scenario data types and the generator trait.

use anyhow::Result;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::sampling::RetryPolicy;
use crate::geometry::{min_pairwise_distance, Vec2};

/// Start and goal of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub start: Vec2,
    pub goal: Vec2,
    /// Velocity sample at spawn; every generator emits zero.
    pub initial_velocity: Vec2,
}

impl AgentSpec {
    pub fn new(start: Vec2, goal: Vec2) -> Self {
        Self {
            start,
            goal,
            initial_velocity: Vec2::zeros(),
        }
    }
}

/// Initial placement and goals for every agent of one episode.
///
/// Agent `i` of the scenario is engine agent `i` once registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Label of the pattern that produced the scenario.
    pub pattern: String,
    /// Clearance the pattern guaranteed between start positions.
    pub clearance: f64,
    pub agents: Vec<AgentSpec>,
}

impl Scenario {
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn starts(&self) -> Vec<Vec2> {
        self.agents.iter().map(|a| a.start).collect()
    }

    pub fn initial_velocities(&self) -> Vec<Vec2> {
        self.agents.iter().map(|a| a.initial_velocity).collect()
    }

    /// One-element trajectories holding each agent's start position.
    pub fn seed_trajectories(&self) -> Vec<Vec<Vec2>> {
        self.agents.iter().map(|a| vec![a.start]).collect()
    }

    /// Smallest start-to-start distance, `None` for fewer than two agents.
    pub fn min_start_separation(&self) -> Option<f64> {
        min_pairwise_distance(&self.starts())
    }
}

/// A spatial pattern that can place `num_agents` agents.
///
/// Implementations only sample positions; registering the agents with an
/// engine is done by [`super::generate`] so every pattern shares the same
/// id-ordering guarantee.
pub trait ScenarioGenerator {
    /// Short label written into logs and file names.
    fn name(&self) -> &'static str;

    /// Minimum start-to-start distance the pattern guarantees.
    fn clearance(&self) -> f64;

    /// Sample starts and goals for `num_agents` agents.
    fn sample(
        &self,
        num_agents: usize,
        rng: &mut dyn RngCore,
        retry: RetryPolicy,
    ) -> Result<Vec<AgentSpec>>;
}
