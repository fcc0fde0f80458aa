//! Episode driving: stepping an engine until every agent has arrived.
//!
//! The [`TrajectoryCollector`] runs the fixed-timestep control loop:
//!   1. advance the engine by one tick,
//!   2. read and record the position of every agent still under way,
//!   3. stop agents that are within tolerance of their goal,
//!   4. steer the rest toward their goal at a bounded preferred speed.
//!
//! The episode ends once every agent has arrived or the step cap is hit.
//! Agents that never arrive simply keep a trajectory that runs to the cap.

use anyhow::{bail, Result};
use rand::RngCore;
use uuid::Uuid;

use crate::config::DriverConfig;
use crate::engine::SimulationEngine;
use crate::geometry::{cap_magnitude, Vec2};
use crate::scenario::{generate, RetryPolicy, Scenario, ScenarioGenerator};
use crate::trajectory::types::{AgentTrajectory, Episode};

/// Drives single episodes against a [`SimulationEngine`].
#[derive(Debug, Clone)]
pub struct TrajectoryCollector {
    /// Tick budget per episode.
    max_steps: usize,
    /// Arrival radius around each goal.
    goal_tolerance: f64,
    /// Ceiling on the preferred speed handed to the engine.
    max_pref_speed: f64,
}

impl TrajectoryCollector {
    pub fn new(max_steps: usize, goal_tolerance: f64, max_pref_speed: f64) -> Self {
        Self {
            max_steps,
            goal_tolerance,
            max_pref_speed,
        }
    }

    pub fn from_config(config: &DriverConfig) -> Self {
        Self::new(config.max_steps, config.goal_tolerance, config.max_pref_speed)
    }

    /// Generate a scenario into a fresh `engine` and run it to completion.
    pub fn simulate<G, E>(
        &self,
        generator: &G,
        num_agents: usize,
        engine: &mut E,
        rng: &mut dyn RngCore,
        retry: RetryPolicy,
    ) -> Result<Episode>
    where
        G: ScenarioGenerator + ?Sized,
        E: SimulationEngine + ?Sized,
    {
        let scenario = generate(generator, num_agents, engine, rng, retry)?;
        self.run_episode(engine, &scenario)
    }

    /// Run an already registered scenario.
    ///
    /// The engine must hold exactly the scenario's agents, registered in
    /// scenario order.
    pub fn run_episode<E>(&self, engine: &mut E, scenario: &Scenario) -> Result<Episode>
    where
        E: SimulationEngine + ?Sized,
    {
        let num_agents = scenario.len();
        if engine.num_agents() != num_agents {
            bail!(
                "engine holds {} agents but the scenario has {num_agents}",
                engine.num_agents()
            );
        }

        let mut trajectories = vec![AgentTrajectory::new(); num_agents];
        let mut step_count = 0;

        for tick in 1..=self.max_steps {
            engine.do_step();
            step_count = tick;

            for (id, (agent, trajectory)) in
                scenario.agents.iter().zip(trajectories.iter_mut()).enumerate()
            {
                if trajectory.reached() {
                    continue;
                }

                let position = engine.agent_position(id)?;
                trajectory.positions.push(position);

                let to_goal = agent.goal - position;
                if to_goal.norm() < self.goal_tolerance {
                    trajectory.reached_at = Some(tick);
                    engine.set_agent_pref_velocity(id, Vec2::zeros())?;
                } else {
                    let velocity = cap_magnitude(to_goal, self.max_pref_speed);
                    engine.set_agent_pref_velocity(id, velocity)?;
                }
            }

            if trajectories.iter().all(AgentTrajectory::reached) {
                break;
            }
        }

        let episode = Episode {
            id: Uuid::new_v4().to_string(),
            pattern: scenario.pattern.clone(),
            trajectories,
            step_count,
        };

        if !episode.all_reached() {
            tracing::warn!(
                episode = %episode.id,
                reached = episode.reached_count(),
                agents = num_agents,
                steps = step_count,
                "step cap hit before every agent arrived"
            );
        }

        Ok(episode)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
