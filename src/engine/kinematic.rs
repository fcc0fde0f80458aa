//! A kinematic stand-in for a velocity-obstacle engine.
//!
//! [`KinematicEngine`] moves every agent along its preferred velocity, clamped
//! to the configured maximum speed, and integrates over one time step per
//! tick. It resolves no pairwise constraints: scenes recorded with it show
//! goal-seeking without avoidance. Production datasets plug a real avoidance
//! engine in through [`SimulationEngine`].

use anyhow::{anyhow, Result};

use super::traits::{EngineParams, SimulationEngine};
use crate::geometry::{cap_magnitude, Vec2};

#[derive(Debug, Clone)]
struct KinematicAgent {
    position: Vec2,
    pref_velocity: Vec2,
}

#[derive(Debug, Clone)]
pub struct KinematicEngine {
    params: EngineParams,
    agents: Vec<KinematicAgent>,
    /// Number of ticks executed so far.
    ticks: usize,
}

impl KinematicEngine {
    pub fn new(params: EngineParams) -> Self {
        Self {
            params,
            agents: Vec::new(),
            ticks: 0,
        }
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    /// Simulated time elapsed since construction.
    pub fn global_time(&self) -> f64 {
        self.ticks as f64 * self.params.time_step
    }

    fn agent(&self, agent_id: usize) -> Result<&KinematicAgent> {
        let registered = self.agents.len();
        self.agents
            .get(agent_id)
            .ok_or_else(|| anyhow!("unknown agent id {agent_id} ({registered} registered)"))
    }
}

impl SimulationEngine for KinematicEngine {
    const LABEL: &'static str = "kinematic";

    fn add_agent(&mut self, position: Vec2) -> usize {
        self.agents.push(KinematicAgent {
            position,
            pref_velocity: Vec2::zeros(),
        });
        self.agents.len() - 1
    }

    fn set_agent_pref_velocity(&mut self, agent_id: usize, velocity: Vec2) -> Result<()> {
        let count = self.agents.len();
        let agent = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| anyhow!("unknown agent id {agent_id} ({count} registered)"))?;
        agent.pref_velocity = velocity;
        Ok(())
    }

    fn do_step(&mut self) {
        let dt = self.params.time_step;
        let max_speed = self.params.max_speed;
        for agent in &mut self.agents {
            let velocity = cap_magnitude(agent.pref_velocity, max_speed);
            agent.position += velocity * dt;
        }
        self.ticks += 1;
    }

    fn agent_position(&self, agent_id: usize) -> Result<Vec2> {
        Ok(self.agent(agent_id)?.position)
    }

    fn num_agents(&self) -> usize {
        self.agents.len()
    }
}
