//! Circle-crossing scenes: agents start on a ring and walk to the antipode.

use std::f64::consts::TAU;

use anyhow::Result;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::sampling::{is_clear_of, sample_until, RetryPolicy};
use super::types::{AgentSpec, ScenarioGenerator};
use crate::geometry::{vec2, Vec2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleCrossing {
    /// Ring radius.
    pub radius: f64,
    /// Minimum distance between a candidate and earlier agents.
    pub clearance: f64,
    /// Nominal preferred speed; positional noise is uniform in
    /// `[-jitter / 2, jitter / 2)` on each axis.
    pub jitter: f64,
}

impl Default for CircleCrossing {
    fn default() -> Self {
        Self {
            radius: 4.0,
            clearance: 0.8,
            jitter: 1.0,
        }
    }
}

impl CircleCrossing {
    fn draw(&self, rng: &mut dyn RngCore) -> Vec2 {
        let angle = rng.gen::<f64>() * TAU;
        let noise_x = (rng.gen::<f64>() - 0.5) * self.jitter;
        let noise_y = (rng.gen::<f64>() - 0.5) * self.jitter;
        vec2(
            self.radius * angle.cos() + noise_x,
            self.radius * angle.sin() + noise_y,
        )
    }
}

impl ScenarioGenerator for CircleCrossing {
    fn name(&self) -> &'static str {
        "circle_crossing"
    }

    fn clearance(&self) -> f64 {
        self.clearance
    }

    fn sample(
        &self,
        num_agents: usize,
        rng: &mut dyn RngCore,
        retry: RetryPolicy,
    ) -> Result<Vec<AgentSpec>> {
        let mut agents: Vec<AgentSpec> = Vec::with_capacity(num_agents);

        // Goals are antipodal, so goal-to-goal distance equals start-to-start
        // distance and only the start needs checking against earlier goals.
        for _ in 0..num_agents {
            let start = sample_until(
                retry,
                || self.draw(rng),
                |candidate| {
                    is_clear_of(candidate, agents.iter().map(|a| &a.start), self.clearance)
                        && is_clear_of(candidate, agents.iter().map(|a| &a.goal), self.clearance)
                },
            )?;
            agents.push(AgentSpec::new(start, -start));
        }

        Ok(agents)
    }
}
