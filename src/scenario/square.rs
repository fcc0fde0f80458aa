//! Square-crossing scenes: agents cross laterally between the two halves of a
//! square.
//!
//! Agents are placed one after another, so an unlucky early placement can
//! leave no room for a later one. Each placement therefore gets a bounded
//! budget, and a scene whose placement runs dry is discarded and redrawn from
//! scratch. The caller's [`RetryPolicy`] bounds the number of scene draws.

use anyhow::{Context, Result};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::sampling::{is_clear_of, sample_until, RetryPolicy};
use super::types::{AgentSpec, ScenarioGenerator};
use crate::geometry::{vec2, Vec2};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquareCrossing {
    /// Side length of the square, centred on the origin.
    pub width: f64,
    /// Minimum start-to-start and goal-to-goal distance.
    pub clearance: f64,
    /// Draws allowed for one start or goal before the scene is redrawn.
    #[serde(default = "default_placement_attempts")]
    pub placement_attempts: usize,
}

fn default_placement_attempts() -> usize {
    1000
}

impl Default for SquareCrossing {
    fn default() -> Self {
        Self {
            width: 12.0,
            clearance: 4.0,
            placement_attempts: default_placement_attempts(),
        }
    }
}

impl SquareCrossing {
    /// A point in the half of the square selected by `side` (+1 right, -1 left).
    fn draw(&self, side: f64, rng: &mut dyn RngCore) -> Vec2 {
        vec2(
            rng.gen::<f64>() * self.width * 0.5 * side,
            (rng.gen::<f64>() - 0.5) * self.width,
        )
    }

    /// Place every agent in one pass, or `None` if some placement ran out of
    /// draws.
    fn place_scene(&self, num_agents: usize, rng: &mut dyn RngCore) -> Option<Vec<AgentSpec>> {
        let placement = RetryPolicy::bounded(self.placement_attempts);
        let mut agents: Vec<AgentSpec> = Vec::with_capacity(num_agents);

        for _ in 0..num_agents {
            let side = if rng.gen::<f64>() > 0.5 { -1.0 } else { 1.0 };

            let start = sample_until(
                placement,
                || self.draw(side, rng),
                |c| is_clear_of(c, agents.iter().map(|a| &a.start), self.clearance),
            )
            .ok()?;
            let goal = sample_until(
                placement,
                || self.draw(-side, rng),
                |c| is_clear_of(c, agents.iter().map(|a| &a.goal), self.clearance),
            )
            .ok()?;
            agents.push(AgentSpec::new(start, goal));
        }

        Some(agents)
    }
}

impl ScenarioGenerator for SquareCrossing {
    fn name(&self) -> &'static str {
        "square_crossing"
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
        sample_until(retry, || self.place_scene(num_agents, rng), Option::is_some)?
            .context("square-crossing scene accepted without agents")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::min_pairwise_distance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn start_and_goal_sit_on_opposite_halves() {
        let pattern = SquareCrossing::default();
        let mut rng = StdRng::seed_from_u64(5);
        let agents = pattern.sample(8, &mut rng, RetryPolicy::unbounded()).unwrap();
        let half = pattern.width * 0.5;
        for a in &agents {
            assert!(a.start.x * a.goal.x <= 0.0);
            assert!(a.start.x.abs() <= half && a.start.y.abs() <= half);
            assert!(a.goal.x.abs() <= half && a.goal.y.abs() <= half);
        }
    }

    #[test]
    fn starts_and_goals_keep_clearance() {
        let pattern = SquareCrossing::default();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let agents = pattern.sample(6, &mut rng, RetryPolicy::unbounded()).unwrap();
            let starts: Vec<Vec2> = agents.iter().map(|a| a.start).collect();
            let goals: Vec<Vec2> = agents.iter().map(|a| a.goal).collect();
            assert!(min_pairwise_distance(&starts).unwrap() >= pattern.clearance);
            assert!(min_pairwise_distance(&goals).unwrap() >= pattern.clearance);
        }
    }

    #[test]
    fn full_batch_size_terminates_with_defaults() {
        let pattern = SquareCrossing::default();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let agents = pattern.sample(10, &mut rng, RetryPolicy::unbounded()).unwrap();
            assert_eq!(agents.len(), 10);
            let starts: Vec<Vec2> = agents.iter().map(|a| a.start).collect();
            let goals: Vec<Vec2> = agents.iter().map(|a| a.goal).collect();
            assert!(min_pairwise_distance(&starts).unwrap() >= pattern.clearance);
            assert!(min_pairwise_distance(&goals).unwrap() >= pattern.clearance);
        }
    }

    #[test]
    fn same_seed_gives_same_scene() {
        let pattern = SquareCrossing::default();
        let first = pattern
            .sample(10, &mut StdRng::seed_from_u64(9), RetryPolicy::unbounded())
            .unwrap();
        let second = pattern
            .sample(10, &mut StdRng::seed_from_u64(9), RetryPolicy::unbounded())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn overcrowded_square_errors_when_bounded() {
        let pattern = SquareCrossing {
            width: 2.0,
            clearance: 4.0,
            placement_attempts: 100,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let err = pattern
            .sample(3, &mut rng, RetryPolicy::bounded(20))
            .unwrap_err();
        assert!(err.to_string().contains("20 attempts"));
    }
}
