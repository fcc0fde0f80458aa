//! Fixed-lattice scenes for controlled, low-variance training data.
//!
//! Both layouts are drawn as a whole and re-drawn until the start positions
//! keep the configured clearance.

use std::f64::consts::{PI, TAU};

use anyhow::{Context, Result};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::sampling::{sample_until, RetryPolicy};
use super::types::{AgentSpec, ScenarioGenerator};
use crate::geometry::{linspace, min_pairwise_distance, vec2, Vec2};

/// Evenly spaced columns with one agent walking up and one walking down each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeLine {
    /// Leftmost column x.
    pub x_min: f64,
    /// Rightmost column x.
    pub x_max: f64,
    /// |y| of the start rows; upward walkers start at `-start_y`.
    pub start_y: f64,
    /// Extra start offset per column for the downward walkers.
    pub column_y_step: f64,
    /// Std-dev of the x noise on the downward walkers' starts.
    pub start_x_sigma: f64,
    /// Std-dev of the x noise on the downward walkers' goals.
    pub goal_x_sigma: f64,
    /// Half-width of the uniform y noise on starts and goals.
    pub y_jitter: f64,
    pub clearance: f64,
}

impl Default for LatticeLine {
    fn default() -> Self {
        Self {
            x_min: -15.0,
            x_max: 15.0,
            start_y: 10.0,
            column_y_step: 16.0 / 9.0,
            start_x_sigma: 0.3,
            goal_x_sigma: 0.1,
            y_jitter: 0.5,
            clearance: 1.0,
        }
    }
}

impl LatticeLine {
    fn draw(
        &self,
        num_agents: usize,
        rng: &mut dyn RngCore,
        start_noise: &Normal<f64>,
        goal_noise: &Normal<f64>,
    ) -> Vec<AgentSpec> {
        let columns = linspace(self.x_min, self.x_max, num_agents.div_ceil(2));
        let mut agents = Vec::with_capacity(num_agents);

        'columns: for (i, &x) in columns.iter().enumerate() {
            for up in [true, false] {
                if agents.len() == num_agents {
                    break 'columns;
                }
                let agent = if up {
                    let start = vec2(x, -self.start_y + self.y_noise(rng));
                    let goal = vec2(x, self.start_y + self.y_noise(rng));
                    AgentSpec::new(start, goal)
                } else {
                    let start = vec2(
                        x + start_noise.sample(rng),
                        self.start_y + i as f64 * self.column_y_step + self.y_noise(rng),
                    );
                    let goal = vec2(x + goal_noise.sample(rng), -self.start_y + self.y_noise(rng));
                    AgentSpec::new(start, goal)
                };
                agents.push(agent);
            }
        }

        agents
    }

    fn y_noise(&self, rng: &mut dyn RngCore) -> f64 {
        if self.y_jitter > 0.0 {
            rng.gen_range(-self.y_jitter..self.y_jitter)
        } else {
            0.0
        }
    }
}

impl ScenarioGenerator for LatticeLine {
    fn name(&self) -> &'static str {
        "lattice_line"
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
        let start_noise =
            Normal::new(0.0, self.start_x_sigma).context("invalid start x sigma")?;
        let goal_noise = Normal::new(0.0, self.goal_x_sigma).context("invalid goal x sigma")?;

        sample_until(
            retry,
            || self.draw(num_agents, rng, &start_noise, &goal_noise),
            |agents| starts_clear(agents, self.clearance),
        )
    }
}

/// Agents evenly spaced on a circle of randomised radius, walking to the
/// antipode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatticeCircle {
    pub center: Vec2,
    pub radius: f64,
    /// Half-width of the uniform noise added to the radius per scene.
    pub radius_jitter: f64,
    pub clearance: f64,
}

impl Default for LatticeCircle {
    fn default() -> Self {
        Self {
            center: Vec2::zeros(),
            radius: 10.0,
            radius_jitter: 3.0,
            clearance: 1.0,
        }
    }
}

impl LatticeCircle {
    fn draw(&self, num_agents: usize, rng: &mut dyn RngCore) -> Vec<AgentSpec> {
        let radius = if self.radius_jitter > 0.0 {
            self.radius + rng.gen_range(-self.radius_jitter..self.radius_jitter)
        } else {
            self.radius
        };
        let step = TAU / num_agents.max(1) as f64;

        (0..num_agents)
            .map(|k| {
                let angle = k as f64 * step;
                let start = self.center + vec2(angle.cos(), angle.sin()) * radius;
                let goal = self.center + vec2((angle + PI).cos(), (angle + PI).sin()) * radius;
                AgentSpec::new(start, goal)
            })
            .collect()
    }
}

impl ScenarioGenerator for LatticeCircle {
    fn name(&self) -> &'static str {
        "lattice_circle"
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
        sample_until(
            retry,
            || self.draw(num_agents, rng),
            |agents| starts_clear(agents, self.clearance),
        )
    }
}

fn starts_clear(agents: &[AgentSpec], clearance: f64) -> bool {
    let starts: Vec<Vec2> = agents.iter().map(|a| a.start).collect();
    min_pairwise_distance(&starts).map_or(true, |d| d >= clearance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::distance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn line_alternates_travel_direction() {
        let mut rng = StdRng::seed_from_u64(2);
        let agents = LatticeLine::default()
            .sample(8, &mut rng, RetryPolicy::unbounded())
            .unwrap();
        assert_eq!(agents.len(), 8);
        for (k, a) in agents.iter().enumerate() {
            if k % 2 == 0 {
                assert!(a.goal.y > a.start.y, "agent {k} should walk up");
            } else {
                assert!(a.goal.y < a.start.y, "agent {k} should walk down");
            }
        }
    }

    #[test]
    fn line_columns_are_evenly_spaced() {
        let mut rng = StdRng::seed_from_u64(4);
        let agents = LatticeLine::default()
            .sample(8, &mut rng, RetryPolicy::unbounded())
            .unwrap();
        // Upward walkers carry no x noise.
        let xs: Vec<f64> = agents.iter().step_by(2).map(|a| a.start.x).collect();
        assert_eq!(xs, vec![-15.0, -5.0, 5.0, 15.0]);
        for a in agents.iter().step_by(2) {
            assert_eq!(a.goal.x, a.start.x);
        }
    }

    #[test]
    fn line_handles_odd_agent_counts() {
        let mut rng = StdRng::seed_from_u64(9);
        let agents = LatticeLine::default()
            .sample(5, &mut rng, RetryPolicy::unbounded())
            .unwrap();
        assert_eq!(agents.len(), 5);
        assert!(agents[4].goal.y > agents[4].start.y);
    }

    #[test]
    fn circle_goals_mirror_through_center() {
        let pattern = LatticeCircle {
            center: vec2(1.0, -2.0),
            ..LatticeCircle::default()
        };
        let mut rng = StdRng::seed_from_u64(6);
        let agents = pattern.sample(10, &mut rng, RetryPolicy::unbounded()).unwrap();

        let r0 = distance(&agents[0].start, &pattern.center);
        assert!(r0 >= 7.0 && r0 <= 13.0);
        for a in &agents {
            let mid = (a.start + a.goal) * 0.5;
            assert!(distance(&mid, &pattern.center) < 1e-9);
            assert!((distance(&a.start, &pattern.center) - r0).abs() < 1e-9);
        }
    }

    #[test]
    fn circle_spacing_respects_clearance() {
        let pattern = LatticeCircle::default();
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let agents = pattern.sample(12, &mut rng, RetryPolicy::unbounded()).unwrap();
            assert!(starts_clear(&agents, pattern.clearance));
        }
    }

    #[test]
    fn crowded_circle_fails_when_bounded() {
        let pattern = LatticeCircle {
            radius: 1.0,
            radius_jitter: 0.0,
            ..LatticeCircle::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(pattern
            .sample(50, &mut rng, RetryPolicy::bounded(10))
            .is_err());
    }
}
