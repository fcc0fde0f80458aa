//! Scenario generation: where agents spawn and where they are headed.
//!
//! This module provides:
//! - [`sampling`] -- the rejection-sampling combinator and clearance checks.
//! - [`types::Scenario`], [`types::AgentSpec`] -- one episode's placement.
//! - The patterns: [`circle::CircleCrossing`], [`square::SquareCrossing`],
//!   [`lattice::LatticeLine`] and [`lattice::LatticeCircle`].
//! - [`generate`] -- samples a pattern and registers every agent with an
//!   engine in list order.

pub mod circle;
pub mod lattice;
pub mod sampling;
pub mod square;
pub mod types;

use anyhow::{bail, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::engine::SimulationEngine;

pub use circle::CircleCrossing;
pub use lattice::{LatticeCircle, LatticeLine};
pub use sampling::{is_clear_of, sample_until, RetryPolicy};
pub use square::SquareCrossing;
pub use types::{AgentSpec, Scenario, ScenarioGenerator};

// ---------------------------------------------------------------------------
// ScenarioPattern: enum dispatch over the concrete patterns
// ---------------------------------------------------------------------------

/// The configurable choice of spatial pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioPattern {
    CircleCrossing(CircleCrossing),
    SquareCrossing(SquareCrossing),
    LatticeLine(LatticeLine),
    LatticeCircle(LatticeCircle),
}

impl ScenarioGenerator for ScenarioPattern {
    fn name(&self) -> &'static str {
        match self {
            Self::CircleCrossing(p) => p.name(),
            Self::SquareCrossing(p) => p.name(),
            Self::LatticeLine(p) => p.name(),
            Self::LatticeCircle(p) => p.name(),
        }
    }

    fn clearance(&self) -> f64 {
        match self {
            Self::CircleCrossing(p) => p.clearance(),
            Self::SquareCrossing(p) => p.clearance(),
            Self::LatticeLine(p) => p.clearance(),
            Self::LatticeCircle(p) => p.clearance(),
        }
    }

    fn sample(
        &self,
        num_agents: usize,
        rng: &mut dyn RngCore,
        retry: RetryPolicy,
    ) -> Result<Vec<AgentSpec>> {
        match self {
            Self::CircleCrossing(p) => p.sample(num_agents, rng, retry),
            Self::SquareCrossing(p) => p.sample(num_agents, rng, retry),
            Self::LatticeLine(p) => p.sample(num_agents, rng, retry),
            Self::LatticeCircle(p) => p.sample(num_agents, rng, retry),
        }
    }
}

/// Sample a scenario for `num_agents` agents and register each start
/// position with `engine`, in list order.
///
/// Fails if the engine hands out an id that differs from the agent's index,
/// since the driver addresses agents by index.
pub fn generate<G, E>(
    generator: &G,
    num_agents: usize,
    engine: &mut E,
    rng: &mut dyn RngCore,
    retry: RetryPolicy,
) -> Result<Scenario>
where
    G: ScenarioGenerator + ?Sized,
    E: SimulationEngine + ?Sized,
{
    let agents = generator.sample(num_agents, rng, retry)?;
    if agents.len() != num_agents {
        bail!(
            "{} produced {} agents, expected {num_agents}",
            generator.name(),
            agents.len()
        );
    }

    for (index, agent) in agents.iter().enumerate() {
        let id = engine.add_agent(agent.start);
        if id != index {
            bail!("engine assigned id {id} to agent {index}");
        }
    }

    let scenario = Scenario {
        pattern: generator.name().to_string(),
        clearance: generator.clearance(),
        agents,
    };
    tracing::debug!(
        pattern = generator.name(),
        agents = num_agents,
        min_separation = ?scenario.min_start_separation(),
        "scenario generated"
    );

    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScriptedEngine;
    use crate::geometry::distance;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generate_registers_agents_in_order() {
        let mut engine = ScriptedEngine::new(Vec::new());
        let mut rng = StdRng::seed_from_u64(21);
        let pattern = ScenarioPattern::CircleCrossing(CircleCrossing::default());

        let scenario =
            generate(&pattern, 4, &mut engine, &mut rng, RetryPolicy::unbounded()).unwrap();

        assert_eq!(engine.num_agents(), 4);
        for (i, agent) in scenario.agents.iter().enumerate() {
            assert_eq!(engine.agent_position(i).unwrap(), agent.start);
        }
        assert_eq!(scenario.pattern, "circle_crossing");
        assert_eq!(scenario.seed_trajectories()[2], vec![scenario.agents[2].start]);
        assert!(scenario.initial_velocities().iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn engine_with_existing_agents_is_rejected() {
        let mut engine = ScriptedEngine::new(Vec::new());
        engine.add_agent(crate::geometry::vec2(50.0, 50.0));
        let mut rng = StdRng::seed_from_u64(1);
        let pattern = ScenarioPattern::SquareCrossing(SquareCrossing::default());

        let err = generate(&pattern, 2, &mut engine, &mut rng, RetryPolicy::unbounded())
            .unwrap_err();
        assert!(err.to_string().contains("assigned id 1"));
    }

    #[test]
    fn two_agent_circle_crossing() {
        let pattern = ScenarioPattern::CircleCrossing(CircleCrossing {
            radius: 4.0,
            clearance: 0.8,
            ..CircleCrossing::default()
        });
        for seed in 0..50 {
            let mut engine = ScriptedEngine::new(Vec::new());
            let mut rng = StdRng::seed_from_u64(seed);
            let scenario =
                generate(&pattern, 2, &mut engine, &mut rng, RetryPolicy::unbounded()).unwrap();

            let [a, b] = [scenario.agents[0], scenario.agents[1]];
            assert!(distance(&a.start, &b.start) >= 0.8);
            assert_eq!(a.goal, -a.start);
            assert_eq!(b.goal, -b.start);
            assert!(scenario.min_start_separation().unwrap() >= scenario.clearance);
        }
    }

    #[test]
    fn pattern_deserializes_from_tagged_json() {
        let json = r#"{"kind":"square_crossing","width":10.0,"clearance":3.0}"#;
        let pattern: ScenarioPattern = serde_json::from_str(json).unwrap();
        assert_eq!(
            pattern,
            ScenarioPattern::SquareCrossing(SquareCrossing {
                width: 10.0,
                clearance: 3.0,
                ..SquareCrossing::default()
            })
        );
        assert_eq!(pattern.name(), "square_crossing");
    }
}
