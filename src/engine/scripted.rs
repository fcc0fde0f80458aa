//! Deterministic engine that replays scripted positions.
//!
//! Each agent follows its own list of positions, one per tick; once the list
//! runs out the agent holds its last scripted position. Agents without a
//! script stay where they were added. Every preferred velocity the engine
//! receives is logged so tests can inspect what the driver asked for.

use anyhow::{anyhow, Result};

use super::traits::SimulationEngine;
use crate::geometry::Vec2;

/// One `set_agent_pref_velocity` call as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityCommand {
    /// Ticks completed when the command arrived.
    pub tick: usize,
    pub agent_id: usize,
    pub velocity: Vec2,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedEngine {
    /// Positions per agent, indexed by tick - 1.
    scripts: Vec<Vec<Vec2>>,
    spawn: Vec<Vec2>,
    ticks: usize,
    commands: Vec<VelocityCommand>,
}

impl ScriptedEngine {
    pub fn new(scripts: Vec<Vec<Vec2>>) -> Self {
        Self {
            scripts,
            ..Self::default()
        }
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn commands(&self) -> &[VelocityCommand] {
        &self.commands
    }
}

impl SimulationEngine for ScriptedEngine {
    const LABEL: &'static str = "scripted";

    fn add_agent(&mut self, position: Vec2) -> usize {
        self.spawn.push(position);
        self.spawn.len() - 1
    }

    fn set_agent_pref_velocity(&mut self, agent_id: usize, velocity: Vec2) -> Result<()> {
        if agent_id >= self.spawn.len() {
            return Err(anyhow!("unknown agent id {agent_id}"));
        }
        self.commands.push(VelocityCommand {
            tick: self.ticks,
            agent_id,
            velocity,
        });
        Ok(())
    }

    fn do_step(&mut self) {
        self.ticks += 1;
    }

    fn agent_position(&self, agent_id: usize) -> Result<Vec2> {
        let spawn = self
            .spawn
            .get(agent_id)
            .ok_or_else(|| anyhow!("unknown agent id {agent_id}"))?;
        let scripted = self.scripts.get(agent_id).and_then(|script| {
            if self.ticks == 0 {
                None
            } else {
                script.get(self.ticks - 1).or_else(|| script.last())
            }
        });
        Ok(*scripted.unwrap_or(spawn))
    }

    fn num_agents(&self) -> usize {
        self.spawn.len()
    }
}
