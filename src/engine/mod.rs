//! Simulation engine abstraction and the engines that ship with the crate.
//!
//! The episode driver only talks to engines through the [`SimulationEngine`]
//! trait (`add_agent`, `set_agent_pref_velocity`, `do_step`,
//! `agent_position`), so any multi-agent avoidance engine can be wrapped.
//!
//! Included engines:
//! - **Kinematic** ([`kinematic`]) -- integrates preferred velocities under a
//!   speed ceiling, without avoidance.
//! - **Scripted** ([`scripted`]) -- replays fixed positions and records the
//!   velocities it is sent, for tests.

pub mod kinematic;
pub mod scripted;
pub mod traits;

pub use kinematic::KinematicEngine;
pub use scripted::{ScriptedEngine, VelocityCommand};
pub use traits::{EngineParams, EngineProfile, SimulationEngine};
