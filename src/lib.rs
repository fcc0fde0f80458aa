//! trajsynth: synthetic multi-agent pedestrian trajectories.
//!
//! Drives a multi-agent velocity-obstacle engine through randomised crossing
//! scenes, records every agent's path, and appends the episodes to one text
//! dataset with continuous frame and agent numbering.

pub mod batch;
pub mod config;
pub mod engine;
pub mod geometry;
pub mod scenario;
pub mod trajectory;
