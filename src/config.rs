use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::engine::EngineProfile;
use crate::scenario::{CircleCrossing, RetryPolicy, ScenarioPattern};

/// Complete configuration for a dataset synthesis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    pub batch: BatchConfig,
    pub driver: DriverConfig,
    pub engine: EngineConfig,
    pub scenario: ScenarioConfig,
    /// Named difficulty levels, each a list of parameter pairs run in order.
    pub presets: BTreeMap<String, Vec<PresetEntry>>,
}

/// Batch sizing and output placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Agents per episode (default: 10).
    pub num_agents: usize,
    /// Episodes per preset entry in a full run (default: 300).
    pub full_episodes: usize,
    /// Episodes per preset entry in a smoke-test run (default: 10).
    pub test_episodes: usize,
    /// Empty frames left between consecutive episodes (default: 5).
    pub frame_gap: u64,
    /// Directory the dataset files are written into.
    pub output_dir: String,
    /// Base seed; drawn from the OS when absent.
    pub seed: Option<u64>,
}

/// Per-tick control loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Tick budget per episode (default: 3000).
    pub max_steps: usize,
    /// Distance below which an agent counts as arrived (default: 1.0).
    pub goal_tolerance: f64,
    /// Cap on the preferred speed sent to the engine (default: 1.0).
    pub max_pref_speed: f64,
}

/// Engine construction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub profile: EngineProfile,
}

/// Scenario pattern and sampler guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub pattern: ScenarioPattern,
    /// Give up rejection sampling after this many draws per sampling loop
    /// (whole-scene draws for square crossing). Unlimited when absent.
    #[serde(default)]
    pub max_attempts: Option<usize>,
}

impl ScenarioConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        match self.max_attempts {
            Some(n) => RetryPolicy::bounded(n),
            None => RetryPolicy::unbounded(),
        }
    }
}

/// One `(min_clearance, reaction_time)` pair of a preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetEntry {
    pub min_clearance: f64,
    pub reaction_time: f64,
}

impl PresetEntry {
    pub fn new(min_clearance: f64, reaction_time: f64) -> Self {
        Self {
            min_clearance,
            reaction_time,
        }
    }
}

impl SynthConfig {
    /// Load a JSON config file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Look up a preset by name, rejecting unknown or empty presets.
    pub fn preset(&self, name: &str) -> Result<&[PresetEntry]> {
        match self.presets.get(name) {
            Some(entries) if entries.is_empty() => bail!("preset '{name}' has no entries"),
            Some(entries) => Ok(entries.as_slice()),
            None => {
                let known: Vec<&str> = self.presets.keys().map(String::as_str).collect();
                bail!("unknown preset '{name}' (available: {})", known.join(", "))
            }
        }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        let mut presets = BTreeMap::new();
        presets.insert("close".to_string(), vec![PresetEntry::new(3.0, 1.0)]);
        presets.insert("medium1".to_string(), vec![PresetEntry::new(2.0, 2.5)]);
        presets.insert("medium2".to_string(), vec![PresetEntry::new(3.0, 2.0)]);
        presets.insert(
            "medium".to_string(),
            vec![PresetEntry::new(2.0, 2.5), PresetEntry::new(3.0, 2.0)],
        );
        presets.insert("far".to_string(), vec![PresetEntry::new(4.0, 2.0)]);

        Self {
            batch: BatchConfig {
                num_agents: 10,
                full_episodes: 300,
                test_episodes: 10,
                frame_gap: 5,
                output_dir: "data/raw/controlled".into(),
                seed: None,
            },
            driver: DriverConfig {
                max_steps: 3000,
                goal_tolerance: 1.0,
                max_pref_speed: 1.0,
            },
            engine: EngineConfig {
                profile: EngineProfile::CollisionAvoidance,
            },
            scenario: ScenarioConfig {
                pattern: ScenarioPattern::CircleCrossing(CircleCrossing::default()),
                max_attempts: None,
            },
            presets,
        }
    }
}
