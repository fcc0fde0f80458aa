//! trajsynth: synthetic pedestrian trajectory datasets.
//!
//! Subcommands:
//!
//! - `generate` -- Run a named preset and append its episodes to a dataset
//! - `presets`  -- List the configured presets
//! - `inspect`  -- Summarise an existing dataset file

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use trajsynth::batch::{BatchOrchestrator, RunMode};
use trajsynth::config::SynthConfig;
use trajsynth::engine::KinematicEngine;
use trajsynth::scenario::ScenarioGenerator;
use trajsynth::trajectory::{read_records, DatasetStats, DatasetWriter};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Synthesise multi-agent trajectory datasets.
#[derive(Parser)]
#[command(name = "trajsynth", version, about)]
struct Cli {
    /// Path to a JSON configuration file (uses defaults if not provided).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every entry of a preset and append the episodes to one file.
    Generate {
        /// Preset name, e.g. `close`, `medium1`, `far`.
        #[arg(long)]
        preset: String,

        /// Smoke-test mode: fewer episodes, separate output file.
        #[arg(long, default_value_t = false)]
        test: bool,

        /// Dataset path (defaults to a mode-specific file in the output dir).
        /// An existing file is appended to, continuing its frame and agent
        /// numbering.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Base seed for reproducible runs.
        #[arg(long)]
        seed: Option<u64>,

        /// Episodes simulated at once; output order is unaffected.
        #[arg(long, default_value_t = 1)]
        jobs: usize,
    },

    /// List the configured presets.
    Presets,

    /// Summarise a dataset file.
    Inspect {
        /// Path to the dataset.
        path: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Entrypoint
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing (reads RUST_LOG env var, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SynthConfig::load_from_file(path)?,
        None => SynthConfig::default(),
    };

    match cli.command {
        Commands::Generate {
            preset,
            test,
            output,
            seed,
            jobs,
        } => {
            if seed.is_some() {
                config.batch.seed = seed;
            }
            let mode = if test { RunMode::Test } else { RunMode::Full };
            cmd_generate(config, &preset, mode, output, jobs).await
        }
        Commands::Presets => cmd_presets(&config),
        Commands::Inspect { path } => cmd_inspect(&path),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config: SynthConfig,
    preset: &str,
    mode: RunMode,
    output: Option<PathBuf>,
    jobs: usize,
) -> Result<()> {
    // Reject bad preset names before touching the filesystem.
    config.preset(preset)?;

    let orchestrator = BatchOrchestrator::new(config);
    let path =
        output.unwrap_or_else(|| orchestrator.output_path::<KinematicEngine>(preset, mode));

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    tracing::info!(
        preset,
        ?mode,
        pattern = orchestrator.config().scenario.pattern.name(),
        path = %path.display(),
        "Generating dataset"
    );

    let writer = DatasetWriter::new(&path);
    let summary = if jobs > 1 {
        orchestrator
            .run_concurrent(preset, mode, &writer, KinematicEngine::new, jobs)
            .await?
    } else {
        orchestrator.run(preset, mode, &writer, KinematicEngine::new)?
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_presets(config: &SynthConfig) -> Result<()> {
    println!("Presets ({}):", config.presets.len());
    for (name, entries) in &config.presets {
        let pairs: Vec<String> = entries
            .iter()
            .map(|e| format!("({}, {})", e.min_clearance, e.reaction_time))
            .collect();
        println!("  {name}: {}", pairs.join(", "));
    }
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let records = read_records(path)?;
    let stats = DatasetStats::from_records(&records);

    println!("Dataset: {}", path.display());
    println!("  Records: {}", stats.records);
    println!("  Distinct agents: {}", stats.agents);
    if let (Some(min), Some(max)) = (stats.min_frame, stats.max_frame) {
        println!("  Frames: {min} .. {max}");
    }
    if let Some(max_id) = stats.max_agent_id {
        println!("  Highest agent id: {max_id}");
    }
    Ok(())
}
