//! Batch generation: many episodes into one dataset file.
//!
//! For every `(min_clearance, reaction_time)` entry of a named preset the
//! orchestrator runs a fixed number of episodes, each with a fresh engine, and
//! appends them to a shared file. The running [`Offsets`] accumulator is
//! threaded from one flush to the next so agent ids never repeat and frames
//! keep increasing across episode boundaries.
//!
//! ```text
//! for entry in preset:
//!     for episode in 0 .. episodes_per_entry:
//!         engine   = factory(profile.params(entry))
//!         scenario = pattern.generate(num_agents, engine)
//!         episode  = collector.run(engine, scenario)
//!         last     = writer.append(episode, offsets)
//!         offsets  = offsets.advance(num_agents, last, frame_gap)
//! ```
//!
//! [`BatchOrchestrator::run_concurrent`] overlaps the simulation of several
//! episodes but still flushes them in program order, so its output matches
//! the sequential [`BatchOrchestrator::run`] for the same seed.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::offsets::Offsets;
use crate::config::{PresetEntry, SynthConfig};
use crate::engine::{EngineParams, EngineProfile, SimulationEngine};
use crate::scenario::{RetryPolicy, ScenarioGenerator, ScenarioPattern};
use crate::trajectory::{DatasetWriter, Episode, TrajectoryCollector};

// ---------------------------------------------------------------------------
// Run mode and episode jobs
// ---------------------------------------------------------------------------

/// Full dataset generation or a reduced smoke test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Full,
    Test,
}

/// One planned episode.
#[derive(Debug, Clone, Copy)]
pub struct EpisodeJob {
    /// Position of the episode in the whole batch.
    pub index: usize,
    /// Which preset entry the episode belongs to.
    pub entry_index: usize,
    /// Position of the episode within its preset entry.
    pub entry_episode: usize,
    pub entry: PresetEntry,
    /// Seed of the episode's own RNG.
    pub seed: u64,
}

/// Everything an episode needs, cheap to clone onto worker threads.
#[derive(Debug, Clone)]
struct EpisodeRunner {
    pattern: ScenarioPattern,
    profile: EngineProfile,
    collector: TrajectoryCollector,
    num_agents: usize,
    retry: RetryPolicy,
}

impl EpisodeRunner {
    fn run<E, F>(&self, job: &EpisodeJob, factory: &F) -> Result<Episode>
    where
        E: SimulationEngine,
        F: Fn(EngineParams) -> E,
    {
        let mut engine = factory(self.profile.params(&job.entry));
        let mut rng = StdRng::seed_from_u64(job.seed);
        self.collector
            .simulate(&self.pattern, self.num_agents, &mut engine, &mut rng, self.retry)
            .with_context(|| format!("episode {} failed", job.index))
    }
}

// ---------------------------------------------------------------------------
// Batch summary
// ---------------------------------------------------------------------------

/// What a batch run wrote.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub preset: String,
    pub mode: RunMode,
    pub output: PathBuf,
    /// Base seed; episode `i` used `seed + i`.
    pub seed: u64,
    pub episodes: usize,
    /// Episodes that hit the step cap before every agent arrived.
    pub unfinished_episodes: usize,
    pub total_steps: usize,
    pub records: usize,
    /// Offsets the next appended episode would receive.
    pub next_offsets: Offsets,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchSummary {
    fn new(preset: &str, mode: RunMode, output: &Path, seed: u64) -> Self {
        Self {
            preset: preset.to_string(),
            mode,
            output: output.to_path_buf(),
            seed,
            episodes: 0,
            unfinished_episodes: 0,
            total_steps: 0,
            records: 0,
            next_offsets: Offsets::default(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Sequences episodes for a preset and writes them to one dataset.
pub struct BatchOrchestrator {
    config: SynthConfig,
    collector: TrajectoryCollector,
}

impl BatchOrchestrator {
    pub fn new(config: SynthConfig) -> Self {
        let collector = TrajectoryCollector::from_config(&config.driver);
        Self { config, collector }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Episodes per preset entry for `mode`.
    pub fn episodes_per_entry(&self, mode: RunMode) -> usize {
        match mode {
            RunMode::Full => self.config.batch.full_episodes,
            RunMode::Test => self.config.batch.test_episodes,
        }
    }

    /// Default dataset location for a run.
    ///
    /// Full runs write `<output_dir>/<pattern>.txt`; test runs write
    /// `<output_dir>/test_<engine>_traj_<preset>.txt`.
    pub fn output_path<E: SimulationEngine>(&self, preset: &str, mode: RunMode) -> PathBuf {
        let dir = Path::new(&self.config.batch.output_dir);
        match mode {
            RunMode::Full => dir.join(format!("{}.txt", self.config.scenario.pattern.name())),
            RunMode::Test => dir.join(format!("test_{}_traj_{preset}.txt", E::LABEL)),
        }
    }

    /// Resolve a preset into the ordered list of episodes to run.
    ///
    /// Unknown or empty presets fail here, before any simulation work.
    pub fn plan(&self, preset: &str, mode: RunMode, base_seed: u64) -> Result<Vec<EpisodeJob>> {
        let entries = self.config.preset(preset)?;
        let per_entry = self.episodes_per_entry(mode);

        let mut jobs = Vec::with_capacity(entries.len() * per_entry);
        for (entry_index, entry) in entries.iter().enumerate() {
            for entry_episode in 0..per_entry {
                let index = jobs.len();
                jobs.push(EpisodeJob {
                    index,
                    entry_index,
                    entry_episode,
                    entry: *entry,
                    seed: base_seed.wrapping_add(index as u64),
                });
            }
        }
        Ok(jobs)
    }

    /// Run a preset episode by episode on the current thread.
    ///
    /// `factory` builds a fresh engine for every episode.
    pub fn run<E, F>(
        &self,
        preset: &str,
        mode: RunMode,
        writer: &DatasetWriter,
        factory: F,
    ) -> Result<BatchSummary>
    where
        E: SimulationEngine,
        F: Fn(EngineParams) -> E,
    {
        let seed = self.base_seed();
        let jobs = self.plan(preset, mode, seed)?;
        let runner = self.runner();
        let mut summary = BatchSummary::new(preset, mode, writer.path(), seed);
        let mut offsets = self.starting_offsets(writer)?;
        summary.next_offsets = offsets;

        info!(preset, engine = E::LABEL, episodes = jobs.len(), seed, "starting batch");
        for job in &jobs {
            self.log_entry_start(job);
            let episode = runner.run(job, &factory)?;
            offsets = self.flush(writer, job, &episode, offsets, &mut summary)?;
        }

        summary.finished_at = Some(Utc::now());
        info!(
            preset,
            episodes = summary.episodes,
            records = summary.records,
            unfinished = summary.unfinished_episodes,
            "batch finished"
        );
        Ok(summary)
    }

    /// Run a preset with up to `jobs` episodes simulating at once.
    ///
    /// Episodes run on the blocking thread pool; completed episodes are
    /// flushed strictly in plan order, so offsets and file contents match
    /// [`run`](Self::run) for the same seed.
    pub async fn run_concurrent<E, F>(
        &self,
        preset: &str,
        mode: RunMode,
        writer: &DatasetWriter,
        factory: F,
        jobs: usize,
    ) -> Result<BatchSummary>
    where
        E: SimulationEngine + 'static,
        F: Fn(EngineParams) -> E + Send + Sync + 'static,
    {
        let seed = self.base_seed();
        let plan = self.plan(preset, mode, seed)?;
        let runner = self.runner();
        let factory = Arc::new(factory);
        let window = jobs.max(1);
        let mut summary = BatchSummary::new(preset, mode, writer.path(), seed);
        let mut offsets = self.starting_offsets(writer)?;
        summary.next_offsets = offsets;

        info!(
            preset,
            engine = E::LABEL,
            episodes = plan.len(),
            seed,
            jobs = window,
            "starting concurrent batch"
        );

        let mut queue = plan.into_iter();
        let mut pending: VecDeque<(EpisodeJob, JoinHandle<Result<Episode>>)> = VecDeque::new();
        loop {
            while pending.len() < window {
                let Some(job) = queue.next() else { break };
                let runner = runner.clone();
                let factory = Arc::clone(&factory);
                let handle =
                    tokio::task::spawn_blocking(move || runner.run(&job, factory.as_ref()));
                pending.push_back((job, handle));
            }

            let Some((job, handle)) = pending.pop_front() else { break };
            self.log_entry_start(&job);
            let episode = handle
                .await
                .with_context(|| format!("episode {} task did not complete", job.index))??;
            offsets = self.flush(writer, &job, &episode, offsets, &mut summary)?;
        }

        summary.finished_at = Some(Utc::now());
        info!(
            preset,
            episodes = summary.episodes,
            records = summary.records,
            unfinished = summary.unfinished_episodes,
            "batch finished"
        );
        Ok(summary)
    }

    // -- internal helpers ---------------------------------------------------

    fn base_seed(&self) -> u64 {
        self.config.batch.seed.unwrap_or_else(rand::random)
    }

    /// Continue numbering after whatever the dataset already holds, so
    /// re-runs and other presets appended to the same file never reuse ids.
    fn starting_offsets(&self, writer: &DatasetWriter) -> Result<Offsets> {
        let Some(stats) = writer.existing_stats()? else {
            return Ok(Offsets::default());
        };
        let offsets = Offsets::resume(&stats, self.config.batch.frame_gap);
        if stats.records > 0 {
            info!(
                path = %writer.path().display(),
                records = stats.records,
                agent_offset = offsets.agent_id,
                frame_offset = offsets.frame,
                "appending to existing dataset"
            );
        }
        Ok(offsets)
    }

    fn runner(&self) -> EpisodeRunner {
        EpisodeRunner {
            pattern: self.config.scenario.pattern.clone(),
            profile: self.config.engine.profile,
            collector: self.collector.clone(),
            num_agents: self.config.batch.num_agents,
            retry: self.config.scenario.retry_policy(),
        }
    }

    fn log_entry_start(&self, job: &EpisodeJob) {
        if job.entry_episode == 0 {
            info!(
                entry = job.entry_index,
                min_clearance = job.entry.min_clearance,
                reaction_time = job.entry.reaction_time,
                "preset entry"
            );
        }
    }

    /// Append one episode and return the offsets for the next.
    fn flush(
        &self,
        writer: &DatasetWriter,
        job: &EpisodeJob,
        episode: &Episode,
        offsets: Offsets,
        summary: &mut BatchSummary,
    ) -> Result<Offsets> {
        let last_frame = writer.append(&episode.trajectories, offsets.agent_id, offsets.frame)?;
        let next = offsets.advance(episode.num_agents(), last_frame, self.config.batch.frame_gap);

        summary.episodes += 1;
        summary.total_steps += episode.step_count;
        summary.records += episode.num_samples();
        if !episode.all_reached() {
            summary.unfinished_episodes += 1;
        }
        summary.next_offsets = next;

        debug!(
            episode = job.index,
            id = %episode.id,
            steps = episode.step_count,
            longest = episode.longest(),
            agent_offset = offsets.agent_id,
            frame_offset = offsets.frame,
            "episode written"
        );
        if (job.index + 1) % 10 == 0 {
            info!(episode = job.index, "progress");
        }

        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::KinematicEngine;
    use crate::trajectory::{read_records, DatasetRecord};

    fn small_config(seed: u64) -> SynthConfig {
        let mut config = SynthConfig::default();
        config.batch.num_agents = 3;
        config.batch.test_episodes = 4;
        config.batch.full_episodes = 6;
        config.batch.seed = Some(seed);
        config
    }

    fn kinematic(params: EngineParams) -> KinematicEngine {
        KinematicEngine::new(params)
    }

    /// Records grouped per episode, in file order.
    fn episodes(records: &[DatasetRecord], agents_per_episode: u64) -> Vec<Vec<DatasetRecord>> {
        let mut out: Vec<Vec<DatasetRecord>> = Vec::new();
        for r in records {
            let episode = (r.agent_id / agents_per_episode) as usize;
            if out.len() <= episode {
                out.resize(episode + 1, Vec::new());
            }
            out[episode].push(*r);
        }
        out
    }

    #[test]
    fn consecutive_episodes_are_stitched() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path().join("close.txt"));
        let orchestrator = BatchOrchestrator::new(small_config(17));

        let summary = orchestrator
            .run("close", RunMode::Test, &writer, kinematic)
            .unwrap();
        assert_eq!(summary.episodes, 4);
        assert_eq!(summary.unfinished_episodes, 0);

        let records = read_records(writer.path()).unwrap();
        assert_eq!(records.len(), summary.records);
        let grouped = episodes(&records, 3);
        assert_eq!(grouped.len(), 4);
        assert_eq!(grouped[0].iter().map(|r| r.frame).min(), Some(0));

        for pair in grouped.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let prev_max_id = prev.iter().map(|r| r.agent_id).max().unwrap();
            let prev_max_frame = prev.iter().map(|r| r.frame).max().unwrap();
            let next_min_id = next.iter().map(|r| r.agent_id).min().unwrap();
            let next_min_frame = next.iter().map(|r| r.frame).min().unwrap();
            assert_eq!(next_min_id, prev_max_id + 1);
            assert_eq!(next_min_frame, prev_max_frame + 5);
        }

        let last = grouped.last().unwrap();
        assert_eq!(summary.next_offsets.agent_id, 12);
        assert_eq!(
            summary.next_offsets.frame,
            last.iter().map(|r| r.frame).max().unwrap() + 5
        );
    }

    #[test]
    fn offsets_carry_across_preset_entries() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path().join("medium.txt"));
        let orchestrator = BatchOrchestrator::new(small_config(3));

        let summary = orchestrator
            .run("medium", RunMode::Test, &writer, kinematic)
            .unwrap();
        assert_eq!(summary.episodes, 8);

        let records = read_records(writer.path()).unwrap();
        let ids: std::collections::BTreeSet<u64> = records.iter().map(|r| r.agent_id).collect();
        assert_eq!(ids.len(), 24);
        assert_eq!(ids.iter().copied().max(), Some(23));
    }

    #[test]
    fn rerun_on_same_file_continues_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path().join("shared.txt"));

        let first = BatchOrchestrator::new(small_config(5))
            .run("close", RunMode::Test, &writer, kinematic)
            .unwrap();
        let first_max_frame = read_records(writer.path())
            .unwrap()
            .iter()
            .map(|r| r.frame)
            .max()
            .unwrap();

        let second = BatchOrchestrator::new(small_config(5))
            .run("far", RunMode::Test, &writer, kinematic)
            .unwrap();
        assert_eq!(second.next_offsets.agent_id, 24);

        let records = read_records(writer.path()).unwrap();
        assert_eq!(records.len(), first.records + second.records);
        let ids: std::collections::BTreeSet<u64> = records.iter().map(|r| r.agent_id).collect();
        assert_eq!(ids.len(), 24);

        let resumed_min_frame = records[first.records..].iter().map(|r| r.frame).min();
        assert_eq!(resumed_min_frame, Some(first_max_frame + 5));
    }

    #[test]
    fn unknown_preset_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path().join("never.txt"));
        let orchestrator = BatchOrchestrator::new(small_config(1));

        let err = orchestrator
            .run("chaotic", RunMode::Test, &writer, kinematic)
            .unwrap_err();
        assert!(err.to_string().contains("unknown preset"));
        assert!(!writer.path().exists());
    }

    #[test]
    fn plan_sizes_follow_mode() {
        let orchestrator = BatchOrchestrator::new(small_config(0));
        assert_eq!(orchestrator.plan("far", RunMode::Full, 0).unwrap().len(), 6);
        let jobs = orchestrator.plan("medium", RunMode::Test, 100).unwrap();
        assert_eq!(jobs.len(), 8);
        assert_eq!(jobs[4].entry_index, 1);
        assert_eq!(jobs[4].entry_episode, 0);
        assert_eq!(jobs[4].entry, PresetEntry::new(3.0, 2.0));
        assert_eq!(jobs[7].seed, 107);
    }

    #[test]
    fn output_paths_depend_on_mode() {
        let orchestrator = BatchOrchestrator::new(SynthConfig::default());
        assert_eq!(
            orchestrator.output_path::<KinematicEngine>("close", RunMode::Full),
            Path::new("data/raw/controlled/circle_crossing.txt")
        );
        assert_eq!(
            orchestrator.output_path::<KinematicEngine>("close", RunMode::Test),
            Path::new("data/raw/controlled/test_kinematic_traj_close.txt")
        );
    }

    #[tokio::test]
    async fn concurrent_run_matches_sequential_output() {
        let dir = tempfile::tempdir().unwrap();
        let sequential = DatasetWriter::new(dir.path().join("seq.txt"));
        let concurrent = DatasetWriter::new(dir.path().join("par.txt"));
        let orchestrator = BatchOrchestrator::new(small_config(99));

        let a = orchestrator
            .run("medium", RunMode::Test, &sequential, kinematic)
            .unwrap();
        let b = orchestrator
            .run_concurrent("medium", RunMode::Test, &concurrent, kinematic, 3)
            .await
            .unwrap();

        assert_eq!(a.next_offsets, b.next_offsets);
        assert_eq!(a.records, b.records);
        assert_eq!(
            read_records(sequential.path()).unwrap(),
            read_records(concurrent.path()).unwrap()
        );
    }

    #[test]
    fn bounded_sampler_surfaces_infeasible_scenes() {
        let mut config = small_config(5);
        config.scenario.pattern = ScenarioPattern::SquareCrossing(crate::scenario::SquareCrossing {
            width: 1.0,
            clearance: 10.0,
            placement_attempts: 20,
        });
        config.scenario.max_attempts = Some(50);

        let dir = tempfile::tempdir().unwrap();
        let writer = DatasetWriter::new(dir.path().join("square.txt"));
        let err = BatchOrchestrator::new(config)
            .run("close", RunMode::Test, &writer, kinematic)
            .unwrap_err();
        assert!(format!("{err:#}").contains("gave up after 50 attempts"));
    }
}
