//! Plain-text dataset output.
//!
//! One record per line, `frame, agent_id, x, y`, comma-space separated,
//! coordinates in shortest round-trip float notation, no header. The file is
//! only ever appended to; episodes are stitched together by offsetting their
//! frame and agent indices.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};

use crate::trajectory::types::AgentTrajectory;

/// One `(frame, agent_id, x, y)` sample of the dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetRecord {
    pub frame: u64,
    pub agent_id: u64,
    pub x: f64,
    pub y: f64,
}

impl fmt::Display for DatasetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug keeps the trailing ".0" on integral coordinates.
        write!(f, "{}, {}, {:?}, {:?}", self.frame, self.agent_id, self.x, self.y)
    }
}

impl FromStr for DatasetRecord {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [frame, agent_id, x, y] = fields.as_slice() else {
            return Err(anyhow!("expected 4 fields, found {}", fields.len()));
        };
        Ok(Self {
            frame: frame.parse().with_context(|| format!("bad frame '{frame}'"))?,
            agent_id: agent_id
                .parse()
                .with_context(|| format!("bad agent id '{agent_id}'"))?,
            x: x.parse().with_context(|| format!("bad x '{x}'"))?,
            y: y.parse().with_context(|| format!("bad y '{y}'"))?,
        })
    }
}

/// Appends episodes to one dataset file.
#[derive(Debug, Clone)]
pub struct DatasetWriter {
    path: PathBuf,
}

impl DatasetWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Coverage of what the target file already holds, `None` if it does
    /// not exist yet.
    pub fn existing_stats(&self) -> Result<Option<DatasetStats>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let records = read_records(&self.path)?;
        Ok(Some(DatasetStats::from_records(&records)))
    }

    /// Append every recorded position of `trajectories`.
    ///
    /// Agent `i`'s sample at tick index `t` becomes record
    /// `(frame_offset + t, agent_id_offset + i, x, y)`. Records are written
    /// agent by agent. Returns the largest frame written, or `None` if the
    /// trajectories held no samples (nothing is written then).
    pub fn append(
        &self,
        trajectories: &[AgentTrajectory],
        agent_id_offset: u64,
        frame_offset: u64,
    ) -> Result<Option<u64>> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {} for append", self.path.display()))?;
        let mut out = BufWriter::new(file);

        let mut last_frame: Option<u64> = None;
        for (i, trajectory) in trajectories.iter().enumerate() {
            for (t, position) in trajectory.positions.iter().enumerate() {
                let record = DatasetRecord {
                    frame: frame_offset + t as u64,
                    agent_id: agent_id_offset + i as u64,
                    x: position.x,
                    y: position.y,
                };
                writeln!(out, "{record}")
                    .with_context(|| format!("Failed to write to {}", self.path.display()))?;
                last_frame = last_frame.max(Some(record.frame));
            }
        }

        out.flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(last_frame)
    }
}

/// Parse a dataset file back into records.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<DatasetRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            line.parse::<DatasetRecord>()
                .with_context(|| format!("{}:{}", path.display(), n + 1))
        })
        .collect()
}

/// Summary of a dataset's id and frame coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub records: usize,
    pub agents: usize,
    pub min_frame: Option<u64>,
    pub max_frame: Option<u64>,
    pub max_agent_id: Option<u64>,
}

impl DatasetStats {
    pub fn from_records(records: &[DatasetRecord]) -> Self {
        let agents: BTreeSet<u64> = records.iter().map(|r| r.agent_id).collect();
        Self {
            records: records.len(),
            agents: agents.len(),
            min_frame: records.iter().map(|r| r.frame).min(),
            max_frame: records.iter().map(|r| r.frame).max(),
            max_agent_id: agents.last().copied(),
        }
    }
}
