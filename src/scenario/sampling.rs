//! Rejection sampling primitives.
//!
//! [`sample_until`] keeps drawing candidates until one satisfies a predicate.
//! With [`RetryPolicy::unbounded`] it never gives up, which is what dataset
//! generation uses: the feasible region is large compared to the number of
//! agents. Tests and cautious callers pass [`RetryPolicy::bounded`] to turn
//! an infeasible constraint into an error instead of a hang.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::{distance, Vec2};

/// How many draws a sampler may make before failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_attempts: Option<usize>,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self { max_attempts: None }
    }

    pub fn bounded(max_attempts: usize) -> Self {
        Self {
            max_attempts: Some(max_attempts),
        }
    }
}

/// Draw candidates with `draw` until `accept` returns true.
///
/// On success the accepted candidate is returned; the draws spent are
/// reported to `tracing` at trace level.
pub fn sample_until<T, D, P>(policy: RetryPolicy, mut draw: D, mut accept: P) -> Result<T>
where
    D: FnMut() -> T,
    P: FnMut(&T) -> bool,
{
    let mut attempts = 0usize;
    loop {
        if let Some(max) = policy.max_attempts {
            if attempts >= max {
                bail!("rejection sampling gave up after {max} attempts");
            }
        }
        attempts += 1;
        let candidate = draw();
        if accept(&candidate) {
            tracing::trace!(attempts, "candidate accepted");
            return Ok(candidate);
        }
    }
}

/// True when `candidate` is at least `clearance` away from every point.
pub fn is_clear_of<'a>(
    candidate: &Vec2,
    placed: impl IntoIterator<Item = &'a Vec2>,
    clearance: f64,
) -> bool {
    placed
        .into_iter()
        .all(|p| distance(candidate, p) >= clearance)
}
