//! ==============================================================================
//! sampler.rs - pluggable randomness for mock data
//! ==============================================================================
//!
//! purpose:
//!     every mock value in the host (telemetry ticks, analysis results) is drawn
//!     through the `Sampler` trait. production uses `RandomSampler`; tests swap
//!     in `ScriptedSampler` to get exact, repeatable values.
//!
//! relationships:
//!     - used by: telemetry.rs (sensor readings)
//!     - used by: analyzer.rs (simulated analyzer)
//!
//! ==============================================================================

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of uniformly distributed integers.
///
/// Implementations must return a value in `lo..=hi`. Callers never pass an
/// empty range.
pub trait Sampler: Send {
    fn int_in(&mut self, lo: i64, hi: i64) -> i64;

    /// Uniform pick of an index in `0..len`.
    fn index(&mut self, len: usize) -> usize {
        self.int_in(0, len as i64 - 1) as usize
    }

    /// Decimal in `[lo_tenths/10, hi_tenths/10)` rendered with one fractional
    /// digit. Sampling whole tenths keeps the rendered value inside the
    /// half-open range.
    fn tenths(&mut self, lo_tenths: i64, hi_tenths: i64) -> String {
        format_tenths(self.int_in(lo_tenths, hi_tenths - 1))
    }
}

/// Render a tenths count as a one-digit decimal string (`65` -> `"6.5"`).
pub fn format_tenths(tenths: i64) -> String {
    let sign = if tenths < 0 { "-" } else { "" };
    let abs = tenths.unsigned_abs();
    format!("{}{}.{}", sign, abs / 10, abs % 10)
}

// ==============================================================================
// production sampler
// ==============================================================================

pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// deterministic stream, handy for demos and reproducing a run
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn int_in(&mut self, lo: i64, hi: i64) -> i64 {
        self.rng.gen_range(lo..=hi)
    }
}

// ==============================================================================
// test double
// ==============================================================================

/// Replays a fixed script of raw draws.
///
/// Each draw is clamped into the requested range so a script written for one
/// range never produces an out-of-range value. When the script runs out the
/// sampler returns the lower bound.
#[derive(Debug, Default, Clone)]
pub struct ScriptedSampler {
    script: VecDeque<i64>,
}

impl ScriptedSampler {
    pub fn new(script: impl IntoIterator<Item = i64>) -> Self {
        Self { script: script.into_iter().collect() }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Sampler for ScriptedSampler {
    fn int_in(&mut self, lo: i64, hi: i64) -> i64 {
        self.script.pop_front().map_or(lo, |v| v.clamp(lo, hi))
    }
}
