//! Scripted random rolls.

use std::collections::VecDeque;
use voxelhooks_core::RandomSource;

/// A [`RandomSource`] that replays a fixed list of unit rolls.
///
/// Once the list runs out every further roll returns the fallback value.
#[derive(Debug, Clone)]
pub struct FixedRolls {
    queued: VecDeque<f64>,
    fallback: f64,
    consumed: usize,
}

impl FixedRolls {
    /// Replay `rolls` in order, then fall back to `0.999`.
    pub fn new(rolls: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queued: rolls.into_iter().collect(),
            fallback: 0.999,
            consumed: 0,
        }
    }

    /// Always return `value`.
    pub fn always(value: f64) -> Self {
        Self::new([]).with_fallback(value)
    }

    /// Replace the value returned after the queue is exhausted.
    pub fn with_fallback(mut self, value: f64) -> Self {
        self.fallback = value;
        self
    }

    /// Rolls still queued.
    pub fn remaining(&self) -> usize {
        self.queued.len()
    }

    /// Rolls handed out so far, fallbacks included.
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomSource for FixedRolls {
    fn next_unit(&mut self) -> f64 {
        self.consumed += 1;
        self.queued.pop_front().unwrap_or(self.fallback)
    }
}
