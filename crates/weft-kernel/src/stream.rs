//! The coderack: pending codelets and urgency-weighted draws
//!
//! Draw probability is proportional to urgency. Pending codelets keep their
//! insertion order, so with a fixed seed and insertion sequence the draw
//! sequence is reproducible.

use crate::codelet::Codelet;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// The urgency-weighted draw could not be set up
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("urgency-weighted draw failed: {0}")]
pub struct DrawError(#[from] WeightedError);

/// Multiset of pending codelets with a seeded random source
#[derive(Debug, Clone)]
pub struct Stream {
    pending: Vec<Codelet>,
    rng: StdRng,
}

impl Stream {
    /// Create an empty stream seeded with `seed`
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            pending: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Add a codelet
    pub fn insert(&mut self, codelet: Codelet) {
        trace!(codelet = %codelet, pending = self.pending.len() + 1, "codelet inserted");
        self.pending.push(codelet);
    }

    /// Remove and return one codelet, chosen with probability proportional
    /// to urgency. `Ok(None)` when empty.
    ///
    /// Weights are scaled by the largest pending urgency so their sum stays
    /// finite for any valid urgencies.
    ///
    /// # Errors
    /// [`DrawError`] when the weights cannot be sampled
    pub fn draw(&mut self) -> Result<Option<Codelet>, DrawError> {
        if self.pending.is_empty() {
            return Ok(None);
        }
        let max = self
            .pending
            .iter()
            .map(|c| c.urgency().get())
            .fold(f64::MIN_POSITIVE, f64::max);
        let weights = WeightedIndex::new(self.pending.iter().map(|c| c.urgency().get() / max))?;
        let index = weights.sample(&mut self.rng);
        Ok(Some(self.pending.remove(index)))
    }

    /// Number of pending codelets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Sum of pending urgencies, infinite if it overflows
    #[must_use]
    pub fn total_urgency(&self) -> f64 {
        self.pending.iter().map(|c| c.urgency().get()).sum()
    }

    /// Pending codelets in insertion order
    pub fn pending(&self) -> impl Iterator<Item = &Codelet> {
        self.pending.iter()
    }

    /// Drop every pending codelet
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Empty stream seeded from this stream's random state
    ///
    /// Does not advance this stream's generator.
    #[must_use]
    pub fn fork(&self) -> Stream {
        let seed = self.rng.clone().gen::<u64>();
        Stream::new(seed)
    }
}
