//! ## takt-core::alloc::stats
//! **Envelope allocation statistics**
//!
//! Every published message envelope bumps `allocated` when it is built and
//! `released` when its last reference is dropped. A quiescent bus has
//! `live() == 0`.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Envelope lifetime counters shared by a bus and the envelopes it creates.
#[derive(Debug)]
pub struct EnvelopeStats {
    allocated: AtomicUsize,
    released: AtomicUsize,
}

impl EnvelopeStats {
    /// Creates a new `EnvelopeStats` instance with all counters at zero.
    pub fn new() -> Self {
        EnvelopeStats {
            allocated: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn increment_allocated(&self) {
        self.allocated.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_released(&self) {
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    /// Envelopes built so far.
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    /// Envelopes whose payload has been freed.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }

    /// Envelopes still referenced by at least one queue or pending delivery.
    pub fn live(&self) -> usize {
        self.allocated().saturating_sub(self.released())
    }
}

impl Default for EnvelopeStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_stats_increment_and_read() {
        let stats = EnvelopeStats::new();
        assert_eq!(stats.allocated(), 0);
        assert_eq!(stats.live(), 0);

        stats.increment_allocated();
        stats.increment_allocated();
        stats.increment_released();

        assert_eq!(stats.allocated(), 2);
        assert_eq!(stats.released(), 1);
        assert_eq!(stats.live(), 1);
    }
}
