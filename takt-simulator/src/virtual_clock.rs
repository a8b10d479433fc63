//! # Virtual Tick Counter for Simulation
//!
//! Deterministic stand-in for a hardware tick counter. It wraps at `u32::MAX`
//! exactly like the real one, so scenarios can start just below the wrap point.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use takt_core::timer::{Tick, TickSource};

/// A shared tick counter advanced by the simulation driver.
#[derive(Clone, Debug)]
pub struct VirtualClock {
    ticks: Arc<AtomicU32>,
}

impl VirtualClock {
    /// Creates a clock reading `start`.
    pub fn new(start: Tick) -> Self {
        Self {
            ticks: Arc::new(AtomicU32::new(start)),
        }
    }

    #[inline]
    pub fn now(&self) -> Tick {
        self.ticks.load(Ordering::Acquire)
    }

    /// Advances the clock, wrapping on overflow.
    #[inline]
    pub fn advance(&self, ticks: Tick) {
        self.ticks.fetch_add(ticks, Ordering::Release);
    }
}

impl TickSource for VirtualClock {
    #[inline]
    fn now(&self) -> Tick {
        VirtualClock::now(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_initial_value() {
        let clock = VirtualClock::new(100);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn test_clock_advance() {
        let clock = VirtualClock::new(0);
        clock.advance(500);
        assert_eq!(clock.now(), 500);
        clock.advance(250);
        assert_eq!(clock.now(), 750);
    }

    #[test]
    fn test_clock_wraps() {
        let clock = VirtualClock::new(Tick::MAX - 1);
        let shared = clock.clone();
        clock.advance(3);
        assert_eq!(TickSource::now(&shared), 1);
    }
}
