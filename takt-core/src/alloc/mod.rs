//! ## takt-core::alloc
//! **Bounded storage for timers, servers and envelopes**
//!
//! ### Key Submodules:
//! - `pool`: Fixed-capacity slot pools, lowest-free-index allocation
//! - `stats`: Envelope allocation and release counters

pub mod pool;
pub mod stats;

pub use pool::SlotPool;
pub use stats::EnvelopeStats;
