//! # takt-core
//!
//! Cooperative scheduling primitives for single-threaded, interrupt-driven
//! targets: software timers, a publish/subscribe event bus and a state machine
//! built on both.
//!
//! Nothing here spawns threads or blocks. A driver loop advances the tick
//! counter and calls the handlers; interrupt context may touch timer lists and
//! event queues only through the injected [`irq::InterruptControl`].
//!
//! ### Key Submodules:
//! - `timer`: wraparound-safe timer lists and the [`timer::TimerService`]
//! - `events`: event map, servers and the [`events::EventBus`]
//! - `sm`: states, transitions and machine-owned timers
//! - `alloc`: slot pools backing timer and server ids, envelope counters
//! - `irq`: interrupt masking capability and critical sections

pub mod alloc;
pub mod config;
pub mod error;
pub mod events;
pub mod irq;
pub mod sm;
pub mod timer;

pub mod prelude {
    pub use crate::config::{BusConfig, MachineConfig};
    pub use crate::error::*;
    pub use crate::events::{EventBus, EventId, EventType, Message, ServerId, SubscribeMode};
    pub use crate::irq::{InterruptControl, IrqFns, NoInterrupts};
    pub use crate::sm::{StateId, StateMachine, TimerScope};
    pub use crate::timer::{Tick, TickSource, TimerKey, TimerMode, TimerService};
}

pub use error::{EventError, StateMachineError, TimerError};
