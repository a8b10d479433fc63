//! States and the timers a machine arms on their behalf.

use std::fmt;

use crate::events::{EventId, ServerId};
use crate::timer::TimerList;

/// Caller-chosen state identifier, unique within one machine.
pub type StateId = u8;

/// Which pool a machine timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerScope {
    /// Owned by the current state; torn down on every transition.
    Private,
    /// Owned by the machine; survives transitions.
    Global,
}

impl fmt::Display for TimerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Private => f.write_str("private"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// Timer parameter: the event published on expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineTimer {
    pub event: EventId,
}

#[derive(Debug)]
pub(crate) struct State {
    pub(crate) server: ServerId,
    pub(crate) timers: TimerList<MachineTimer>,
}

impl State {
    pub(crate) fn new(server: ServerId, timer_capacity: usize) -> Self {
        Self {
            server,
            timers: TimerList::new(timer_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_display() {
        assert_eq!(TimerScope::Private.to_string(), "private");
        assert_eq!(TimerScope::Global.to_string(), "global");
    }
}
