use thiserror::Error;

use crate::events::{EventId, ServerId};
use crate::sm::{StateId, TimerScope};
use crate::timer::TimerKey;

/// Timer service error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("Timer interval must be non-zero")]
    ZeroInterval,

    #[error("Timer interval {0} exceeds half the tick counter range")]
    IntervalTooLarge(u32),

    #[error("Unknown timer {0}")]
    UnknownTimer(TimerKey),

    #[error("Timer pool exhausted ({0} slots in use)")]
    PoolExhausted(usize),
}

/// Event bus error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("Event type table is empty")]
    EmptyTable,

    #[error("Event id {0} registered twice")]
    DuplicateEvent(EventId),

    #[error("Unknown event id {0}")]
    UnknownEvent(EventId),

    #[error("Unknown event server {0}")]
    UnknownServer(ServerId),

    #[error("Event server limit reached ({0} servers)")]
    ServerLimit(usize),

    #[error("Event bus needs room for at least one server")]
    NoServerCapacity,
}

/// State machine error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMachineError {
    #[error("Unknown state {0}")]
    UnknownState(StateId),

    #[error("State {0} already exists")]
    DuplicateState(StateId),

    #[error("No current state; call trans_to first")]
    NoCurrentState,

    #[error("Timer pools need at least one slot")]
    NoTimerCapacity,

    #[error("Unknown {scope} timer {id}")]
    UnknownTimer { scope: TimerScope, id: TimerKey },

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Timer(#[from] TimerError),
}
