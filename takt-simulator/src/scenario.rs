//! Scripted state machines driven by the simulator.
//!
//! `PingPong` bounces between two states on private timers of 500 and 200
//! ticks. `Burst` feeds random bursts of samples into an idle/busy pair, with a
//! global loop timer flushing the sample count every 100 ticks.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rand::rngs::SmallRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

use takt_core::events::{EventId, EventType, Message};
use takt_core::sm::StateId;
use takt_core::StateMachineError;

use crate::{Machine, SimulationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    PingPong,
    Burst,
}

impl Scenario {
    pub fn name(self) -> &'static str {
        match self {
            Self::PingPong => "ping-pong",
            Self::Burst => "burst",
        }
    }

    pub fn event_table(self) -> Vec<EventType> {
        match self {
            Self::PingPong => vec![
                EventType::new(ping_pong::E1, "kick"),
                EventType::new(ping_pong::E2, "arm"),
                EventType::new(ping_pong::E3, "expire"),
            ],
            Self::Burst => vec![
                EventType::new(burst::SAMPLE, "sample"),
                EventType::new(burst::FLUSH, "flush"),
                EventType::new(burst::SETTLE, "settle"),
            ],
        }
    }

    /// Creates the states, subscriptions and initial stimulus.
    pub(crate) fn build(self, sm: &mut Machine) -> Result<(), StateMachineError> {
        match self {
            Self::PingPong => ping_pong::build(sm),
            Self::Burst => burst::build(sm),
        }
    }

    /// Per-tick external stimulus. Returns the number of events published.
    pub(crate) fn drive(self, sm: &mut Machine, rng: &mut SmallRng) -> Result<u64, StateMachineError> {
        match self {
            Self::PingPong => Ok(0),
            Self::Burst => burst::drive(sm, rng),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scenario {
    type Err = SimulationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "ping-pong" => Ok(Self::PingPong),
            "burst" => Ok(Self::Burst),
            other => Err(SimulationError::UnknownScenario(other.to_owned())),
        }
    }
}

fn record(sm: &mut Machine, state: StateId, msg: &Message) {
    let now = sm.now();
    sm.context_mut().record(now, state, msg);
}

fn publish(sm: &mut Machine, event: EventId) {
    match sm.publish_event(event) {
        Ok(()) => sm.context_mut().published += 1,
        Err(error) => warn!(event, %error, "scenario publish failed"),
    }
}

fn transition(sm: &mut Machine, to: StateId) {
    match sm.trans_to(to) {
        Ok(()) => sm.context_mut().transitions += 1,
        Err(error) => warn!(to, %error, "scenario transition failed"),
    }
}

fn arm(sm: &mut Machine, interval: u32, event: EventId) {
    if let Err(error) = sm.start_timer(interval, event) {
        warn!(interval, event, %error, "scenario timer failed");
    }
}

mod ping_pong {
    use super::*;

    pub const E1: EventId = 1;
    pub const E2: EventId = 2;
    pub const E3: EventId = 3;

    const STATE_1: StateId = 1;
    const STATE_2: StateId = 2;

    pub(super) fn build(sm: &mut Machine) -> Result<(), StateMachineError> {
        sm.state_create(STATE_1)?;
        sm.state_create(STATE_2)?;

        sm.state_subscribe_events(STATE_1, &[E1, E2, E3], |sm: &mut Machine, msg: &Message| {
            record(sm, STATE_1, msg);
            match msg.id() {
                E1 => publish(sm, E2),
                E2 => arm(sm, 500, E3),
                _ => {
                    sm.context_mut().timer_events += 1;
                    transition(sm, STATE_2);
                    publish(sm, E2);
                }
            }
        })?;

        sm.state_subscribe_events(STATE_2, &[E2, E3], |sm: &mut Machine, msg: &Message| {
            record(sm, STATE_2, msg);
            match msg.id() {
                E2 => arm(sm, 200, E3),
                _ => {
                    sm.context_mut().timer_events += 1;
                    transition(sm, STATE_1);
                    publish(sm, E2);
                }
            }
        })?;

        sm.trans_to(STATE_1)?;
        sm.publish_event(E1)?;
        sm.context_mut().published += 1;
        Ok(())
    }
}

mod burst {
    use super::*;

    pub const SAMPLE: EventId = 1;
    pub const FLUSH: EventId = 2;
    pub const SETTLE: EventId = 3;

    const IDLE: StateId = 1;
    const BUSY: StateId = 2;

    const FLUSH_INTERVAL: u32 = 100;
    const SETTLE_INTERVAL: u32 = 25;
    const BUSY_THRESHOLD: u32 = 8;
    const BURST_PROBABILITY: f64 = 0.2;

    pub(super) fn build(sm: &mut Machine) -> Result<(), StateMachineError> {
        sm.state_create_with_events(IDLE, &[SAMPLE, FLUSH], |sm: &mut Machine, msg: &Message| {
            record(sm, IDLE, msg);
            if msg.id() == FLUSH {
                let trace = sm.context_mut();
                trace.timer_events += 1;
                trace.samples = 0;
                return;
            }

            sm.context_mut().samples += 1;
            if sm.context().samples >= BUSY_THRESHOLD {
                sm.context_mut().samples = 0;
                transition(sm, BUSY);
                arm(sm, SETTLE_INTERVAL, SETTLE);
            }
        })?;

        sm.state_create_with_events(BUSY, &[SAMPLE, FLUSH, SETTLE], |sm: &mut Machine, msg: &Message| {
            record(sm, BUSY, msg);
            match msg.id() {
                SAMPLE => {}
                FLUSH => sm.context_mut().timer_events += 1,
                _ => {
                    sm.context_mut().timer_events += 1;
                    transition(sm, IDLE);
                }
            }
        })?;

        sm.start_global_timer_loop(FLUSH_INTERVAL, FLUSH)?;
        sm.trans_to(IDLE)?;
        Ok(())
    }

    pub(super) fn drive(sm: &mut Machine, rng: &mut SmallRng) -> Result<u64, StateMachineError> {
        if !rng.random_bool(BURST_PROBABILITY) {
            return Ok(0);
        }

        let count = rng.random_range(1..=4u64);
        for _ in 0..count {
            let payload = rng.random::<u32>().to_le_bytes();
            sm.publish_event_with_param(SAMPLE, &payload)?;
        }
        Ok(count)
    }
}
