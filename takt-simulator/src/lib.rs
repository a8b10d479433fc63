/*!
# Takt Simulator

Deterministic runner for scripted state machines. A [`VirtualClock`] stands in
for the hardware tick counter, a seeded RNG drives external stimulus, and every
delivered message is folded into a BLAKE3 hash, so two runs with the same seed
produce the same hash.

## Key Components:
- **Virtual Clock:** Wrapping `u32` tick counter implementing `TickSource`.
- **Scenarios:** `ping-pong` and `burst` machines (see [`scenario`]).
- **Trace:** Delivery log hashed into the run's fingerprint.
*/

use std::fmt;
use std::rc::Rc;

use blake3::Hasher;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use takt_core::config::MachineConfig;
use takt_core::events::Message;
use takt_core::irq::NoInterrupts;
use takt_core::sm::{StateId, StateMachine};
use takt_core::timer::Tick;
use takt_telemetry::MetricsRecorder;

pub mod cli;
pub mod error;
pub mod scenario;
pub mod virtual_clock;

pub use error::SimulationError;
pub use scenario::Scenario;
pub use virtual_clock::VirtualClock;

/// The machine type every scenario builds.
pub type Machine = StateMachine<Trace>;

/// Handler context: delivery counters and the running trace hash.
#[derive(Default)]
pub struct Trace {
    hasher: Hasher,
    pub published: u64,
    pub deliveries: u64,
    pub transitions: u64,
    pub timer_events: u64,
    pub(crate) samples: u32,
}

impl Trace {
    /// Folds one delivery into the hash.
    pub fn record(&mut self, now: Tick, state: StateId, msg: &Message) {
        self.deliveries += 1;
        self.hasher.update(&now.to_le_bytes());
        self.hasher.update(&[state, msg.id()]);
        if let Some(data) = msg.data() {
            self.hasher.update(data);
        }
    }

    fn finalize(&self) -> String {
        hex::encode(self.hasher.finalize().as_bytes())
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("published", &self.published)
            .field("deliveries", &self.deliveries)
            .field("transitions", &self.transitions)
            .field("timer_events", &self.timer_events)
            .finish_non_exhaustive()
    }
}

/// Outcome of one [`Simulator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub scenario: Scenario,
    pub seed: u64,
    pub start_tick: Tick,
    pub ticks: u32,
    pub final_state: Option<StateId>,
    pub published: u64,
    pub deliveries: u64,
    pub transitions: u64,
    pub timer_events: u64,
    pub envelopes_allocated: usize,
    pub envelopes_live: usize,
    pub hash: String,
}

/// Drives one scenario against a virtual clock.
pub struct Simulator {
    clock: VirtualClock,
    rng: SmallRng,
    seed: u64,
    config: MachineConfig,
    metrics: Option<MetricsRecorder>,
}

impl Simulator {
    /// Creates a simulator whose start tick and stimulus derive from `seed`.
    pub fn new(seed: u64, config: MachineConfig) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let start: Tick = rng.random();

        Self {
            clock: VirtualClock::new(start),
            rng,
            seed,
            config,
            metrics: None,
        }
    }

    /// Overrides the seeded start tick.
    pub fn start_at(mut self, tick: Tick) -> Self {
        self.clock = VirtualClock::new(tick);
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[inline]
    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    #[inline]
    pub fn metrics(&self) -> Option<&MetricsRecorder> {
        self.metrics.as_ref()
    }

    /// Builds the scenario's machine and advances `ticks` ticks, one scheduling
    /// pass per tick.
    pub fn run(&mut self, scenario: Scenario, ticks: u32) -> Result<SimulationReport, SimulationError> {
        let start_tick = self.clock.now();
        let mut sm = Machine::with_config(
            &scenario.event_table(),
            Rc::new(self.clock.clone()),
            Rc::new(NoInterrupts),
            self.config,
            Trace::default(),
        )?;
        scenario.build(&mut sm)?;
        debug!(%scenario, seed = self.seed, start_tick, ticks, "simulation started");

        for _ in 0..ticks {
            self.clock.advance(1);
            let published = scenario.drive(&mut sm, &mut self.rng)?;
            sm.context_mut().published += published;
            let delivered = sm.handler()?;
            if let Some(metrics) = &self.metrics {
                metrics.record_pass(delivered);
            }
        }

        let trace = sm.context();
        if let Some(metrics) = &self.metrics {
            metrics.record_run(trace.published, trace.transitions, trace.timer_events);
        }

        let stats = sm.bus().stats();
        let report = SimulationReport {
            scenario,
            seed: self.seed,
            start_tick,
            ticks,
            final_state: sm.current_state(),
            published: trace.published,
            deliveries: trace.deliveries,
            transitions: trace.transitions,
            timer_events: trace.timer_events,
            envelopes_allocated: stats.allocated(),
            envelopes_live: stats.live(),
            hash: trace.finalize(),
        };
        debug!(hash = %report.hash, deliveries = report.deliveries, "simulation finished");
        Ok(report)
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("clock", &self.clock)
            .field("seed", &self.seed)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
