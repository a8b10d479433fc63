//! ## takt-telemetry::metrics
//! **Prometheus counters for scheduler activity**
//!
//! The recorder is fed by whoever drives a machine; the core itself stays free of
//! metrics dependencies.

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub events_published: IntCounter,
    pub events_delivered: IntCounter,
    pub transitions: IntCounter,
    pub timer_fires: IntCounter,
    pub pass_deliveries: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let events_published = IntCounter::new("takt_events_published_total", "Events published on the bus")?;
        let events_delivered = IntCounter::new(
            "takt_events_delivered_total",
            "Queued messages handed to a state handler",
        )?;
        let transitions = IntCounter::new("takt_transitions_total", "State machine transitions")?;
        let timer_fires = IntCounter::new("takt_timer_fires_total", "Machine timer expiries")?;
        let pass_deliveries = Histogram::with_opts(
            HistogramOpts::new(
                "takt_pass_deliveries",
                "Messages delivered per scheduling pass",
            )
            .buckets(vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0]),
        )?;

        registry.register(Box::new(events_published.clone()))?;
        registry.register(Box::new(events_delivered.clone()))?;
        registry.register(Box::new(transitions.clone()))?;
        registry.register(Box::new(timer_fires.clone()))?;
        registry.register(Box::new(pass_deliveries.clone()))?;

        Ok(Self {
            registry,
            events_published,
            events_delivered,
            transitions,
            timer_fires,
            pass_deliveries,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }

    /// Records one scheduling pass that delivered `count` messages.
    #[inline]
    pub fn record_pass(&self, count: usize) {
        self.events_delivered.inc_by(count as u64);
        self.pass_deliveries.observe(count as f64);
    }

    /// Adds the totals of a finished run.
    pub fn record_run(&self, published: u64, transitions: u64, timer_fires: u64) {
        self.events_published.inc_by(published);
        self.transitions.inc_by(transitions);
        self.timer_fires.inc_by(timer_fires);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_exposition() {
        let metrics = MetricsRecorder::new().unwrap();
        metrics.record_pass(3);
        metrics.record_run(2, 1, 0);

        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("takt_events_published_total 2"));
        assert!(text.contains("takt_events_delivered_total 3"));
        assert!(text.contains("takt_transitions_total 1"));
        assert!(text.contains("takt_timer_fires_total 0"));
    }
}
