//! # Takt Telemetry
//!
//! Log subscriber setup and Prometheus counters for bus and timer activity.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
