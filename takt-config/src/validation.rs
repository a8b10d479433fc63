//! Custom validation functions shared by the configuration modules.

use validator::ValidationError;

/// Scenario names understood by the simulator.
pub const SCENARIOS: [&str; 2] = ["ping-pong", "burst"];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Accepts a bare level or a full `EnvFilter` directive list.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let level = level.trim();
    if level.is_empty() {
        return Err(ValidationError::new("empty_log_level"));
    }
    if level.contains('=') || LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

pub fn validate_scenario(name: &str) -> Result<(), ValidationError> {
    if SCENARIOS.contains(&name) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_scenario"))
    }
}
