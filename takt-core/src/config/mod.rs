//! Sizing parameters for buses and state machines.
//!
//! These are the plain runtime values the core consumes. Layered loading and
//! validation of user-facing configuration live in `takt-config`.

use serde::{Deserialize, Serialize};

/// Default storage for names, terminator included.
pub const DEFAULT_NAME_CAPACITY: usize = 24;

/// Default number of servers one bus can host.
pub const DEFAULT_MAX_SERVERS: usize = 32;

/// Default number of timer ids per pool.
pub const DEFAULT_TIMER_POOL_CAPACITY: usize = 32;

/// Event bus sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Maximum number of live event servers.
    #[serde(default = "default_max_servers")]
    pub max_servers: usize,

    /// Bytes reserved per server or event name; names keep at most
    /// `name_capacity - 1` bytes.
    #[serde(default = "default_name_capacity")]
    pub name_capacity: usize,
}

fn default_max_servers() -> usize {
    DEFAULT_MAX_SERVERS
}

fn default_name_capacity() -> usize {
    DEFAULT_NAME_CAPACITY
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_servers: default_max_servers(),
            name_capacity: default_name_capacity(),
        }
    }
}

/// State machine sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Bus backing the machine; one server per state.
    #[serde(default)]
    pub bus: BusConfig,

    /// Timer ids available to the global pool and to each state's private pool.
    #[serde(default = "default_timer_pool_capacity")]
    pub timer_pool_capacity: usize,
}

fn default_timer_pool_capacity() -> usize {
    DEFAULT_TIMER_POOL_CAPACITY
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            timer_pool_capacity: default_timer_pool_capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config: MachineConfig = serde_yaml::from_str("bus:\n  max_servers: 4\n").unwrap();
        assert_eq!(config.bus.max_servers, 4);
        assert_eq!(config.bus.name_capacity, DEFAULT_NAME_CAPACITY);
        assert_eq!(config.timer_pool_capacity, DEFAULT_TIMER_POOL_CAPACITY);
    }
}
