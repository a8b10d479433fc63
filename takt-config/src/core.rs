//! Core sizing parameters.
//!
//! Mirrors `takt_core::config` with validated ranges; convert with
//! [`CoreConfig::machine_config`].

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use takt_core::config::{
    BusConfig, MachineConfig, DEFAULT_MAX_SERVERS, DEFAULT_NAME_CAPACITY, DEFAULT_TIMER_POOL_CAPACITY,
};

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CoreConfig {
    #[serde(default)]
    #[validate(nested)]
    pub event_bus: EventBusConfig,

    #[serde(default)]
    #[validate(nested)]
    pub timers: TimerConfig,
}

impl CoreConfig {
    pub fn bus_config(&self) -> BusConfig {
        BusConfig {
            max_servers: self.event_bus.max_servers,
            name_capacity: self.event_bus.name_capacity,
        }
    }

    pub fn machine_config(&self) -> MachineConfig {
        MachineConfig {
            bus: self.bus_config(),
            timer_pool_capacity: self.timers.pool_capacity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EventBusConfig {
    /// Maximum number of live servers per bus (one per state in a machine).
    #[serde(default = "default_max_servers")]
    #[validate(range(min = 1, max = 1024))]
    pub max_servers: usize,

    /// Bytes reserved per name, terminator included.
    #[serde(default = "default_name_capacity")]
    #[validate(range(min = 2, max = 256))]
    pub name_capacity: usize,
}

fn default_max_servers() -> usize {
    DEFAULT_MAX_SERVERS
}

fn default_name_capacity() -> usize {
    DEFAULT_NAME_CAPACITY
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            max_servers: default_max_servers(),
            name_capacity: default_name_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TimerConfig {
    /// Timer ids per pool (global and per state).
    #[serde(default = "default_pool_capacity")]
    #[validate(range(min = 1, max = 256))]
    pub pool_capacity: usize,
}

fn default_pool_capacity() -> usize {
    DEFAULT_TIMER_POOL_CAPACITY
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            pool_capacity: default_pool_capacity(),
        }
    }
}
