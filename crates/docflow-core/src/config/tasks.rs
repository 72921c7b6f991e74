//! Background task tracking configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the in-memory task status map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// How long a task entry survives after its last update.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// How often expired entries are swept.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl TaskConfig {
    /// Entry time-to-live as a [`chrono::Duration`].
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds as i64)
    }

    /// Sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_ttl() -> u64 {
    600
}

fn default_sweep_interval() -> u64 {
    60
}
