//! Monitoring cadence and device aging configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Monitor timing parameters.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Seconds between console reports.
    #[validate(range(min = 1, max = 86400))]
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,

    /// Seconds between device aging sweeps.
    #[validate(range(min = 1, max = 86400))]
    #[serde(default = "default_aging_interval")]
    pub aging_interval_secs: u64,

    /// Seconds of silence after which a device is marked inactive.
    #[validate(range(min = 1, max = 604800))]
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold_secs: u64,

    /// Clear the terminal before each report.
    #[serde(default = "default_true")]
    pub clear_screen: bool,

    /// Overrides the hardware address treated as the monitor's own
    /// interface. Useful when replaying a capture taken elsewhere.
    #[validate(custom(function = validation::validate_mac))]
    #[serde(default)]
    pub local_mac: Option<String>,
}

fn default_report_interval() -> u64 {
    30
}

fn default_aging_interval() -> u64 {
    300
}

fn default_silence_threshold() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

impl MonitorConfig {
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn aging_interval(&self) -> Duration {
        Duration::from_secs(self.aging_interval_secs)
    }

    pub fn silence_threshold(&self) -> Duration {
        Duration::from_secs(self.silence_threshold_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
            aging_interval_secs: default_aging_interval(),
            silence_threshold_secs: default_silence_threshold(),
            clear_screen: default_true(),
            local_mac: None,
        }
    }
}
