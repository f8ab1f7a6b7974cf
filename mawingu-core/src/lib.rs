//! # mawingu-core
//!
//! In-memory traffic state for the monitor: the per-device registry, the
//! aggregate protocol counters, and the [`Aggregator`] that is the single
//! point of mutation for both.
//!
//! ### Key Submodules:
//! - `device`: `Device` records and the registry keyed by hardware address
//! - `stats`: process-lifetime `TrafficStats`
//! - `aggregator`: lock-guarded frame application, aging and snapshots
//! - `time`: `Clock` abstraction with a wall clock and a manual test clock

pub mod aggregator;
pub mod device;
pub mod stats;
pub mod time;

pub mod prelude {
    pub use crate::aggregator::*;
    pub use crate::device::*;
    pub use crate::stats::*;
    pub use crate::time::*;
}

pub use aggregator::{Aggregator, DiscoveredDevice, Observation, TrafficSnapshot};
pub use device::{Device, DeviceRegistry};
pub use stats::TrafficStats;
pub use time::{Clock, ManualClock, SystemClock};
