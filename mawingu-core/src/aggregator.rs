//! ## mawingu-core::aggregator
//! **Single point of mutation for device and protocol state**
//!
//! Writers (frame observation, aging) take the exclusive side of one
//! `RwLock`; snapshot readers take the shared side and walk away with
//! independent copies. Nothing here suspends while holding the lock.

use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mawingu_protocols::{Classification, MacAddr};
use parking_lot::RwLock;
use tracing::debug;

use crate::device::{Device, DeviceRegistry, Direction};
use crate::stats::TrafficStats;
use crate::time::{Clock, SystemClock};

#[derive(Debug, Default)]
struct State {
    registry: DeviceRegistry,
    stats: TrafficStats,
}

/// A device created while applying a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    pub mac: MacAddr,
    pub ip: Option<IpAddr>,
}

/// Side effects of one [`Aggregator::observe`] call worth reporting once the
/// lock has been released.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Observation {
    pub discovered: Vec<DiscoveredDevice>,
}

/// Consistent copy of stats and devices taken under one read lock.
#[derive(Debug, Clone)]
pub struct TrafficSnapshot {
    pub taken_at: DateTime<Utc>,
    pub stats: TrafficStats,
    /// Most recently seen first.
    pub devices: Vec<Device>,
}

impl TrafficSnapshot {
    pub fn total_devices(&self) -> usize {
        self.devices.len()
    }

    pub fn active_devices(&self) -> usize {
        self.devices.iter().filter(|d| d.is_active()).count()
    }

    pub fn device(&self, mac: &MacAddr) -> Option<&Device> {
        self.devices.iter().find(|d| d.mac() == *mac)
    }
}

/// Owns the device registry and aggregate counters.
pub struct Aggregator {
    local_mac: Option<MacAddr>,
    clock: Arc<dyn Clock>,
    state: RwLock<State>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("local_mac", &self.local_mac)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Creates an aggregator on the wall clock.
    ///
    /// `local_mac` is the monitor's own interface address; it is never
    /// tracked as a device. `None` disables the exclusion.
    pub fn new(local_mac: Option<MacAddr>) -> Self {
        Self::with_clock(local_mac, Arc::new(SystemClock))
    }

    pub fn with_clock(local_mac: Option<MacAddr>, clock: Arc<dyn Clock>) -> Self {
        Self {
            local_mac,
            clock,
            state: RwLock::new(State::default()),
        }
    }

    pub fn local_mac(&self) -> Option<MacAddr> {
        self.local_mac
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Applies one frame's effect atomically.
    pub fn observe(&self, classification: &Classification, frame_len: usize) -> Observation {
        let bytes = frame_len as u64;
        let now = self.clock.now();
        let mut observation = Observation::default();

        let mut state = self.state.write();
        state.stats.record(classification, bytes);

        if let Some(src) = classification.src_mac.filter(|mac| !self.is_local(mac)) {
            let ip = classification.src_ip;
            if state.registry.record(src, Direction::Sent, bytes, ip, now) {
                observation.discovered.push(DiscoveredDevice { mac: src, ip });
            }
        }

        if let Some(dst) = classification
            .dst_mac
            .filter(|mac| !self.is_local(mac) && !mac.is_group())
        {
            let ip = classification.dst_ip;
            if state.registry.record(dst, Direction::Received, bytes, ip, now) {
                observation.discovered.push(DiscoveredDevice { mac: dst, ip });
            }
        }

        observation
    }

    /// Marks devices silent for longer than `threshold` as inactive, using
    /// the aggregator's clock. Returns how many were demoted.
    pub fn age_devices(&self, threshold: Duration) -> usize {
        self.age_devices_at(self.clock.now(), threshold)
    }

    pub fn age_devices_at(&self, now: DateTime<Utc>, threshold: Duration) -> usize {
        let demoted = self.state.write().registry.age(now, threshold);
        debug!(demoted, threshold_secs = threshold.num_seconds(), "aging sweep");
        demoted
    }

    pub fn stats(&self) -> TrafficStats {
        self.state.read().stats
    }

    /// Copies of every device, most recently seen first.
    pub fn devices(&self) -> Vec<Device> {
        self.state.read().registry.to_sorted_vec()
    }

    pub fn device(&self, mac: &MacAddr) -> Option<Device> {
        self.state.read().registry.get(mac).cloned()
    }

    pub fn device_count(&self) -> usize {
        self.state.read().registry.len()
    }

    /// Stats and devices from the same instant.
    pub fn snapshot(&self) -> TrafficSnapshot {
        let (stats, devices) = {
            let state = self.state.read();
            (state.stats, state.registry.to_sorted_vec())
        };
        TrafficSnapshot {
            taken_at: self.clock.now(),
            stats,
            devices,
        }
    }

    fn is_local(&self, mac: &MacAddr) -> bool {
        self.local_mac.as_ref() == Some(mac)
    }
}
