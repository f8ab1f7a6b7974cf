//! ## mawingu-core::device
//! **Per-device traffic records**
//!
//! A [`Device`] is created the first time its hardware address is observed and
//! is never removed; silence only flips its activity flag.

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::{DateTime, Duration, Utc};
use mawingu_protocols::MacAddr;

/// Which side of a frame a device was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

/// One traffic participant on the monitored link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    mac: MacAddr,
    ip: Option<IpAddr>,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    bytes_sent: u64,
    bytes_recv: u64,
    packets_sent: u64,
    packets_recv: u64,
    active: bool,
}

impl Device {
    pub fn new(mac: MacAddr, seen_at: DateTime<Utc>) -> Self {
        Self {
            mac,
            ip: None,
            first_seen: seen_at,
            last_seen: seen_at,
            bytes_sent: 0,
            bytes_recv: 0,
            packets_sent: 0,
            packets_recv: 0,
            active: true,
        }
    }

    /// Applies one frame to this device and marks it active.
    ///
    /// The network address is only learned once; `last_seen` never moves
    /// backwards even if the clock does.
    pub fn record(
        &mut self,
        direction: Direction,
        bytes: u64,
        ip: Option<IpAddr>,
        seen_at: DateTime<Utc>,
    ) {
        match direction {
            Direction::Sent => {
                self.bytes_sent = self.bytes_sent.saturating_add(bytes);
                self.packets_sent = self.packets_sent.saturating_add(1);
            }
            Direction::Received => {
                self.bytes_recv = self.bytes_recv.saturating_add(bytes);
                self.packets_recv = self.packets_recv.saturating_add(1);
            }
        }
        if seen_at > self.last_seen {
            self.last_seen = seen_at;
        }
        self.active = true;
        if self.ip.is_none() {
            self.ip = ip;
        }
    }

    /// Clears the activity flag if the device has been silent longer than
    /// `threshold`. Returns true if the device was demoted by this call.
    pub fn age(&mut self, now: DateTime<Utc>, threshold: Duration) -> bool {
        if self.active && self.silent_for(now) > threshold {
            self.active = false;
            return true;
        }
        false
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.ip
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    pub fn bytes_recv(&self) -> u64 {
        self.bytes_recv
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn packets_recv(&self) -> u64 {
        self.packets_recv
    }

    pub fn total_bytes(&self) -> u64 {
        self.bytes_sent.saturating_add(self.bytes_recv)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Time since the device was last seen, clamped at zero.
    pub fn silent_for(&self, now: DateTime<Utc>) -> Duration {
        (now - self.last_seen).max(Duration::zero())
    }
}

/// Devices keyed by hardware address.
#[derive(Debug, Default, Clone)]
pub struct DeviceRegistry {
    devices: HashMap<MacAddr, Device>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locates or creates the device for `mac` and applies one frame to it.
    ///
    /// Returns true if the device was created by this call.
    pub fn record(
        &mut self,
        mac: MacAddr,
        direction: Direction,
        bytes: u64,
        ip: Option<IpAddr>,
        seen_at: DateTime<Utc>,
    ) -> bool {
        let mut created = false;
        let device = self.devices.entry(mac).or_insert_with(|| {
            created = true;
            Device::new(mac, seen_at)
        });
        device.record(direction, bytes, ip, seen_at);
        created
    }

    /// Demotes every device silent for longer than `threshold`.
    pub fn age(&mut self, now: DateTime<Utc>, threshold: Duration) -> usize {
        let mut demoted = 0;
        for device in self.devices.values_mut() {
            if device.age(now, threshold) {
                demoted += 1;
            }
        }
        demoted
    }

    pub fn get(&self, mac: &MacAddr) -> Option<&Device> {
        self.devices.get(mac)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.devices.values().filter(|d| d.is_active()).count()
    }

    /// Independent copies of every device, most recently seen first.
    ///
    /// Ties on `last_seen` are broken by hardware address so the order is
    /// stable across calls.
    pub fn to_sorted_vec(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.devices.values().cloned().collect();
        devices.sort_by_key(|d| d.mac());
        devices.sort_by(|a, b| b.last_seen().cmp(&a.last_seen()));
        devices
    }
}
