//! Interface discovery.

use std::net::IpAddr;

use mawingu_protocols::MacAddr;
use pcap::Device;

use crate::error::CaptureError;

/// A capture-capable interface as reported by libpcap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub description: Option<String>,
    /// First address associated with the interface, if any.
    pub address: Option<IpAddr>,
}

/// Enumerates every interface libpcap can capture on.
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>, CaptureError> {
    let devices = Device::list().map_err(CaptureError::Enumerate)?;
    Ok(devices
        .into_iter()
        .map(|device| InterfaceInfo {
            address: device.addresses.first().map(|a| a.addr),
            name: device.name,
            description: device.desc,
        })
        .collect())
}

/// Looks up the hardware address of `interface`.
///
/// Interfaces without one (loopback, tunnels) report `None`.
pub fn local_hardware_address(interface: &str) -> Option<MacAddr> {
    pnet_datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == interface)
        .and_then(|iface| iface.mac)
        .map(|m| MacAddr::new([m.0, m.1, m.2, m.3, m.4, m.5]))
        .filter(|mac| mac.octets() != [0; 6])
}
