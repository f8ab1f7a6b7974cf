//! Data-link types reported by the capture source.

/// The link-layer framing of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkType {
    /// IEEE 802.3 Ethernet (DLT_EN10MB).
    #[default]
    Ethernet,
    /// Bare IPv4/IPv6 packets with no link header.
    RawIp,
    /// Any other data-link type, by its DLT number.
    Other(i32),
}

impl LinkType {
    /// Maps a libpcap DLT / LINKTYPE number.
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            1 => LinkType::Ethernet,
            // DLT_RAW has platform-dependent values; 101 is LINKTYPE_RAW,
            // 228/229 are LINKTYPE_IPV4/IPV6.
            12 | 14 | 101 | 228 | 229 => LinkType::RawIp,
            other => LinkType::Other(other),
        }
    }

    /// Whether frames of this type carry hardware addresses.
    pub fn has_hardware_addresses(&self) -> bool {
        matches!(self, LinkType::Ethernet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_dlts() {
        assert_eq!(LinkType::from_dlt(1), LinkType::Ethernet);
        assert_eq!(LinkType::from_dlt(101), LinkType::RawIp);
        assert_eq!(LinkType::from_dlt(12), LinkType::RawIp);
        assert_eq!(LinkType::from_dlt(113), LinkType::Other(113));
        assert!(LinkType::Ethernet.has_hardware_addresses());
        assert!(!LinkType::RawIp.has_hardware_addresses());
    }
}
