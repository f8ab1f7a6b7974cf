//! ## mawingu-protocols::classify
//! A lax layer walker that extracts attribution fields from one frame.
//!
//! Classification never fails: whatever layers decode cleanly are reported,
//! and the reason decoding stopped early (if it did) is carried alongside as a
//! [`DecodeIssue`].

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use etherparse::{LaxPacketHeaders, LinkHeader, NetHeaders, TransportHeader};
use thiserror::Error;

use crate::link::LinkType;
use crate::mac::MacAddr;

/// Why a frame could only be partially classified.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeIssue {
    #[error("unsupported link type {0}")]
    UnsupportedLink(i32),
    #[error("frame too short for link header: {0}")]
    LinkTruncated(String),
    #[error("decoding stopped at {layer}: {reason}")]
    Stopped { layer: String, reason: String },
}

/// Transport protocol of a frame, with its ports when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    None,
    Tcp { src_port: u16, dst_port: u16 },
    Udp { src_port: u16, dst_port: u16 },
}

impl Transport {
    pub fn src_port(&self) -> u16 {
        match *self {
            Transport::Tcp { src_port, .. } | Transport::Udp { src_port, .. } => src_port,
            Transport::None => 0,
        }
    }

    pub fn dst_port(&self) -> u16 {
        match *self {
            Transport::Tcp { dst_port, .. } | Transport::Udp { dst_port, .. } => dst_port,
            Transport::None => 0,
        }
    }

    /// True if either port equals `port`. Always false for [`Transport::None`].
    pub fn involves_port(&self, port: u16) -> bool {
        !matches!(self, Transport::None) && (self.src_port() == port || self.dst_port() == port)
    }
}

/// Attribution fields extracted from one frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    pub src_mac: Option<MacAddr>,
    pub dst_mac: Option<MacAddr>,
    pub src_ip: Option<IpAddr>,
    pub dst_ip: Option<IpAddr>,
    pub transport: Transport,
    /// Set when one of the layers could not be decoded.
    pub issue: Option<DecodeIssue>,
}

impl Classification {
    pub fn is_partial(&self) -> bool {
        self.issue.is_some()
    }
}

/// Classifies a raw frame of the given link type.
pub fn classify(link_type: LinkType, data: &[u8]) -> Classification {
    match link_type {
        LinkType::Ethernet => match LaxPacketHeaders::from_ethernet(data) {
            Ok(headers) => from_headers(headers),
            Err(err) => Classification {
                issue: Some(DecodeIssue::LinkTruncated(err.to_string())),
                ..Classification::default()
            },
        },
        LinkType::RawIp => match LaxPacketHeaders::from_ip(data) {
            Ok(headers) => from_headers(headers),
            Err(err) => Classification {
                issue: Some(DecodeIssue::Stopped {
                    layer: "ip".into(),
                    reason: err.to_string(),
                }),
                ..Classification::default()
            },
        },
        LinkType::Other(dlt) => Classification {
            issue: Some(DecodeIssue::UnsupportedLink(dlt)),
            ..Classification::default()
        },
    }
}

fn from_headers(headers: LaxPacketHeaders<'_>) -> Classification {
    let mut result = Classification::default();

    if let Some(LinkHeader::Ethernet2(eth)) = &headers.link {
        result.src_mac = Some(MacAddr::new(eth.source));
        result.dst_mac = Some(MacAddr::new(eth.destination));
    }

    match &headers.net {
        Some(NetHeaders::Ipv4(ipv4, _)) => {
            result.src_ip = Some(IpAddr::V4(Ipv4Addr::from(ipv4.source)));
            result.dst_ip = Some(IpAddr::V4(Ipv4Addr::from(ipv4.destination)));
        }
        Some(NetHeaders::Ipv6(ipv6, _)) => {
            result.src_ip = Some(IpAddr::V6(Ipv6Addr::from(ipv6.source)));
            result.dst_ip = Some(IpAddr::V6(Ipv6Addr::from(ipv6.destination)));
        }
        _ => {}
    }

    result.transport = match &headers.transport {
        Some(TransportHeader::Tcp(tcp)) => Transport::Tcp {
            src_port: tcp.source_port,
            dst_port: tcp.destination_port,
        },
        Some(TransportHeader::Udp(udp)) => Transport::Udp {
            src_port: udp.source_port,
            dst_port: udp.destination_port,
        },
        _ => Transport::None,
    };

    if let Some((err, layer)) = &headers.stop_err {
        result.issue = Some(DecodeIssue::Stopped {
            layer: format!("{layer:?}"),
            reason: err.to_string(),
        });
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use etherparse::PacketBuilder;

    const SRC: [u8; 6] = [0xaa; 6];
    const DST: [u8; 6] = [0xbb; 6];

    fn tcp_frame(src_port: u16, dst_port: u16) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2(SRC, DST)
            .ipv4([192, 168, 1, 10], [93, 184, 216, 34], 64)
            .tcp(src_port, dst_port, 1, 1024);
        let payload = b"hello";
        let mut out = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut out, payload).unwrap();
        out
    }

    fn udp_frame(src_port: u16, dst_port: u16) -> Vec<u8> {
        let builder = PacketBuilder::ethernet2(SRC, DST)
            .ipv4([10, 0, 0, 2], [10, 0, 0, 1], 64)
            .udp(src_port, dst_port);
        let payload = [0u8; 12];
        let mut out = Vec::with_capacity(builder.size(payload.len()));
        builder.write(&mut out, &payload).unwrap();
        out
    }

    #[test]
    fn classifies_tcp_over_ipv4() {
        let frame = tcp_frame(40000, 443);
        let c = classify(LinkType::Ethernet, &frame);
        assert_eq!(c.src_mac, Some(MacAddr::new(SRC)));
        assert_eq!(c.dst_mac, Some(MacAddr::new(DST)));
        assert_eq!(c.src_ip, Some("192.168.1.10".parse().unwrap()));
        assert_eq!(c.dst_ip, Some("93.184.216.34".parse().unwrap()));
        assert_eq!(
            c.transport,
            Transport::Tcp {
                src_port: 40000,
                dst_port: 443
            }
        );
        assert!(!c.is_partial());
    }

    #[test]
    fn classifies_udp_dns() {
        let frame = udp_frame(5353, 53);
        let c = classify(LinkType::Ethernet, &frame);
        assert!(matches!(c.transport, Transport::Udp { .. }));
        assert!(c.transport.involves_port(53));
        assert!(!c.transport.involves_port(80));
    }

    #[test]
    fn classifies_ipv6() {
        let builder = PacketBuilder::ethernet2(SRC, DST)
            .ipv6([0xfe; 16], [0x20; 16], 64)
            .udp(1000, 2000);
        let mut frame = Vec::with_capacity(builder.size(0));
        builder.write(&mut frame, &[]).unwrap();

        let c = classify(LinkType::Ethernet, &frame);
        assert_eq!(c.src_ip, Some(IpAddr::V6(Ipv6Addr::from([0xfe; 16]))));
        assert_eq!(c.transport.dst_port(), 2000);
    }

    #[test]
    fn decodes_through_a_vlan_tag() {
        let builder = PacketBuilder::ethernet2(SRC, DST)
            .single_vlan(etherparse::VlanId::try_new(100).unwrap())
            .ipv4([10, 0, 0, 1], [10, 0, 0, 2], 64)
            .tcp(40000, 443, 1, 1024);
        let mut frame = Vec::with_capacity(builder.size(0));
        builder.write(&mut frame, &[]).unwrap();

        let c = classify(LinkType::Ethernet, &frame);
        assert_eq!(c.src_mac, Some(MacAddr::new(SRC)));
        assert_eq!(c.src_ip, Some("10.0.0.1".parse().unwrap()));
        assert_eq!(c.dst_ip, Some("10.0.0.2".parse().unwrap()));
        assert_eq!(
            c.transport,
            Transport::Tcp {
                src_port: 40000,
                dst_port: 443
            }
        );
        assert!(!c.is_partial());
    }

    #[test]
    fn keeps_link_fields_when_ip_is_truncated() {
        let mut frame = tcp_frame(1234, 80);
        // Ethernet header plus the first few bytes of the IPv4 header.
        frame.truncate(14 + 6);
        let c = classify(LinkType::Ethernet, &frame);
        assert_eq!(c.src_mac, Some(MacAddr::new(SRC)));
        assert_eq!(c.src_ip, None);
        assert_eq!(c.transport, Transport::None);
        assert!(c.is_partial());
    }

    #[test]
    fn short_frame_yields_empty_classification() {
        let c = classify(LinkType::Ethernet, &[0x01, 0x02, 0x03]);
        assert_eq!(c.src_mac, None);
        assert_eq!(c.dst_mac, None);
        assert!(matches!(c.issue, Some(DecodeIssue::LinkTruncated(_))));
    }

    #[test]
    fn non_ip_ethertype_has_macs_only() {
        // ARP ethertype with a zeroed body.
        let mut frame = Vec::new();
        frame.extend_from_slice(&DST);
        frame.extend_from_slice(&SRC);
        frame.extend_from_slice(&[0x08, 0x06]);
        frame.extend_from_slice(&[0u8; 28]);
        let c = classify(LinkType::Ethernet, &frame);
        assert_eq!(c.src_mac, Some(MacAddr::new(SRC)));
        assert_eq!(c.src_ip, None);
        assert_eq!(c.transport, Transport::None);
    }

    #[test]
    fn raw_ip_frames_have_no_hardware_addresses() {
        let frame = tcp_frame(5000, 80);
        let c = classify(LinkType::RawIp, &frame[14..]);
        assert_eq!(c.src_mac, None);
        assert_eq!(c.dst_ip, Some("93.184.216.34".parse().unwrap()));
        assert!(c.transport.involves_port(80));
    }

    #[test]
    fn unsupported_link_type_is_reported() {
        let c = classify(LinkType::Other(113), &[0u8; 64]);
        assert_eq!(c.issue, Some(DecodeIssue::UnsupportedLink(113)));
        assert_eq!(c.transport, Transport::None);
    }

    #[test]
    fn transport_none_reports_zero_ports() {
        let t = Transport::None;
        assert_eq!(t.src_port(), 0);
        assert_eq!(t.dst_port(), 0);
        assert!(!t.involves_port(0));
    }

    proptest::proptest! {
        #[test]
        fn never_panics_on_arbitrary_bytes(data in proptest::collection::vec(proptest::num::u8::ANY, 0..256)) {
            let _ = classify(LinkType::Ethernet, &data);
            let _ = classify(LinkType::RawIp, &data);
        }
    }
}
