//! ## mawingu-core::stats
//! **Aggregate protocol counters**

use mawingu_protocols::{Classification, Transport, DNS_PORT, HTTPS_PORT, HTTP_PORT};

/// Process-lifetime traffic totals.
///
/// Every counter only ever grows. A single frame bumps the totals and at most
/// one of each of {HTTP, HTTPS}, {TCP, UDP}.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TrafficStats {
    pub total_bytes: u64,
    pub total_packets: u64,
    pub http_requests: u64,
    pub https_requests: u64,
    pub dns_queries: u64,
    pub tcp_conns: u64,
    pub udp_conns: u64,
}

impl TrafficStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one frame toward the totals and its protocol tallies.
    pub fn record(&mut self, classification: &Classification, frame_len: u64) {
        self.total_packets = self.total_packets.saturating_add(1);
        self.total_bytes = self.total_bytes.saturating_add(frame_len);

        let transport = classification.transport;
        match transport {
            Transport::Tcp { .. } => {
                self.tcp_conns += 1;
                if transport.involves_port(HTTP_PORT) {
                    self.http_requests += 1;
                } else if transport.involves_port(HTTPS_PORT) {
                    self.https_requests += 1;
                }
            }
            Transport::Udp { .. } => {
                self.udp_conns += 1;
                if transport.involves_port(DNS_PORT) {
                    self.dns_queries += 1;
                }
            }
            Transport::None => {}
        }
    }

    /// Total traffic in mebibytes, for display.
    pub fn total_megabytes(&self) -> f64 {
        self.total_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp(src_port: u16, dst_port: u16) -> Classification {
        Classification {
            transport: Transport::Tcp { src_port, dst_port },
            ..Classification::default()
        }
    }

    fn udp(src_port: u16, dst_port: u16) -> Classification {
        Classification {
            transport: Transport::Udp { src_port, dst_port },
            ..Classification::default()
        }
    }

    #[test]
    fn http_frame_touches_only_tcp_and_http() {
        let mut stats = TrafficStats::new();
        stats.record(&tcp(51000, 80), 100);
        assert_eq!(
            stats,
            TrafficStats {
                total_bytes: 100,
                total_packets: 1,
                http_requests: 1,
                tcp_conns: 1,
                ..TrafficStats::default()
            }
        );
    }

    #[test]
    fn https_counted_on_either_port() {
        let mut stats = TrafficStats::new();
        stats.record(&tcp(443, 51000), 10);
        stats.record(&tcp(51000, 443), 10);
        assert_eq!(stats.https_requests, 2);
        assert_eq!(stats.http_requests, 0);
        assert_eq!(stats.tcp_conns, 2);
    }

    #[test]
    fn port_80_to_443_counts_http_only() {
        let mut stats = TrafficStats::new();
        stats.record(&tcp(80, 443), 10);
        assert_eq!(stats.http_requests + stats.https_requests, 1);
    }

    #[test]
    fn dns_over_udp() {
        let mut stats = TrafficStats::new();
        stats.record(&udp(53, 40000), 90);
        stats.record(&udp(40000, 123), 90);
        assert_eq!(stats.udp_conns, 2);
        assert_eq!(stats.dns_queries, 1);
        assert_eq!(stats.tcp_conns, 0);
    }

    #[test]
    fn tcp_port_53_is_not_dns() {
        let mut stats = TrafficStats::new();
        stats.record(&tcp(53, 40000), 90);
        assert_eq!(stats.dns_queries, 0);
        assert_eq!(stats.tcp_conns, 1);
    }

    #[test]
    fn unclassified_frames_still_count() {
        let mut stats = TrafficStats::new();
        stats.record(&Classification::default(), 42);
        assert_eq!(stats.total_packets, 1);
        assert_eq!(stats.total_bytes, 42);
        assert_eq!(stats.tcp_conns + stats.udp_conns, 0);
    }
}
