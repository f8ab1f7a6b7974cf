//! Console report rendering.
//!
//! Formatting always works on a [`TrafficSnapshot`] copy so the aggregator
//! lock is never held while a report is built or written.

use std::fmt::Write as _;

use chrono::Duration;
use mawingu_core::{Device, TrafficSnapshot};
use parking_lot::Mutex;
use tracing::debug;

const RULE: &str = "═══════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "─────────────────────────────────────────────────────────────";
const CLEAR_SCREEN: &str = "\x1B[H\x1B[J";

/// Destination for rendered reports.
pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &str);
}

/// Writes reports to standard output, optionally clearing the terminal first.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    pub clear_screen: bool,
}

impl StdoutSink {
    pub fn new(clear_screen: bool) -> Self {
        Self { clear_screen }
    }
}

impl StdoutSink {
    fn write_to(&self, out: &mut impl std::io::Write, report: &str) -> std::io::Result<()> {
        if self.clear_screen {
            out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        writeln!(out, "{report}")?;
        out.flush()
    }
}

impl ReportSink for StdoutSink {
    fn emit(&self, report: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = self.write_to(&mut out, report) {
            debug!(error = %e, "failed to write report");
        }
    }
}

/// Keeps every emitted report in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    reports: Mutex<Vec<String>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }
}

impl ReportSink for BufferSink {
    fn emit(&self, report: &str) {
        self.reports.lock().push(report.to_owned());
    }
}

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Renders a duration at second precision, e.g. `1h2m5s`, `45s`, `0s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.num_seconds().max(0);
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn write_device(out: &mut String, device: &Device, snapshot: &TrafficSnapshot) -> std::fmt::Result {
    let status = if device.is_active() { "🟢" } else { "🔴" };
    let ip = device.ip().map(|ip| ip.to_string()).unwrap_or_default();

    writeln!(out, "{status} MAC: {}", device.mac())?;
    writeln!(out, "   IP: {ip:<15} | Active: {}", device.is_active())?;
    writeln!(
        out,
        "   Sent: {:.2} MB ({} packets) | Recv: {:.2} MB ({} packets)",
        megabytes(device.bytes_sent()),
        device.packets_sent(),
        megabytes(device.bytes_recv()),
        device.packets_recv()
    )?;
    writeln!(
        out,
        "   Total: {:.2} MB | Last Seen: {} ago",
        megabytes(device.total_bytes()),
        format_elapsed(device.silent_for(snapshot.taken_at))
    )?;
    writeln!(out)
}

fn write_report(out: &mut String, snapshot: &TrafficSnapshot) -> std::fmt::Result {
    let stats = &snapshot.stats;

    writeln!(out, "{RULE}")?;
    writeln!(out, "{:>47}", "MAWINGU NETWORK MONITOR - STATISTICS")?;
    writeln!(out, "{RULE}")?;
    writeln!(
        out,
        "Total Traffic: {:.2} MB | Packets: {}",
        stats.total_megabytes(),
        stats.total_packets
    )?;
    writeln!(
        out,
        "HTTP: {} | HTTPS: {} | DNS: {}",
        stats.http_requests, stats.https_requests, stats.dns_queries
    )?;
    writeln!(
        out,
        "TCP Connections: {} | UDP: {}",
        stats.tcp_conns, stats.udp_conns
    )?;
    writeln!(out)?;
    writeln!(out, "{THIN_RULE}")?;
    writeln!(out, "{:>38}", "CONNECTED DEVICES")?;
    writeln!(out, "{THIN_RULE}")?;

    for device in &snapshot.devices {
        write_device(out, device, snapshot)?;
    }

    writeln!(
        out,
        "Active Devices: {} | Total Devices: {}",
        snapshot.active_devices(),
        snapshot.total_devices()
    )?;
    write!(out, "{RULE}")
}

/// Renders one snapshot as the console report.
///
/// Devices appear in snapshot order (most recently seen first); "last seen"
/// is measured against the snapshot's own timestamp.
pub fn render_report(snapshot: &TrafficSnapshot) -> String {
    let mut out = String::with_capacity(512 + snapshot.devices.len() * 256);
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, snapshot);
    out
}
