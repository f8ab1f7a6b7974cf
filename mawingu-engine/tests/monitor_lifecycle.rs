use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mawingu_capture::{
    CaptureError, CaptureEvent, CaptureOpener, FileOpener, Frame, FrameSource, ReplayOpener,
};
use mawingu_engine::{
    BufferSink, CaptureOutcome, Monitor, MonitorError, MonitorSettings, MonitorState,
};
use mawingu_protocols::{LinkType, MacAddr};

fn mac(s: &str) -> MacAddr {
    s.parse().unwrap()
}

fn tcp_frame(src: MacAddr, dst: MacAddr, dst_port: u16, total_len: usize) -> Frame {
    let builder = etherparse::PacketBuilder::ethernet2(src.octets(), dst.octets())
        .ipv4([10, 0, 0, 2], [10, 0, 0, 1], 64)
        .tcp(51515, dst_port, 7, 4096);
    let payload = vec![0u8; total_len - builder.size(0)];
    let mut data = Vec::with_capacity(total_len);
    builder.write(&mut data, &payload).unwrap();
    assert_eq!(data.len(), total_len);
    Frame::ethernet(data)
}

fn quiet_settings() -> MonitorSettings {
    MonitorSettings {
        report_interval: Duration::from_secs(3600),
        aging_interval: Duration::from_secs(3600),
        clear_screen: false,
        ..MonitorSettings::default()
    }
}

/// Never yields a frame; every read times out like an idle live interface.
struct IdleSource;

impl FrameSource for IdleSource {
    fn next_frame(&mut self) -> Result<CaptureEvent, CaptureError> {
        std::thread::sleep(Duration::from_millis(5));
        Ok(CaptureEvent::Idle)
    }

    fn link_type(&self) -> LinkType {
        LinkType::Ethernet
    }
}

#[derive(Default)]
struct IdleOpener {
    opened: Arc<AtomicUsize>,
}

impl CaptureOpener for IdleOpener {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(IdleSource))
    }

    fn local_mac(&self) -> Option<MacAddr> {
        None
    }

    fn describe(&self) -> String {
        "idle".into()
    }
}

struct MissingInterface;

impl CaptureOpener for MissingInterface {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        Err(CaptureError::DeviceNotFound("nosuch0".into()))
    }

    fn local_mac(&self) -> Option<MacAddr> {
        None
    }

    fn describe(&self) -> String {
        "nosuch0".into()
    }
}

#[tokio::test]
async fn replay_runs_to_completion_and_stops_cleanly() {
    let local = mac("bb:bb:bb:bb:bb:bb");
    let frames = vec![
        tcp_frame(mac("aa:aa:aa:aa:aa:aa"), local, 443, 128),
        tcp_frame(mac("cc:cc:cc:cc:cc:cc"), local, 8080, 64),
        tcp_frame(mac("cc:cc:cc:cc:cc:cc"), local, 8080, 200),
    ];
    let mut monitor = Monitor::new(Box::new(ReplayOpener::new(frames, Some(local))), quiet_settings())
        .with_sink(Arc::new(BufferSink::new()));
    assert_eq!(monitor.state(), MonitorState::Created);

    monitor.start().unwrap();
    assert_eq!(monitor.state(), MonitorState::Running);
    assert_eq!(monitor.capture_finished().await, CaptureOutcome::SourceClosed);

    monitor.stop().await;
    assert_eq!(monitor.state(), MonitorState::Stopped);

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.stats.total_packets, 3);
    assert_eq!(snapshot.stats.total_bytes, 392);
    assert_eq!(snapshot.stats.tcp_conns, 3);
    assert_eq!(snapshot.stats.https_requests, 1);
    assert_eq!(snapshot.stats.http_requests, 0);
    assert_eq!(snapshot.total_devices(), 2);
    assert!(snapshot.device(&local).is_none());

    let aa = snapshot.device(&mac("aa:aa:aa:aa:aa:aa")).unwrap();
    assert_eq!((aa.bytes_sent(), aa.packets_sent()), (128, 1));
    let cc = snapshot.device(&mac("cc:cc:cc:cc:cc:cc")).unwrap();
    assert_eq!((cc.bytes_sent(), cc.packets_sent()), (264, 2));

    assert_eq!(monitor.metrics().frames.get(), 3);
    assert!(monitor.render_report().contains("Active Devices: 2 | Total Devices: 2"));
}

#[tokio::test]
async fn failed_open_leaves_monitor_created() {
    let mut monitor = Monitor::new(Box::new(MissingInterface), quiet_settings());

    let err = monitor.start().unwrap_err();
    assert!(matches!(
        err,
        MonitorError::CaptureUnavailable(CaptureError::DeviceNotFound(_))
    ));
    assert_eq!(monitor.state(), MonitorState::Created);

    // Stop before a successful start is a no-op.
    monitor.stop().await;
    assert_eq!(monitor.state(), MonitorState::Created);
    assert_eq!(monitor.stats().total_packets, 0);
    assert_eq!(monitor.capture_finished().await, CaptureOutcome::Stopped);
}

#[tokio::test]
async fn lifecycle_transitions_are_enforced() {
    let opener = IdleOpener::default();
    let opened = Arc::clone(&opener.opened);
    let mut monitor = Monitor::new(Box::new(opener), quiet_settings());

    monitor.start().unwrap();
    assert!(matches!(monitor.start(), Err(MonitorError::AlreadyRunning)));
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    tokio::time::timeout(Duration::from_secs(5), monitor.stop())
        .await
        .expect("stop completes once the idle read returns");
    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert_eq!(monitor.capture_finished().await, CaptureOutcome::Stopped);

    monitor.stop().await;
    assert_eq!(monitor.state(), MonitorState::Stopped);
    assert!(matches!(monitor.start(), Err(MonitorError::AlreadyStopped)));
    assert_eq!(opened.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn periodic_reports_reach_the_sink() {
    let sink = Arc::new(BufferSink::new());
    let settings = MonitorSettings {
        report_interval: Duration::from_millis(20),
        ..quiet_settings()
    };
    let mut monitor = Monitor::new(Box::new(IdleOpener::default()), settings).with_sink(sink.clone());

    monitor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;
    monitor.stop().await;

    let emitted = sink.len();
    assert!(emitted >= 2, "expected periodic reports, got {emitted}");
    assert!(sink.reports()[0].contains("CONNECTED DEVICES"));

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(sink.len(), emitted, "no reports after stop");

    monitor.emit_report();
    assert_eq!(sink.len(), emitted + 1);
}

#[tokio::test]
async fn settings_override_opener_local_address() {
    let opener_mac = mac("aa:aa:aa:aa:aa:aa");
    let override_mac = mac("dd:dd:dd:dd:dd:dd");
    let frames = vec![tcp_frame(opener_mac, override_mac, 80, 100)];
    let settings = MonitorSettings {
        local_mac: Some(override_mac),
        ..quiet_settings()
    };
    let mut monitor = Monitor::new(Box::new(ReplayOpener::new(frames, Some(opener_mac))), settings);
    assert_eq!(monitor.local_mac(), Some(override_mac));

    monitor.start().unwrap();
    monitor.capture_finished().await;
    monitor.stop().await;

    let devices = monitor.devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].mac(), opener_mac);
    assert_eq!(monitor.stats().http_requests, 1);
}

#[tokio::test]
async fn capture_file_finishes_at_end_of_file() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../mawingu-capture/tests/fixtures/two_frames.pcap");
    let mut monitor = Monitor::new(Box::new(FileOpener::new(path)), quiet_settings())
        .with_sink(Arc::new(BufferSink::new()));

    monitor.start().unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), monitor.capture_finished())
        .await
        .expect("offline capture ends on its own");
    assert_eq!(outcome, CaptureOutcome::SourceClosed);
    monitor.stop().await;

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.stats.total_packets, 2);
    assert_eq!(snapshot.stats.total_bytes, 100);
    assert_eq!(snapshot.stats.https_requests, 1);
    assert_eq!(snapshot.stats.dns_queries, 1);
    assert_eq!(snapshot.stats.tcp_conns, 1);
    assert_eq!(snapshot.stats.udp_conns, 1);

    let aa = snapshot.device(&mac("aa:aa:aa:aa:aa:aa")).unwrap();
    assert_eq!((aa.bytes_sent(), aa.bytes_recv()), (54, 46));
    assert_eq!(aa.ip(), Some("10.0.0.1".parse().unwrap()));
    let cc = snapshot.device(&mac("cc:cc:cc:cc:cc:cc")).unwrap();
    assert_eq!((cc.bytes_sent(), cc.bytes_recv()), (46, 54));
}
