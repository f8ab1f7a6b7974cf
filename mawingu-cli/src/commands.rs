use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use mawingu_capture::{list_interfaces, CaptureOpener, FileOpener, InterfaceInfo, LiveOpener};
use mawingu_config::MawinguConfig;
use mawingu_engine::{capture_settings, CaptureOutcome, Monitor, MonitorSettings, StdoutSink};
use mawingu_protocols::MacAddr;
use mawingu_telemetry::EventLogger;
use tracing::{info, warn};

#[derive(Parser, Debug, Clone)]
#[command(name = "mawingu", version, about = "Passive LAN traffic monitor")]
pub struct Cli {
    /// Network interface to monitor. Omit to list available interfaces.
    pub interface: Option<String>,

    /// Configuration file (defaults to config/mawingu.yaml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Replay a pcap capture file instead of a live interface
    #[arg(short, long, value_name = "FILE", conflicts_with = "interface")]
    pub read: Option<PathBuf>,

    /// Seconds between reports
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub report_interval: Option<u64>,

    /// Seconds between device aging sweeps
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub aging_interval: Option<u64>,

    /// Seconds of silence before a device is marked inactive
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub silence_threshold: Option<u64>,

    /// Hardware address to treat as this host's own interface
    #[arg(long, value_name = "MAC")]
    pub local_mac: Option<MacAddr>,

    /// Do not clear the terminal before each report
    #[arg(long)]
    pub no_clear: bool,
}

enum Target {
    Live(String),
    File(PathBuf),
}

impl Cli {
    fn load_config(&self) -> anyhow::Result<MawinguConfig> {
        let mut config = match &self.config {
            Some(path) => MawinguConfig::load_from_path(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?,
            None => MawinguConfig::load().context("failed to load configuration")?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Command line flags win over every configuration layer.
    fn apply_overrides(&self, config: &mut MawinguConfig) {
        if let Some(interface) = &self.interface {
            config.capture.interface = Some(interface.clone());
        }
        if let Some(secs) = self.report_interval {
            config.monitor.report_interval_secs = secs;
        }
        if let Some(secs) = self.aging_interval {
            config.monitor.aging_interval_secs = secs;
        }
        if let Some(secs) = self.silence_threshold {
            config.monitor.silence_threshold_secs = secs;
        }
        if let Some(mac) = self.local_mac {
            config.monitor.local_mac = Some(mac.to_string());
        }
        if self.no_clear {
            config.monitor.clear_screen = false;
        }
    }

    fn target(&self, config: &MawinguConfig) -> Option<Target> {
        match (&self.read, &config.capture.interface) {
            (Some(path), _) => Some(Target::File(path.clone())),
            (None, Some(interface)) => Some(Target::Live(interface.clone())),
            (None, None) => None,
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.load_config()?;
    EventLogger::init(&config.telemetry.log_level);

    let opener: Box<dyn CaptureOpener> = match cli.target(&config) {
        Some(Target::Live(interface)) => {
            Box::new(LiveOpener::new(interface, capture_settings(&config.capture)))
        }
        Some(Target::File(path)) => Box::new(FileOpener::new(path)),
        None => return Ok(print_interfaces()),
    };

    let signals = ShutdownSignals::install();
    run_monitor(opener, &config, signals).await
}

/// Starts the monitor and runs it until a shutdown signal arrives or the
/// capture ends on its own, then prints one final report.
async fn run_monitor(
    opener: Box<dyn CaptureOpener>,
    config: &MawinguConfig,
    mut signals: ShutdownSignals,
) -> anyhow::Result<ExitCode> {
    let source = opener.describe();
    let settings = MonitorSettings::from_config(config);
    let sink = Arc::new(StdoutSink::new(settings.clear_screen));
    let mut monitor = Monitor::new(opener, settings).with_sink(sink);

    monitor
        .start()
        .with_context(|| format!("failed to start monitoring {source}"))?;
    info!(%source, "monitoring started, press Ctrl+C to stop");

    let outcome = tokio::select! {
        _ = signals.recv() => {
            info!("shutdown signal received");
            CaptureOutcome::Stopped
        }
        outcome = monitor.capture_finished() => outcome,
    };

    monitor.stop().await;
    monitor.emit_report();

    Ok(match outcome {
        CaptureOutcome::Failed(reason) => {
            eprintln!("Capture on {source} failed: {reason}");
            ExitCode::FAILURE
        }
        CaptureOutcome::Stopped | CaptureOutcome::SourceClosed => ExitCode::SUCCESS,
    })
}

fn format_interface(info: &InterfaceInfo) -> String {
    match info.address {
        Some(address) => format!("  - {} ({address})", info.name),
        None => format!("  - {}", info.name),
    }
}

fn print_interfaces() -> ExitCode {
    println!("Usage: mawingu <interface>");
    match list_interfaces() {
        Ok(interfaces) => {
            println!("Available interfaces:");
            for info in &interfaces {
                println!("{}", format_interface(info));
            }
        }
        Err(e) => eprintln!("Could not enumerate interfaces: {e}"),
    }
    ExitCode::FAILURE
}

/// Interrupt and termination listeners.
///
/// Handlers are registered by [`ShutdownSignals::install`], so a signal that
/// arrives before the first [`ShutdownSignals::recv`] is still delivered
/// instead of killing the process.
struct ShutdownSignals {
    #[cfg(unix)]
    interrupt: Option<tokio::signal::unix::Signal>,
    #[cfg(unix)]
    terminate: Option<tokio::signal::unix::Signal>,
    #[cfg(windows)]
    ctrl_c: Option<tokio::signal::windows::CtrlC>,
}

impl ShutdownSignals {
    #[cfg(unix)]
    fn install() -> Self {
        use tokio::signal::unix::{signal, SignalKind};
        let listen = |kind: SignalKind, name: &str| match signal(kind) {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!(error = %e, signal = name, "cannot listen for signal");
                None
            }
        };
        Self {
            interrupt: listen(SignalKind::interrupt(), "SIGINT"),
            terminate: listen(SignalKind::terminate(), "SIGTERM"),
        }
    }

    #[cfg(windows)]
    fn install() -> Self {
        let ctrl_c = tokio::signal::windows::ctrl_c()
            .map_err(|e| warn!(error = %e, "cannot listen for Ctrl+C"))
            .ok();
        Self { ctrl_c }
    }

    /// Resolves on the next shutdown request.
    #[cfg(unix)]
    async fn recv(&mut self) {
        tokio::select! {
            _ = next_signal(&mut self.interrupt) => {}
            _ = next_signal(&mut self.terminate) => {}
        }
    }

    #[cfg(windows)]
    async fn recv(&mut self) {
        match &mut self.ctrl_c {
            Some(ctrl_c) => {
                ctrl_c.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(unix)]
async fn next_signal(listener: &mut Option<tokio::signal::unix::Signal>) {
    match listener {
        Some(listener) => {
            listener.recv().await;
        }
        None => std::future::pending::<()>().await,
    }
}
