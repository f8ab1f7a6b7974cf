/*!
# Monitor Facade

Owns one traffic aggregator and the three background tasks that feed and
read it. Lifecycle: `Created -> Running -> Stopped`, where `Stopped` is
terminal. Snapshots can be read in every state.
*/

use std::sync::Arc;
use std::time::Duration;

use mawingu_capture::{CaptureOpener, CaptureSettings};
use mawingu_config::{CaptureConfig, MawinguConfig};
use mawingu_core::{Aggregator, Clock, Device, TrafficSnapshot, TrafficStats};
use mawingu_protocols::MacAddr;
use mawingu_telemetry::{EventLogger, MetricsRecorder};
use opentelemetry::KeyValue;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, Instrument};

use crate::error::MonitorError;
use crate::pipeline::{run_capture, CaptureOutcome};
use crate::report::{render_report, ReportSink, StdoutSink};
use crate::signal::StopSignal;
use crate::tasks::{run_aging, run_reporting};

/// Timing and identity parameters for a [`Monitor`].
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    pub report_interval: Duration,
    pub aging_interval: Duration,
    pub silence_threshold: chrono::Duration,
    /// Used by the default stdout sink.
    pub clear_screen: bool,
    /// Overrides the hardware address reported by the capture opener.
    pub local_mac: Option<MacAddr>,
    pub log_metrics_on_shutdown: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            report_interval: Duration::from_secs(30),
            aging_interval: Duration::from_secs(300),
            silence_threshold: chrono::Duration::minutes(10),
            clear_screen: true,
            local_mac: None,
            log_metrics_on_shutdown: false,
        }
    }
}

impl MonitorSettings {
    pub fn from_config(config: &MawinguConfig) -> Self {
        let monitor = &config.monitor;
        let silence_threshold = i64::try_from(monitor.silence_threshold_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX);

        Self {
            report_interval: monitor.report_interval(),
            aging_interval: monitor.aging_interval(),
            silence_threshold,
            clear_screen: monitor.clear_screen,
            local_mac: monitor.local_mac.as_deref().and_then(|mac| mac.parse().ok()),
            log_metrics_on_shutdown: config.telemetry.log_metrics_on_shutdown,
        }
    }
}

/// Translates loaded capture configuration into libpcap parameters.
pub fn capture_settings(config: &CaptureConfig) -> CaptureSettings {
    let clamp = |value: u64| i32::try_from(value).unwrap_or(i32::MAX);
    CaptureSettings {
        promiscuous: config.promiscuous,
        snaplen: clamp(config.snaplen.into()),
        read_timeout_ms: clamp(config.read_timeout_ms.into()),
        immediate_mode: config.immediate_mode,
        buffer_size: clamp(config.buffer_size as u64),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Created,
    Running,
    Stopped,
}

struct RunningTasks {
    capture: JoinHandle<CaptureOutcome>,
    reporter: JoinHandle<()>,
    ager: JoinHandle<()>,
}

pub struct Monitor {
    settings: MonitorSettings,
    opener: Box<dyn CaptureOpener>,
    aggregator: Arc<Aggregator>,
    metrics: MetricsRecorder,
    sink: Arc<dyn ReportSink>,
    stop: StopSignal,
    state: MonitorState,
    tasks: Option<RunningTasks>,
    capture_done: Option<watch::Receiver<Option<CaptureOutcome>>>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("source", &self.opener.describe())
            .field("state", &self.state)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a monitor in the `Created` state. Nothing is opened yet.
    ///
    /// The local hardware address comes from `settings.local_mac` if set,
    /// otherwise from the opener.
    pub fn new(opener: Box<dyn CaptureOpener>, settings: MonitorSettings) -> Self {
        let local_mac = settings.local_mac.or_else(|| opener.local_mac());
        Self {
            aggregator: Arc::new(Aggregator::new(local_mac)),
            sink: Arc::new(StdoutSink::new(settings.clear_screen)),
            metrics: MetricsRecorder::new(),
            stop: StopSignal::new(),
            state: MonitorState::Created,
            tasks: None,
            capture_done: None,
            settings,
            opener,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_metrics(mut self, metrics: MetricsRecorder) -> Self {
        self.metrics = metrics;
        self
    }

    /// Replaces the time source. Any traffic already observed is discarded,
    /// so call this before [`Monitor::start`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.aggregator = Arc::new(Aggregator::with_clock(self.aggregator.local_mac(), clock));
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn local_mac(&self) -> Option<MacAddr> {
        self.aggregator.local_mac()
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    /// Opens the capture source and spawns the capture pipeline, reporting
    /// task and aging task.
    ///
    /// Must be called from within a Tokio runtime. If the source cannot be
    /// opened the monitor stays `Created` and may be started again.
    pub fn start(&mut self) -> Result<(), MonitorError> {
        match self.state {
            MonitorState::Created => {}
            MonitorState::Running => return Err(MonitorError::AlreadyRunning),
            MonitorState::Stopped => return Err(MonitorError::AlreadyStopped),
        }

        let source = self.opener.open()?;
        let (done_tx, done_rx) = watch::channel(None);

        let capture = {
            let aggregator = Arc::clone(&self.aggregator);
            let metrics = self.metrics.clone();
            let stop = self.stop.clone();
            let span = info_span!("capture_task", source = %self.opener.describe());
            tokio::task::spawn_blocking(move || {
                span.in_scope(|| {
                    let outcome = run_capture(source, &aggregator, &metrics, &stop);
                    done_tx.send_replace(Some(outcome.clone()));
                    outcome
                })
            })
        };

        let reporter = tokio::spawn(
            run_reporting(
                Arc::clone(&self.aggregator),
                Arc::clone(&self.sink),
                self.settings.report_interval,
                self.stop.clone(),
            )
            .instrument(info_span!("reporter")),
        );

        let ager = tokio::spawn(
            run_aging(
                Arc::clone(&self.aggregator),
                self.settings.aging_interval,
                self.settings.silence_threshold,
                self.stop.clone(),
            )
            .instrument(info_span!("ager")),
        );

        self.tasks = Some(RunningTasks {
            capture,
            reporter,
            ager,
        });
        self.capture_done = Some(done_rx);
        self.state = MonitorState::Running;

        EventLogger::log_event(
            "monitor_started",
            &[
                KeyValue::new("source", self.opener.describe()),
                KeyValue::new(
                    "local_mac",
                    self.local_mac().map(|mac| mac.to_string()).unwrap_or_default(),
                ),
                KeyValue::new("report_interval_secs", self.settings.report_interval.as_secs() as i64),
                KeyValue::new("aging_interval_secs", self.settings.aging_interval.as_secs() as i64),
            ],
        );
        Ok(())
    }

    /// Resolves once the capture loop has exited, returning why.
    ///
    /// Only the capture loop is awaited; the periodic tasks keep running
    /// until [`Monitor::stop`]. Returns [`CaptureOutcome::Stopped`] at once
    /// if the monitor was never started.
    pub async fn capture_finished(&self) -> CaptureOutcome {
        let Some(done) = &self.capture_done else {
            return CaptureOutcome::Stopped;
        };
        let mut done = done.clone();
        let outcome = match done.wait_for(Option::is_some).await {
            Ok(outcome) => outcome.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| CaptureOutcome::Failed("capture task ended unexpectedly".into()))
    }

    /// Signals every task to finish and waits for them. The capture source
    /// is closed once the capture loop observes the signal, which takes at
    /// most one read timeout.
    ///
    /// Idempotent. Calling it on a monitor that never started does nothing.
    pub async fn stop(&mut self) {
        if self.state != MonitorState::Running {
            return;
        }
        self.stop.trigger();

        if let Some(tasks) = self.tasks.take() {
            match tasks.capture.await {
                Ok(outcome) => debug!(?outcome, "capture task joined"),
                Err(e) => error!(error = %e, "capture task failed"),
            }
            for (name, handle) in [("reporting", tasks.reporter), ("aging", tasks.ager)] {
                if let Err(e) = handle.await {
                    error!(task = name, error = %e, "background task failed");
                }
            }
        }
        self.state = MonitorState::Stopped;

        let snapshot = self.aggregator.snapshot();
        EventLogger::log_event(
            "monitor_stopped",
            &[
                KeyValue::new("packets", snapshot.stats.total_packets as i64),
                KeyValue::new("bytes", snapshot.stats.total_bytes as i64),
                KeyValue::new("devices", snapshot.total_devices() as i64),
            ],
        );

        match self.metrics.gather_metrics() {
            Ok(exposition) if self.settings.log_metrics_on_shutdown => {
                info!("final metrics:\n{exposition}")
            }
            Ok(exposition) => debug!("final metrics:\n{exposition}"),
            Err(e) => error!(error = %e, "failed to gather metrics"),
        }
    }

    pub fn snapshot(&self) -> TrafficSnapshot {
        self.aggregator.snapshot()
    }

    pub fn stats(&self) -> TrafficStats {
        self.aggregator.stats()
    }

    pub fn devices(&self) -> Vec<Device> {
        self.aggregator.devices()
    }

    /// Renders the current snapshot without emitting it.
    pub fn render_report(&self) -> String {
        render_report(&self.aggregator.snapshot())
    }

    /// Renders the current snapshot and sends it to the configured sink.
    pub fn emit_report(&self) {
        self.sink.emit(&self.render_report());
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.stop.trigger();
    }
}
