//! The capture pipeline: pull frames, classify, aggregate.
//!
//! Runs on a blocking worker because libpcap reads block. Per-frame decode
//! problems are absorbed here; only the end of the stream or a read failure
//! ends the loop.

use std::time::Instant;

use mawingu_capture::{CaptureEvent, Frame, FrameSource};
use mawingu_core::{Aggregator, Observation};
use mawingu_protocols::classify;
use mawingu_telemetry::{EventLogger, MetricsRecorder};
use opentelemetry::KeyValue;
use tracing::{error, info, instrument, trace};

use crate::signal::StopSignal;

/// Why the capture loop returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The stop signal was observed.
    Stopped,
    /// The source reported end of stream (offline file exhausted).
    SourceClosed,
    /// A read failed; the message is the underlying capture error.
    Failed(String),
}

impl CaptureOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CaptureOutcome::Failed(_))
    }
}

/// Drives `source` until it closes, fails, or `stop` is triggered.
///
/// The source is dropped (closing the capture handle) before returning.
#[instrument(level = "info", name = "capture_pipeline", skip_all)]
pub fn run_capture(
    mut source: Box<dyn FrameSource>,
    aggregator: &Aggregator,
    metrics: &MetricsRecorder,
    stop: &StopSignal,
) -> CaptureOutcome {
    info!(link_type = ?source.link_type(), "capture pipeline started");

    let outcome = loop {
        if stop.is_triggered() {
            break CaptureOutcome::Stopped;
        }
        match source.next_frame() {
            Ok(CaptureEvent::Frame(frame)) => {
                process_frame(&frame, aggregator, metrics);
            }
            Ok(CaptureEvent::Idle) => continue,
            Ok(CaptureEvent::Closed) => break CaptureOutcome::SourceClosed,
            Err(e) => {
                metrics.capture_errors.inc();
                error!(error = %e, "capture read failed");
                break CaptureOutcome::Failed(e.to_string());
            }
        }
    };

    drop(source);
    info!(?outcome, "capture pipeline finished");
    outcome
}

/// Classifies one frame and applies it to the aggregator.
///
/// Discovery events are logged after the aggregator lock is released.
pub fn process_frame(
    frame: &Frame,
    aggregator: &Aggregator,
    metrics: &MetricsRecorder,
) -> Observation {
    let started = Instant::now();
    let classification = classify(frame.link_type, &frame.data);
    if let Some(issue) = &classification.issue {
        trace!(%issue, len = frame.len(), "frame partially decoded");
    }

    let observation = aggregator.observe(&classification, frame.len());
    metrics.record_frame(
        frame.len(),
        classification.is_partial(),
        started.elapsed().as_nanos() as f64,
    );

    for device in &observation.discovered {
        metrics.devices_discovered.inc();
        EventLogger::log_event(
            "device_discovered",
            &[
                KeyValue::new("mac", device.mac.to_string()),
                KeyValue::new(
                    "ip",
                    device.ip.map(|ip| ip.to_string()).unwrap_or_default(),
                ),
            ],
        );
    }
    observation
}
