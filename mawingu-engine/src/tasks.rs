//! Periodic background tasks: reporting and device aging.
//!
//! Both tick on `interval_at`, so the first run happens one full period
//! after start, and both exit as soon as the stop signal fires.

use std::sync::Arc;
use std::time::Duration;

use mawingu_core::Aggregator;
use mawingu_telemetry::EventLogger;
use opentelemetry::KeyValue;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, instrument};

use crate::report::{render_report, ReportSink};
use crate::signal::StopSignal;

fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Emits a rendered snapshot every `period` until stopped.
#[instrument(level = "debug", name = "reporting_task", skip_all, fields(period = ?period))]
pub async fn run_reporting(
    aggregator: Arc<Aggregator>,
    sink: Arc<dyn ReportSink>,
    period: Duration,
    mut stop: StopSignal,
) {
    let mut ticker = ticker(period);
    loop {
        tokio::select! {
            _ = stop.triggered() => break,
            _ = ticker.tick() => {
                let snapshot = aggregator.snapshot();
                sink.emit(&render_report(&snapshot));
            }
        }
    }
    debug!("reporting task stopped");
}

/// Demotes devices silent longer than `threshold` every `period` until
/// stopped.
#[instrument(level = "debug", name = "aging_task", skip_all, fields(period = ?period))]
pub async fn run_aging(
    aggregator: Arc<Aggregator>,
    period: Duration,
    threshold: chrono::Duration,
    mut stop: StopSignal,
) {
    let mut ticker = ticker(period);
    loop {
        tokio::select! {
            _ = stop.triggered() => break,
            _ = ticker.tick() => {
                let demoted = aggregator.age_devices(threshold);
                if demoted > 0 {
                    EventLogger::log_event(
                        "devices_aged",
                        &[
                            KeyValue::new("demoted", demoted as i64),
                            KeyValue::new("threshold_secs", threshold.num_seconds()),
                        ],
                    );
                }
            }
        }
    }
    debug!("aging task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::BufferSink;
    use chrono::Utc;
    use mawingu_core::ManualClock;
    use mawingu_protocols::Classification;

    #[tokio::test]
    async fn reporting_emits_on_each_tick_and_stops() {
        let aggregator = Arc::new(Aggregator::new(None));
        let sink = Arc::new(BufferSink::new());
        let stop = StopSignal::new();

        let task = tokio::spawn(run_reporting(
            Arc::clone(&aggregator),
            sink.clone(),
            Duration::from_millis(20),
            stop.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(110)).await;
        stop.trigger();
        task.await.unwrap();

        assert!(sink.len() >= 2, "expected several reports, got {}", sink.len());
        assert!(sink.reports()[0].contains("MAWINGU NETWORK MONITOR"));
    }

    #[tokio::test]
    async fn first_report_waits_a_full_period() {
        let aggregator = Arc::new(Aggregator::new(None));
        let sink = Arc::new(BufferSink::new());
        let stop = StopSignal::new();

        let task = tokio::spawn(run_reporting(
            aggregator,
            sink.clone(),
            Duration::from_secs(60),
            stop.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(30)).await;
        stop.trigger();
        task.await.unwrap();

        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn aging_demotes_silent_devices() {
        let clock = ManualClock::new(Utc::now());
        let aggregator = Arc::new(Aggregator::with_clock(None, Arc::new(clock.clone())));
        let c = Classification {
            src_mac: Some("aa:aa:aa:aa:aa:aa".parse().unwrap()),
            ..Classification::default()
        };
        aggregator.observe(&c, 60);
        clock.advance(chrono::Duration::minutes(11));

        let stop = StopSignal::new();
        let task = tokio::spawn(run_aging(
            Arc::clone(&aggregator),
            Duration::from_millis(10),
            chrono::Duration::minutes(10),
            stop.clone(),
        ));
        tokio::time::sleep(Duration::from_millis(60)).await;
        stop.trigger();
        task.await.unwrap();

        let devices = aggregator.devices();
        assert_eq!(devices.len(), 1);
        assert!(!devices[0].is_active());
    }
}
