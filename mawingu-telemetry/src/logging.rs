//! ## mawingu-telemetry::logging
//! **Structured logging with tracing**
//!
//! Lifecycle events (monitor start/stop, device discovery, aging sweeps) are
//! emitted as spans carrying OpenTelemetry-style key/value metadata so they
//! can be filtered apart from ordinary diagnostics.

use opentelemetry::KeyValue;
use tracing::info_span;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` takes precedence over
    /// `default_level`. Calling this more than once is harmless.
    pub fn init(default_level: &str) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_writer(std::io::stderr)
            .try_init();
    }

    #[inline]
    pub fn log_event(event_type: &str, metadata: &[KeyValue]) {
        let span = info_span!(
            "monitor_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );
        let _entered = span.enter();
        let fields: Vec<String> = metadata
            .iter()
            .map(|kv| format!("{}={}", kv.key.as_str(), kv.value.as_str()))
            .collect();
        tracing::info!(metadata = %fields.join(" "), "{}", event_type);
    }
}
