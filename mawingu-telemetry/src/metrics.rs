//! ## mawingu-telemetry::metrics
//! **Prometheus counters for the capture pipeline**

use prometheus::{Counter, Histogram, HistogramOpts, IntCounter, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub frames: IntCounter,
    pub frames_degraded: IntCounter,
    pub bytes: Counter,
    pub devices_discovered: IntCounter,
    pub capture_errors: IntCounter,
    pub frame_processing: Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self::try_new().unwrap_or_else(|e| panic!("static metric definitions are valid: {e}"))
    }

    fn try_new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let frames = IntCounter::new("mawingu_frames_total", "Frames pulled from the capture")?;
        let frames_degraded = IntCounter::new(
            "mawingu_frames_degraded_total",
            "Frames that could only be partially classified",
        )?;
        let bytes = Counter::new("mawingu_bytes_total", "Frame bytes observed")?;
        let devices_discovered = IntCounter::new(
            "mawingu_devices_discovered_total",
            "Devices added to the registry",
        )?;
        let capture_errors = IntCounter::new(
            "mawingu_capture_errors_total",
            "Capture reads that failed",
        )?;
        let frame_processing = Histogram::with_opts(
            HistogramOpts::new(
                "mawingu_frame_processing_ns",
                "Classification plus aggregation time per frame",
            )
            .buckets(vec![1_000.0, 10_000.0, 100_000.0, 1_000_000.0]),
        )?;

        registry.register(Box::new(frames.clone()))?;
        registry.register(Box::new(frames_degraded.clone()))?;
        registry.register(Box::new(bytes.clone()))?;
        registry.register(Box::new(devices_discovered.clone()))?;
        registry.register(Box::new(capture_errors.clone()))?;
        registry.register(Box::new(frame_processing.clone()))?;

        Ok(Self {
            registry,
            frames,
            frames_degraded,
            bytes,
            devices_discovered,
            capture_errors,
            frame_processing,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Records one frame that went through classification and aggregation.
    pub fn record_frame(&self, len: usize, degraded: bool, elapsed_ns: f64) {
        self.frames.inc();
        self.bytes.inc_by(len as f64);
        if degraded {
            self.frames_degraded.inc();
        }
        self.frame_processing.observe(elapsed_ns);
    }
}
