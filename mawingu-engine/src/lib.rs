/*!
# Monitor Engine

Runs the live traffic monitor: one blocking capture pipeline feeding the
aggregator, plus periodic reporting and device-aging tasks, all sharing a
single stop signal. [`Monitor`] owns the lifecycle.
*/

pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod report;
pub mod signal;
pub mod tasks;

pub use error::MonitorError;
pub use monitor::{capture_settings, Monitor, MonitorSettings, MonitorState};
pub use pipeline::CaptureOutcome;
pub use report::{render_report, BufferSink, ReportSink, StdoutSink};
pub use signal::StopSignal;
