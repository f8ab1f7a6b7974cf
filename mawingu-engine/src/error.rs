use mawingu_capture::CaptureError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// The capture source could not be opened (bad interface name,
    /// insufficient privilege). The monitor stays in `Created`.
    #[error("capture unavailable: {0}")]
    CaptureUnavailable(#[from] CaptureError),

    #[error("monitor is already running")]
    AlreadyRunning,

    #[error("monitor has already been stopped")]
    AlreadyStopped,
}
