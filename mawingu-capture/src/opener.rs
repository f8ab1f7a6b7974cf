//! Deferred construction of frame sources.
//!
//! The monitor holds an opener rather than a source so that a failed open
//! leaves it free to try again.

use std::path::PathBuf;

use mawingu_protocols::MacAddr;

use crate::capture::{CaptureSettings, FrameSource, PcapSource};
use crate::error::CaptureError;
use crate::interfaces::local_hardware_address;
use crate::packet::Frame;
use crate::replay::ReplaySource;

pub trait CaptureOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError>;

    /// Hardware address of the monitor's own interface, if it has one.
    fn local_mac(&self) -> Option<MacAddr>;

    /// Human-readable name of what is being captured.
    fn describe(&self) -> String;
}

/// Opens a live interface through libpcap.
#[derive(Debug, Clone)]
pub struct LiveOpener {
    interface: String,
    settings: CaptureSettings,
}

impl LiveOpener {
    pub fn new(interface: impl Into<String>, settings: CaptureSettings) -> Self {
        Self {
            interface: interface.into(),
            settings,
        }
    }
}

impl CaptureOpener for LiveOpener {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        Ok(Box::new(PcapSource::open_live(&self.interface, &self.settings)?))
    }

    fn local_mac(&self) -> Option<MacAddr> {
        local_hardware_address(&self.interface)
    }

    fn describe(&self) -> String {
        self.interface.clone()
    }
}

/// Opens a pcap savefile.
#[derive(Debug, Clone)]
pub struct FileOpener {
    path: PathBuf,
    local_mac: Option<MacAddr>,
}

impl FileOpener {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            local_mac: None,
        }
    }

    /// Treat `mac` as the capturing host when attributing recorded traffic.
    pub fn with_local_mac(mut self, mac: Option<MacAddr>) -> Self {
        self.local_mac = mac;
        self
    }
}

impl CaptureOpener for FileOpener {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        Ok(Box::new(PcapSource::open_file(&self.path)?))
    }

    fn local_mac(&self) -> Option<MacAddr> {
        self.local_mac
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Hands out a fresh [`ReplaySource`] over the same frames on every open.
#[derive(Debug, Clone, Default)]
pub struct ReplayOpener {
    frames: Vec<Frame>,
    local_mac: Option<MacAddr>,
}

impl ReplayOpener {
    pub fn new(frames: Vec<Frame>, local_mac: Option<MacAddr>) -> Self {
        Self { frames, local_mac }
    }
}

impl CaptureOpener for ReplayOpener {
    fn open(&self) -> Result<Box<dyn FrameSource>, CaptureError> {
        Ok(Box::new(ReplaySource::new(self.frames.clone())))
    }

    fn local_mac(&self) -> Option<MacAddr> {
        self.local_mac
    }

    fn describe(&self) -> String {
        format!("replay of {} frames", self.frames.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureEvent;

    #[test]
    fn replay_opener_reopens_from_the_start() {
        let opener = ReplayOpener::new(vec![Frame::ethernet(vec![0u8; 60])], None);
        for _ in 0..2 {
            let mut source = opener.open().unwrap();
            assert!(matches!(source.next_frame().unwrap(), CaptureEvent::Frame(_)));
            assert!(matches!(source.next_frame().unwrap(), CaptureEvent::Closed));
        }
    }

    #[test]
    fn missing_capture_file_fails_to_open() {
        let opener = FileOpener::new("/nonexistent/mawingu-test.pcap");
        assert!(matches!(opener.open(), Err(CaptureError::Open { .. })));
    }
}
