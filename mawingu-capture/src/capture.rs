use std::path::Path;

use bytes::Bytes;
use mawingu_protocols::LinkType;
use pcap::{Activated, Active, Capture, Device, Offline};
use tracing::debug;

use crate::error::CaptureError;
use crate::packet::Frame;

/// Outcome of one read from a [`FrameSource`].
#[derive(Debug)]
pub enum CaptureEvent {
    Frame(Frame),
    /// The read timed out with nothing captured; callers should check for a
    /// stop request and read again.
    Idle,
    /// End of stream. No further frames will be produced.
    Closed,
}

/// A lazily-read stream of raw frames. Dropping the source closes it.
pub trait FrameSource: Send {
    /// Blocks until a frame arrives, the read timeout expires, or the stream
    /// ends.
    fn next_frame(&mut self) -> Result<CaptureEvent, CaptureError>;

    fn link_type(&self) -> LinkType;
}

/// Live capture parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    pub promiscuous: bool,
    pub snaplen: i32,
    /// Upper bound on how long a read blocks before yielding
    /// [`CaptureEvent::Idle`], which bounds shutdown latency.
    pub read_timeout_ms: i32,
    pub immediate_mode: bool,
    pub buffer_size: i32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            promiscuous: true,
            snaplen: 65536,
            read_timeout_ms: 500,
            immediate_mode: true,
            buffer_size: 1 << 20,
        }
    }
}

enum Handle {
    Live(Capture<Active>),
    Offline(Capture<Offline>),
}

/// A libpcap-backed frame source, either a live interface or a capture file.
pub struct PcapSource {
    handle: Handle,
    link_type: LinkType,
    name: String,
}

impl PcapSource {
    /// Opens `interface` for live capture.
    pub fn open_live(interface: &str, settings: &CaptureSettings) -> Result<Self, CaptureError> {
        let device = Device::list()
            .map_err(CaptureError::Enumerate)?
            .into_iter()
            .find(|d| d.name == interface)
            .ok_or_else(|| CaptureError::DeviceNotFound(interface.to_owned()))?;

        let open_error = |source| CaptureError::Open {
            interface: interface.to_owned(),
            source,
        };
        let cap = Capture::from_device(device)
            .map_err(open_error)?
            .promisc(settings.promiscuous)
            .snaplen(settings.snaplen)
            .timeout(settings.read_timeout_ms)
            .immediate_mode(settings.immediate_mode)
            .buffer_size(settings.buffer_size)
            .open()
            .map_err(open_error)?;

        let link_type = LinkType::from_dlt(cap.get_datalink().0);
        debug!(interface, ?link_type, "opened live capture");
        Ok(Self {
            handle: Handle::Live(cap),
            link_type,
            name: interface.to_owned(),
        })
    }

    /// Opens a pcap savefile for offline replay.
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let cap = Capture::from_file(path).map_err(|source| CaptureError::Open {
            interface: name.clone(),
            source,
        })?;

        let link_type = LinkType::from_dlt(cap.get_datalink().0);
        debug!(file = %name, ?link_type, "opened capture file");
        Ok(Self {
            handle: Handle::Offline(cap),
            link_type,
            name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn read_next<T: Activated + ?Sized>(
    cap: &mut Capture<T>,
    link_type: LinkType,
) -> Result<CaptureEvent, CaptureError> {
    match cap.next_packet() {
        Ok(packet) => Ok(CaptureEvent::Frame(Frame {
            data: Bytes::copy_from_slice(packet.data),
            link_type,
            wire_len: packet.header.len as usize,
        })),
        Err(pcap::Error::TimeoutExpired) => Ok(CaptureEvent::Idle),
        Err(pcap::Error::NoMorePackets) => Ok(CaptureEvent::Closed),
        Err(e) => Err(CaptureError::Read(e)),
    }
}

impl FrameSource for PcapSource {
    fn next_frame(&mut self) -> Result<CaptureEvent, CaptureError> {
        match &mut self.handle {
            Handle::Live(cap) => read_next(cap, self.link_type),
            Handle::Offline(cap) => read_next(cap, self.link_type),
        }
    }

    fn link_type(&self) -> LinkType {
        self.link_type
    }
}

impl Drop for PcapSource {
    fn drop(&mut self) {
        debug!(source = %self.name, "capture closed");
    }
}
