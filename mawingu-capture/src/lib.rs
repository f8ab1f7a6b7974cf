//! mawingu‑capture
//!
//! The capture source collaborator. A [`FrameSource`] yields raw link-layer
//! frames one at a time; a [`CaptureOpener`] knows how to produce one and what
//! the monitor's own hardware address is.
//!
//! Live and offline capture go through libpcap; [`ReplaySource`] serves frames
//! from memory.

pub mod capture;
pub mod error;
pub mod interfaces;
pub mod opener;
pub mod packet;
pub mod replay;

pub use capture::{CaptureEvent, CaptureSettings, FrameSource, PcapSource};
pub use error::CaptureError;
pub use interfaces::{list_interfaces, local_hardware_address, InterfaceInfo};
pub use opener::{CaptureOpener, FileOpener, LiveOpener, ReplayOpener};
pub use packet::Frame;
pub use replay::ReplaySource;
