//! # Mawingu Protocol Classification
//!
//! Crate for turning raw link-layer frames into the handful of fields the
//! monitor attributes traffic by: hardware addresses, network addresses and
//! the transport protocol with its ports.

pub mod classify;
pub mod link;
pub mod mac;

pub use classify::{classify, Classification, DecodeIssue, Transport};
pub use link::LinkType;
pub use mac::{MacAddr, ParseMacError};

/// Well-known HTTP port.
pub const HTTP_PORT: u16 = 80;
/// Well-known HTTPS port.
pub const HTTPS_PORT: u16 = 443;
/// Well-known DNS port.
pub const DNS_PORT: u16 = 53;
