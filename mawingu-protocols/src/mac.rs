//! ## mawingu-protocols::mac
//! Link-layer hardware addresses.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced when parsing a textual hardware address.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseMacError {
    #[error("expected 6 octets, found {0}")]
    OctetCount(usize),
    #[error("invalid octet '{0}'")]
    InvalidOctet(String),
}

/// A 48-bit IEEE 802 hardware address.
///
/// Renders as lowercase colon-separated hex (`aa:bb:cc:dd:ee:ff`), which is
/// also the key under which devices are tracked.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Low-order bit of the first octet set: multicast or broadcast.
    #[inline]
    pub const fn is_group(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    #[inline]
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddr({self})")
    }
}

impl FromStr for MacAddr {
    type Err = ParseMacError;

    /// Accepts `:` or `-` separated hex octets, in either case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(ParseMacError::OctetCount(parts.len()));
        }
        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(&parts) {
            if part.is_empty() || part.len() > 2 {
                return Err(ParseMacError::InvalidOctet((*part).to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| ParseMacError::InvalidOctet((*part).to_string()))?;
        }
        Ok(Self(octets))
    }
}
