// mawingu-config/src/capture.rs
//! Packet capture configuration.
//!
//! Parameters handed to libpcap when the monitored interface is opened.

use serde::{Deserialize, Deserializer, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Packet capture configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Network interface to monitor. The command line argument wins.
    #[validate(custom(function = validation::validate_interface))]
    #[serde(default)]
    pub interface: Option<String>,

    /// Run in promiscuous mode?
    #[serde(default = "default_promiscuous")]
    pub promiscuous: bool,

    /// Maximum bytes captured per frame.
    #[validate(range(min = 64, max = 262144))]
    #[serde(default = "default_snaplen")]
    pub snaplen: u32,

    /// Kernel capture buffer size in bytes.
    #[validate(range(min = 4096, max = 1073741824))]
    #[serde(default = "default_buffer_size", deserialize_with = "deserialize_size")]
    pub buffer_size: usize,

    /// How long a read may block before the capture loop re-checks for
    /// shutdown (milliseconds).
    #[validate(range(min = 1, max = 5000))]
    #[serde(default = "default_read_timeout")]
    pub read_timeout_ms: u32,

    /// Deliver frames as soon as they arrive instead of batching.
    #[serde(default = "default_immediate_mode")]
    pub immediate_mode: bool,
}

fn default_promiscuous() -> bool {
    true
}

fn default_snaplen() -> u32 {
    65536
}

fn default_buffer_size() -> usize {
    1048576
}

fn default_read_timeout() -> u32 {
    500
}

fn default_immediate_mode() -> bool {
    true
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SizeValue {
    Num(usize),
    Str(String),
}

/// Custom deserializer to allow human‑friendly sizes (e.g. "1MiB") or direct numbers.
fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let sv = SizeValue::deserialize(deserializer)?;
    match sv {
        SizeValue::Num(n) => Ok(n),
        SizeValue::Str(s) => parse_size(&s).map_err(serde::de::Error::custom),
    }
}

fn parse_size(s: &str) -> Result<usize, String> {
    let s = s.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (num_part, unit_part) = s.split_at(split);
    let number: f64 = num_part
        .parse()
        .map_err(|e| format!("invalid size '{}': {}", s, e))?;
    let multiplier = match unit_part.trim().to_lowercase().as_str() {
        "kb" | "kib" => 1024.0,
        "mb" | "mib" => 1024.0 * 1024.0,
        "gb" | "gib" => 1024.0 * 1024.0 * 1024.0,
        "" | "b" => 1.0,
        other => return Err(format!("unknown size unit '{}'", other)),
    };
    Ok((number * multiplier) as usize)
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: None,
            promiscuous: default_promiscuous(),
            snaplen: default_snaplen(),
            buffer_size: default_buffer_size(),
            read_timeout_ms: default_read_timeout(),
            immediate_mode: default_immediate_mode(),
        }
    }
}
