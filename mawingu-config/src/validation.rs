// mawingu-config/src/validation.rs
//! Custom validation functions for configuration.
//!
//! Provides shared validation logic used across multiple configuration modules.

use validator::ValidationError;

/// Validate an interface name: non-empty, no whitespace or control characters.
///
/// Covers Linux (`eth0.100`, `br-lan`), BSD/macOS (`en0`) and Npcap
/// (`\Device\NPF_{...}`) naming.
pub fn validate_interface(name: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new(r"^[^\s\p{Cc}]+$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;

    if name.len() <= 256 && re.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_interface"))
    }
}

/// Validate a colon or dash separated 48-bit hardware address.
pub fn validate_mac(mac: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^[0-9A-Fa-f]{2}([:-][0-9A-Fa-f]{2}){5}$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(mac) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_mac_address"))
    }
}

/// Validate log level.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}
