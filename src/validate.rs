//! Caller-facing preconditions, checked before the codec is touched.

use crate::config::SearchConfig;
use crate::error::{FitError, FitResult};
use crate::format::{is_accepted_mime, normalize_mime};

/// Bytes per kilobyte for target sizes.
pub const KB: u64 = 1024;

/// Parse a target size given in whole kilobytes.
///
/// Leading/trailing whitespace is ignored; anything that is not a positive
/// decimal integer is an [`FitError::InvalidTarget`].
pub fn parse_target_kb(text: &str) -> FitResult<u64> {
    let trimmed = text.trim();
    match trimmed.parse::<u64>() {
        Ok(kb) if kb >= 1 => Ok(kb),
        _ => Err(FitError::invalid_target(trimmed)),
    }
}

/// Convert a validated KB count to bytes.
pub fn target_bytes(kb: u64) -> FitResult<u64> {
    if kb == 0 {
        return Err(FitError::invalid_target("0"));
    }
    kb.checked_mul(KB)
        .ok_or_else(|| FitError::invalid_target(kb.to_string()))
}

/// Check the raw upload before decoding: non-empty, within the size limit,
/// and of an accepted declared type.
pub fn check_source(bytes: &[u8], mime: &str, config: &SearchConfig) -> FitResult<()> {
    if bytes.is_empty() {
        return Err(FitError::missing_input());
    }
    if !is_accepted_mime(mime) {
        return Err(FitError::unsupported(
            Some(normalize_mime(mime)),
            "only JPEG and PNG sources are accepted",
        )
        .with_operation("check_source"));
    }
    if bytes.len() > config.max_input_bytes {
        return Err(FitError::unsupported(
            Some(normalize_mime(mime)),
            format!(
                "input is {} bytes, limit is {} bytes",
                bytes.len(),
                config.max_input_bytes
            ),
        )
        .with_operation("check_source")
        .with_recovery_suggestion("Upload a smaller file"));
    }
    Ok(())
}

/// Human-readable size: `0 Bytes`, `512 Bytes`, `1.5 KB`, `2.25 MB`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= KB as f64 && unit < UNITS.len() - 1 {
        value /= KB as f64;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
