//! # Search Configuration
//!
//! Every constant of the size search lives here, with defaults matching the
//! reference behaviour.
//!
//! | Parameter | Default | Description |
//! |-----------|---------|-------------|
//! | `scale_steps` | 20 | Intervals in the width ladder (21 widths) |
//! | `min_scale` | 0.1 | Smallest width as a fraction of the source |
//! | `min_width_px` | 10 | Absolute floor for the smallest width |
//! | `min_quality` / `max_quality` | 10 / 100 | Quality binary-search range |
//! | `max_quality_iterations` | 12 | Encode calls per width, at most |
//! | `early_exit_tolerance` | 1024 | Stop the sweep once within this many bytes (either side) and at or under budget |
//! | `fallback_start_quality` | 50 | First quality tried by the fallback |
//! | `fallback_step` | 5 | Quality decrement per fallback attempt |
//! | `fallback_floor` | 10 | Fallback stops at or below this quality |
//! | `max_input_bytes` | 10 MiB | Larger uploads are rejected |
//! | `require_fit` | false | Prefer the closest in-budget encode over a closer one that is over |
//! | `deadline` | none | Wall-clock ceiling for one invocation |
//! | `max_encode_calls` | none | Encode-call ceiling for one invocation |
//!
//! ## Examples
//!
//! ```rust
//! use sizefit::config::SearchConfig;
//!
//! let config = SearchConfig {
//!     scale_steps: 10,
//!     ..SearchConfig::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use sizefit_scale::cpu::Filter;
use sizefit_scale::plan::LadderSpec;

use crate::error::FitError;

/// Tuning parameters for one fit invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub scale_steps: u32,
    pub min_scale: f64,
    pub min_width_px: u32,

    pub min_quality: u8,
    pub max_quality: u8,
    /// Zero disables the sweep entirely, leaving only the fallback.
    pub max_quality_iterations: u32,

    pub early_exit_tolerance: u64,

    pub fallback_start_quality: u8,
    pub fallback_step: u8,
    pub fallback_floor: u8,

    pub max_input_bytes: usize,

    /// Off: the sweep's closest candidate is the result, over budget or not.
    /// On: an over-budget closest candidate is swapped for the closest
    /// in-budget encode measured during the sweep; the fallback runs only
    /// when there is none.
    pub require_fit: bool,

    pub deadline: Option<Duration>,
    pub max_encode_calls: Option<usize>,

    /// Resampling kernel used by the production codec.
    pub filter: Filter,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            scale_steps: 20,
            min_scale: 0.1,
            min_width_px: 10,
            min_quality: 10,
            max_quality: 100,
            max_quality_iterations: 12,
            early_exit_tolerance: 1024,
            fallback_start_quality: 50,
            fallback_step: 5,
            fallback_floor: 10,
            max_input_bytes: 10 * 1024 * 1024,
            require_fit: false,
            deadline: None,
            max_encode_calls: None,
            filter: Filter::default(),
        }
    }
}

impl SearchConfig {
    /// Width-ladder shape derived from this configuration.
    pub fn ladder(&self) -> LadderSpec {
        LadderSpec {
            steps: self.scale_steps,
            min_scale: self.min_scale,
            min_width_px: self.min_width_px,
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), FitError> {
        if !(self.min_scale > 0.0 && self.min_scale <= 1.0) {
            return Err(FitError::config(
                "min_scale",
                self.min_scale.to_string(),
                "must be in (0, 1]",
            ));
        }
        if self.min_width_px == 0 {
            return Err(FitError::config("min_width_px", "0", "must be at least 1"));
        }
        if self.min_quality == 0 || self.max_quality > 100 || self.min_quality > self.max_quality {
            return Err(FitError::config(
                "quality_range",
                format!("{}..={}", self.min_quality, self.max_quality),
                "must satisfy 1 <= min <= max <= 100",
            ));
        }
        if self.fallback_step == 0 {
            return Err(FitError::config("fallback_step", "0", "must be at least 1"));
        }
        if !(self.min_quality..=self.max_quality).contains(&self.fallback_start_quality) {
            return Err(FitError::config(
                "fallback_start_quality",
                self.fallback_start_quality.to_string(),
                "must lie inside the quality range",
            ));
        }
        if self.fallback_floor > self.fallback_start_quality || self.fallback_floor == 0 {
            return Err(FitError::config(
                "fallback_floor",
                self.fallback_floor.to_string(),
                "must be between 1 and the fallback start quality",
            ));
        }
        if self.max_input_bytes == 0 {
            return Err(FitError::config("max_input_bytes", "0", "must be at least 1"));
        }
        if self.max_encode_calls == Some(0) {
            return Err(FitError::config("max_encode_calls", "0", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.scale_steps, 20);
        assert_eq!(config.max_quality_iterations, 12);
        assert_eq!((config.min_quality, config.max_quality), (10, 100));
        assert_eq!(config.early_exit_tolerance, 1024);
        assert_eq!(config.fallback_start_quality, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SearchConfig::default();

        config.min_scale = 0.0;
        assert!(config.validate().is_err());
        config.min_scale = 1.5;
        assert!(config.validate().is_err());
        config.min_scale = 0.1;

        config.min_quality = 60;
        config.max_quality = 40;
        assert!(config.validate().is_err());
        config.min_quality = 10;
        config.max_quality = 100;

        config.fallback_step = 0;
        assert!(config.validate().is_err());
        config.fallback_step = 5;

        config.fallback_start_quality = 5;
        assert!(config.validate().is_err());
        config.fallback_start_quality = 50;

        config.fallback_floor = 60;
        assert!(config.validate().is_err());
        config.fallback_floor = 10;

        config.max_encode_calls = Some(0);
        assert!(config.validate().is_err());
        config.max_encode_calls = None;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ladder_mirrors_fields() {
        let config = SearchConfig {
            scale_steps: 8,
            min_scale: 0.25,
            min_width_px: 32,
            ..SearchConfig::default()
        };
        let ladder = config.ladder();
        assert_eq!(ladder.steps, 8);
        assert_eq!(ladder.min_scale, 0.25);
        assert_eq!(ladder.min_width_px, 32);
    }
}
