//! # Error Handling
//!
//! Domain errors for the size-fitting engine.
//!
//! ## Error Classes
//!
//! Errors fall into three classes, and callers are expected to treat them
//! differently:
//!
//! - **Input errors** (`MissingInput`, `InvalidTarget`, `UnsupportedOrCorruptImage`,
//!   `Config`): rejected before or at decode time, no encode work is done
//! - **Codec errors** (`EncodingFailed`, `Io`): terminal for the invocation,
//!   never retried with other parameters
//! - **Infeasibility** (`TargetTooSmall`): a legitimate outcome, the requested
//!   budget is below anything attainable at the minimum quality/resolution
//!
//! `Cancelled` and `Timeout` come from the search guard and mean the caller
//! stopped waiting.
//!
//! ## Usage
//!
//! ```rust
//! use sizefit::error::{classify, FitError, HasRecoverySuggestion};
//!
//! let error = FitError::target_too_small(1024, 5_310)
//!     .with_context("4000x3000 photo");
//!
//! assert!(classify::is_infeasible(&error));
//! assert!(error.recovery_suggestion().is_some());
//! ```

use std::{collections::HashMap, error::Error as StdError, fmt};

/// Metadata attached to every [`FitError`].
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Suggested recovery action
    pub recovery_suggestion: Option<String>,
    /// Additional metadata as key-value pairs
    pub metadata: HashMap<String, String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operation that was being performed
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Add additional context
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Errors produced by a fit invocation.
#[derive(Debug)]
pub enum FitError {
    /// No image bytes were supplied
    MissingInput { context: ErrorContext },
    /// Target size is not a positive whole number of kilobytes
    InvalidTarget { value: String, context: ErrorContext },
    /// Source could not be decoded, or its declared type is not accepted
    UnsupportedOrCorruptImage {
        mime: Option<String>,
        reason: String,
        context: ErrorContext,
    },
    /// No encoding within the budget exists at the minimum quality/resolution
    TargetTooSmall {
        target_bytes: u64,
        smallest_bytes: Option<u64>,
        context: ErrorContext,
    },
    /// The encoder rejected the request or failed mid-way
    EncodingFailed {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Search parameters are inconsistent
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// The caller cancelled the search between encode calls
    Cancelled { encode_calls: usize, context: ErrorContext },
    /// The search hit its deadline or encode-call ceiling
    Timeout {
        limit: String,
        encode_calls: usize,
        context: ErrorContext,
    },
    /// Reading input or writing output failed
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
}

impl FitError {
    /// Create a missing-input error
    pub fn missing_input() -> Self {
        Self::MissingInput {
            context: ErrorContext::new().with_recovery_suggestion("Provide an image file"),
        }
    }

    /// Create an invalid-target error
    pub fn invalid_target(value: impl Into<String>) -> Self {
        Self::InvalidTarget {
            value: value.into(),
            context: ErrorContext::new()
                .with_recovery_suggestion("Give the target as a whole number of kilobytes, at least 1"),
        }
    }

    /// Create an unsupported/corrupt image error
    pub fn unsupported(mime: Option<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedOrCorruptImage {
            mime,
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a target-too-small error
    pub fn target_too_small(target_bytes: u64, smallest_bytes: u64) -> Self {
        Self::TargetTooSmall {
            target_bytes,
            smallest_bytes: Some(smallest_bytes),
            context: ErrorContext::new().with_recovery_suggestion("Choose a larger target size"),
        }
    }

    /// Create an encoding error
    pub fn encoding(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EncodingFailed {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(encode_calls: usize) -> Self {
        Self::Cancelled {
            encode_calls,
            context: ErrorContext::new(),
        }
    }

    /// Create a timeout error
    pub fn timeout(limit: impl Into<String>, encode_calls: usize) -> Self {
        Self::Timeout {
            limit: limit.into(),
            encode_calls,
            context: ErrorContext::new()
                .with_recovery_suggestion("Raise the deadline or the encode-call ceiling"),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: Option<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Add context to this error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Set the operation that was being performed
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Set recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::MissingInput { context }
            | Self::InvalidTarget { context, .. }
            | Self::UnsupportedOrCorruptImage { context, .. }
            | Self::TargetTooSmall { context, .. }
            | Self::EncodingFailed { context, .. }
            | Self::Config { context, .. }
            | Self::Cancelled { context, .. }
            | Self::Timeout { context, .. }
            | Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::MissingInput { context }
            | Self::InvalidTarget { context, .. }
            | Self::UnsupportedOrCorruptImage { context, .. }
            | Self::TargetTooSmall { context, .. }
            | Self::EncodingFailed { context, .. }
            | Self::Config { context, .. }
            | Self::Cancelled { context, .. }
            | Self::Timeout { context, .. }
            | Self::Io { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingInput { .. } => "missing_input",
            Self::InvalidTarget { .. } => "invalid_target",
            Self::UnsupportedOrCorruptImage { .. } => "unsupported_or_corrupt_image",
            Self::TargetTooSmall { .. } => "target_too_small",
            Self::EncodingFailed { .. } => "encoding_failed",
            Self::Config { .. } => "config",
            Self::Cancelled { .. } => "cancelled",
            Self::Timeout { .. } => "timeout",
            Self::Io { .. } => "io",
        }
    }
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::MissingInput { .. } => write!(f, "No image file supplied"),
            FitError::InvalidTarget { value, .. } => {
                write!(f, "Invalid target size '{}': expected a whole number of KB >= 1", value)
            }
            FitError::UnsupportedOrCorruptImage { mime, reason, .. } => match mime {
                Some(mime) => write!(f, "Unsupported or corrupt image ({}): {}", mime, reason),
                None => write!(f, "Unsupported or corrupt image: {}", reason),
            },
            FitError::TargetTooSmall {
                target_bytes,
                smallest_bytes,
                ..
            } => match smallest_bytes {
                Some(smallest) => write!(
                    f,
                    "Target size too small for this image: {} bytes requested, smallest attempt was {} bytes",
                    target_bytes, smallest
                ),
                None => write!(f, "Target size too small for this image: {} bytes requested", target_bytes),
            },
            FitError::EncodingFailed {
                operation, reason, ..
            } => {
                write!(f, "Encoding failed during {}: {}", operation, reason)
            }
            FitError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            FitError::Cancelled { encode_calls, .. } => {
                write!(f, "Search cancelled after {} encode calls", encode_calls)
            }
            FitError::Timeout {
                limit,
                encode_calls,
                ..
            } => {
                write!(f, "Search exceeded {} after {} encode calls", limit, encode_calls)
            }
            FitError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(f, "I/O error during {} on '{}': {}", operation, path, source)
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
        }
    }
}

impl StdError for FitError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type FitResult<T> = Result<T, FitError>;

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for FitError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Rejected before any encode work was attempted
    pub fn is_input_error(error: &FitError) -> bool {
        matches!(
            error,
            FitError::MissingInput { .. }
                | FitError::InvalidTarget { .. }
                | FitError::UnsupportedOrCorruptImage { .. }
                | FitError::Config { .. }
        )
    }

    /// The budget cannot be met; the caller should pick a larger one
    pub fn is_infeasible(error: &FitError) -> bool {
        matches!(error, FitError::TargetTooSmall { .. })
    }

    /// The codec or the filesystem failed
    pub fn is_codec_error(error: &FitError) -> bool {
        matches!(error, FitError::EncodingFailed { .. } | FitError::Io { .. })
    }

    /// The caller's fault rather than the service's
    pub fn is_client_error(error: &FitError) -> bool {
        is_input_error(error) || is_infeasible(error)
    }
}
