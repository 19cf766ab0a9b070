//! # sizefit
//!
//! Re-encode an image so its byte size lands as close as possible to, and
//! preferably at or under, a requested budget, while keeping its aspect
//! ratio.
//!
//! Encoded size is not a formula of resolution and quality; it has to be
//! measured by encoding. The library therefore runs a bounded search over
//! the two free parameters:
//!
//! - `search::sweep`: descending widths, 100% down to 10% of the source
//! - `search::quality`: binary search over JPEG/PNG quality at each width
//! - `search::fallback`: full resolution, stepping quality down, when the
//!   sweep produced no candidate
//!
//! ## Architecture
//!
//! - `codec`: the [`Codec`] capability and the `image`-backed [`ImageCodec`]
//! - `format`: output container / alpha-flattening policy
//! - `config`: search tuning ([`SearchConfig`])
//! - `validate`: caller-facing preconditions (mime, size limit, target)
//! - `search`: the sweep, quality search, fallback and encode guard
//! - `fit`: the orchestrator ([`Fitter`], [`fit_to_size`])
//! - `error`: domain errors ([`FitError`])
//!
//! Nothing is cached or shared between invocations, so concurrent requests
//! can run on as many threads as the caller likes.
//!
//! ## Example
//!
//! ```rust,no_run
//! use sizefit::fit_to_size;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = std::fs::read("photo.jpg")?;
//! let out = fit_to_size(&photo, "image/jpeg", 200)?;
//! assert!(out.len() <= 200 * 1024);
//! std::fs::write("photo.fit.jpg", &out.bytes)?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod fit;
pub mod format;
pub mod search;
pub mod validate;

/// Re-export error types for convenience
pub use error::{FitError, FitResult, HasRecoverySuggestion};

pub use codec::{Codec, Decoded, ImageCodec, ImageInfo, Size};
pub use config::SearchConfig;
pub use fit::{fit_to_size, FitOutcome, Fitter};
pub use format::{decide_format, FormatDecision, OutputFormat};
pub use search::{Candidate, CancelToken};
