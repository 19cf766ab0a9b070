//! Binary search over the lossy-quality axis at one fixed resolution.
//!
//! Encoded size is non-decreasing in quality for a fixed resolution with
//! every codec we target, so the usual halving applies:
//!
//! ```text
//! lo = min_q, hi = max_q
//! while lo <= hi and iterations < budget:
//!     q = round((lo + hi) / 2)
//!     len > target → hi = q - 1
//!     len < target → lo = q + 1
//!     len == target → stop (diff 0)
//! ```

use tracing::trace;

use super::{Candidate, EncodeGuard, SearchState};
use crate::codec::{Codec, Size};
use crate::config::SearchConfig;
use crate::error::FitResult;
use crate::format::OutputFormat;

/// Find the quality whose encoding at `size` lands closest to `target`.
///
/// `pixels` must already be resampled (and flattened, if required) to
/// `size`. Returns `None` only when the iteration budget is zero.
pub fn search_quality<C: Codec>(
    guard: &mut EncodeGuard<'_, C>,
    pixels: &C::Pixels,
    size: Size,
    format: OutputFormat,
    target: u64,
    config: &SearchConfig,
) -> FitResult<Option<Candidate>> {
    let mut lo = config.min_quality as i32;
    let mut hi = config.max_quality as i32;
    let mut state = SearchState::new();
    let mut iterations = 0u32;

    while lo <= hi && iterations < config.max_quality_iterations {
        // Midpoint rounded half-up.
        let q = (lo + hi + 1) / 2;
        let candidate = guard.encode(pixels, size, q as u8, format, target)?;
        let len = candidate.len();
        state.offer(candidate);

        if len > target {
            hi = q - 1;
        } else if len < target {
            lo = q + 1;
        } else {
            trace!(width = size.w, quality = q, "exact match");
            break;
        }
        iterations += 1;
    }

    Ok(state.into_best())
}
