//! Safe points between encode calls: cancellation, deadline, call ceiling.
//!
//! The guard also sees every measured candidate, so it keeps the closest
//! in-budget one when the configuration asks for a guaranteed fit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::Candidate;
use crate::codec::{Codec, Size};
use crate::config::SearchConfig;
use crate::error::{FitError, FitResult};
use crate::format::OutputFormat;

/// Shared flag a caller flips to abandon an in-flight search.
///
/// Checked before every resample and encode; the search stops at the next
/// safe point with [`FitError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One recorded encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub size: Size,
    pub quality: u8,
    pub len: u64,
}

/// Wraps a codec for the duration of one invocation.
pub struct EncodeGuard<'a, C: Codec> {
    codec: &'a C,
    cancel: Option<CancelToken>,
    started: Instant,
    deadline: Option<Duration>,
    max_calls: Option<usize>,
    trace: Vec<Attempt>,
    keep_fitting: bool,
    best_fit: Option<Candidate>,
}

impl<'a, C: Codec> EncodeGuard<'a, C> {
    pub fn new(codec: &'a C, config: &SearchConfig, cancel: Option<CancelToken>) -> Self {
        Self {
            codec,
            cancel,
            started: Instant::now(),
            deadline: config.deadline,
            max_calls: config.max_encode_calls,
            trace: Vec::new(),
            keep_fitting: config.require_fit,
            best_fit: None,
        }
    }

    /// Encode calls made so far.
    pub fn encode_calls(&self) -> usize {
        self.trace.len()
    }

    /// Every encode call in order.
    pub fn trace(&self) -> &[Attempt] {
        &self.trace
    }

    /// Closest at-or-under-target candidate encoded so far. Only tracked
    /// with `require_fit`; ties keep the earlier candidate.
    pub fn take_best_fit(&mut self) -> Option<Candidate> {
        self.best_fit.take()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn checkpoint(&self) -> FitResult<()> {
        let calls = self.encode_calls();
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(FitError::cancelled(calls));
        }
        if let Some(limit) = self.deadline {
            if self.started.elapsed() >= limit {
                return Err(FitError::timeout(format!("deadline of {:?}", limit), calls));
            }
        }
        if let Some(max) = self.max_calls {
            if calls >= max {
                return Err(FitError::timeout(format!("ceiling of {} encode calls", max), calls));
            }
        }
        Ok(())
    }

    /// Resample the source to `size`, flattening when `background` is set.
    pub fn resample(&self, pixels: &C::Pixels, size: Size, background: Option<[u8; 3]>) -> FitResult<C::Pixels> {
        self.checkpoint()?;
        self.codec.resample(pixels, size, background)
    }

    /// Encode once and measure the result against `target`.
    pub fn encode(
        &mut self,
        pixels: &C::Pixels,
        size: Size,
        quality: u8,
        format: OutputFormat,
        target: u64,
    ) -> FitResult<Candidate> {
        self.checkpoint()?;
        let bytes = self.codec.encode(pixels, quality, format)?;
        let candidate = Candidate::new(size, quality, format, bytes, target);
        debug!(
            width = size.w,
            height = size.h,
            quality,
            len = candidate.len(),
            diff = candidate.diff,
            "encode attempt"
        );
        self.trace.push(Attempt {
            size,
            quality,
            len: candidate.len(),
        });
        if self.keep_fitting
            && candidate.fits(target)
            && self.best_fit.as_ref().is_none_or(|best| candidate.diff < best.diff)
        {
            self.best_fit = Some(candidate.clone());
        }
        Ok(candidate)
    }
}
