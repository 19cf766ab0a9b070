//! # Search Orchestrator
//!
//! `fit(bytes, mime, target)` composes the pieces:
//!
//! 1. validate the configuration and the upload (cheap, no codec work)
//! 2. decode once
//! 3. resolve the format policy once for the whole invocation
//! 4. run the scale sweep; its closest candidate is the result
//! 5. only when the sweep produced nothing, run the fallback compressor,
//!    whose result or error is final
//! 6. report the container actually present in the produced bytes
//!
//! With [`SearchConfig::require_fit`] an over-budget closest candidate is
//! replaced by the closest in-budget encode the sweep measured, at whatever
//! width that was.
//!
//! A [`Fitter`] holds no state between calls; it can be shared freely and
//! every call is independent.

use tracing::{debug, info, info_span};

use crate::codec::{Codec, ImageCodec};
use crate::config::SearchConfig;
use crate::error::{FitError, FitResult};
use crate::format::{decide_format, sniff_format, FormatDecision, OutputFormat};
use crate::search::{fallback, sweep_scales, CancelToken, EncodeGuard};
use crate::validate::{check_source, parse_target_kb, target_bytes};

/// Successful fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitOutcome {
    pub bytes: Vec<u8>,
    /// Container found in `bytes`, which may differ from the requested one.
    pub format: OutputFormat,
    /// What the format policy asked for.
    pub decision: FormatDecision,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
    pub target_bytes: u64,
    pub encode_calls: usize,
    pub via_fallback: bool,
}

impl FitOutcome {
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Size-fitting entry point, generic over the codec.
#[derive(Debug, Clone)]
pub struct Fitter<C: Codec> {
    codec: C,
    config: SearchConfig,
    cancel: Option<CancelToken>,
}

impl Fitter<ImageCodec> {
    /// Production fitter using the `image` codec.
    pub fn with_config(config: SearchConfig) -> Self {
        let codec = ImageCodec::new(config.filter);
        Self::new(codec, config)
    }
}

impl Default for Fitter<ImageCodec> {
    fn default() -> Self {
        Self::with_config(SearchConfig::default())
    }
}

impl<C: Codec> Fitter<C> {
    pub fn new(codec: C, config: SearchConfig) -> Self {
        Self {
            codec,
            config,
            cancel: None,
        }
    }

    /// Abandon searches when `token` is cancelled.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Fit with the target given as caller text in kilobytes.
    pub fn fit_kb_str(&self, bytes: &[u8], mime: &str, target_kb: &str) -> FitResult<FitOutcome> {
        let kb = parse_target_kb(target_kb)?;
        self.fit(bytes, mime, target_bytes(kb)?)
    }

    /// Fit `bytes` (declared as `mime`) into `target` bytes.
    pub fn fit(&self, bytes: &[u8], mime: &str, target: u64) -> FitResult<FitOutcome> {
        self.config.validate()?;
        check_source(bytes, mime, &self.config)?;
        if target == 0 {
            return Err(FitError::invalid_target("0 bytes"));
        }

        let span = info_span!("fit", target, input_len = bytes.len());
        let _enter = span.enter();

        let decoded = self.codec.decode(bytes)?;
        let decision = decide_format(mime, decoded.info.has_alpha);
        info!(
            width = decoded.info.width,
            height = decoded.info.height,
            has_alpha = decoded.info.has_alpha,
            format = %decision.format,
            flatten = decision.flatten,
            "decoded source"
        );

        let mut guard = EncodeGuard::new(&self.codec, &self.config, self.cancel.clone());
        let swept = match sweep_scales(&mut guard, &decoded, decision, target, &self.config)? {
            Some(closest) if self.config.require_fit && !closest.fits(target) => {
                debug!(len = closest.len(), target, "closest candidate is over budget");
                guard.take_best_fit()
            }
            other => other,
        };

        let (candidate, via_fallback) = match swept {
            Some(candidate) => (candidate, false),
            None => (fallback(&mut guard, &decoded, decision, target, &self.config)?, true),
        };

        let format = sniff_format(&candidate.bytes).unwrap_or(candidate.format);
        info!(
            width = candidate.size.w,
            height = candidate.size.h,
            quality = candidate.quality,
            len = candidate.len(),
            diff = candidate.diff,
            encode_calls = guard.encode_calls(),
            elapsed_ms = guard.elapsed().as_millis() as u64,
            via_fallback,
            "fit complete"
        );

        Ok(FitOutcome {
            width: candidate.size.w,
            height: candidate.size.h,
            quality: candidate.quality,
            bytes: candidate.bytes,
            format,
            decision,
            target_bytes: target,
            encode_calls: guard.encode_calls(),
            via_fallback,
        })
    }
}

/// One-shot fit with the default configuration and the `image` codec.
///
/// `target_kb` must be at least 1; the budget is `target_kb * 1024` bytes.
pub fn fit_to_size(bytes: &[u8], mime: &str, target_kb: u64) -> FitResult<FitOutcome> {
    Fitter::default().fit(bytes, mime, target_bytes(target_kb)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::FakeCodec;
    use crate::codec::Size;

    fn fitter(w: u32, h: u32, alpha: bool) -> Fitter<FakeCodec> {
        Fitter::new(FakeCodec::new(w, h, alpha), SearchConfig::default())
    }

    #[test]
    fn sweep_result_is_returned() {
        let f = fitter(1000, 1000, false);
        let out = f.fit(b"jpeg", "image/jpeg", 550_100).unwrap();
        assert!(!out.via_fallback);
        assert_eq!(out.len(), 550_100);
        assert_eq!(out.format, OutputFormat::Jpeg);
        assert_eq!(out.mime(), "image/jpeg");
    }

    #[test]
    fn png_without_alpha_reports_png() {
        let f = fitter(200, 200, false);
        let out = f.fit(b"png", "image/png", 20_000).unwrap();
        assert_eq!(out.format, OutputFormat::Png);
        assert!(!out.decision.flatten);
    }

    #[test]
    fn validation_happens_before_decoding() {
        let f = fitter(100, 100, false);
        assert_eq!(f.fit(&[], "image/png", 10).unwrap_err().category(), "missing_input");
        assert_eq!(f.fit(&[], "image/png", 0).unwrap_err().category(), "missing_input");
        assert_eq!(f.fit(b"x", "image/png", 0).unwrap_err().category(), "invalid_target");
        assert_eq!(
            f.fit_kb_str(b"x", "image/png", "zero").unwrap_err().category(),
            "invalid_target"
        );
        assert!(f.codec().encodes.borrow().is_empty());
    }

    #[test]
    fn corrupt_input_is_reported() {
        let f = fitter(100, 100, false);
        let err = f.fit(b"corrupt!", "image/jpeg", 1024).unwrap_err();
        assert_eq!(err.category(), "unsupported_or_corrupt_image");
    }

    #[test]
    fn closest_candidate_is_returned_even_when_over_budget() {
        // 145x145 at q11 is 2412 bytes, 5 over; 100x100 at q23 is 2400, 7 under.
        let f = fitter(1000, 1000, false);
        let out = f.fit(b"jpeg", "image/jpeg", 2407).unwrap();
        assert_eq!(out.len(), 2412);
        assert_eq!((out.width, out.height, out.quality), (145, 145, 11));
        assert!(!out.via_fallback);
    }

    #[test]
    fn require_fit_swaps_in_the_closest_in_budget_encode() {
        let config = SearchConfig {
            require_fit: true,
            ..SearchConfig::default()
        };
        let f = Fitter::new(FakeCodec::new(1000, 1000, false), config);
        let out = f.fit(b"jpeg", "image/jpeg", 2407).unwrap();
        assert_eq!(out.len(), 2400);
        assert_eq!((out.width, out.height, out.quality), (100, 100, 23));
        assert!(!out.via_fallback);
    }

    #[test]
    fn require_fit_with_nothing_in_budget_runs_fallback_then_fails() {
        // Smallest possible encode is the 100-byte base plus area term.
        let config = SearchConfig {
            require_fit: true,
            ..SearchConfig::default()
        };
        let f = Fitter::new(FakeCodec::new(1000, 1000, false), config);
        let err = f.fit(b"jpeg", "image/jpeg", 50).unwrap_err();
        assert_eq!(err.category(), "target_too_small");
        assert_eq!(f.codec().encodes.borrow().last(), Some(&(Size { w: 1000, h: 1000 }, 10)));
    }

    #[test]
    fn infeasible_target_without_sweep_is_too_small() {
        let config = SearchConfig {
            max_quality_iterations: 0,
            ..SearchConfig::default()
        };
        let f = Fitter::new(FakeCodec::new(1000, 1000, false), config);
        let err = f.fit(b"jpeg", "image/jpeg", 1024).unwrap_err();
        assert_eq!(err.category(), "target_too_small");
        assert_eq!(f.codec().encodes.borrow().len(), 9);
    }

    #[test]
    fn zero_iterations_goes_straight_to_fallback() {
        let config = SearchConfig {
            max_quality_iterations: 0,
            ..SearchConfig::default()
        };
        let f = Fitter::new(FakeCodec::new(100, 100, false), config);
        let out = f.fit(b"jpeg", "image/jpeg", 1_000_000).unwrap();
        assert!(out.via_fallback);
        assert_eq!(out.quality, 50);
        assert_eq!(out.encode_calls, 1);
    }

    #[test]
    fn cancelled_search_reports_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let f = fitter(100, 100, false).with_cancel_token(token);
        assert_eq!(f.fit(b"jpeg", "image/jpeg", 4096).unwrap_err().category(), "cancelled");
    }
}
