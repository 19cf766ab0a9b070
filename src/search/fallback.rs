//! Last resort when the sweep has nothing usable: full resolution, quality
//! stepping down from `fallback_start_quality` until the budget is met.

use tracing::warn;

use super::{Candidate, EncodeGuard};
use crate::codec::{Codec, Decoded};
use crate::config::SearchConfig;
use crate::error::{FitError, FitResult};
use crate::format::FormatDecision;

/// Lower quality at full resolution until the encoding fits `target`.
///
/// Quality never leaves `[fallback_floor, fallback_start_quality]`; with the
/// defaults that is at most 9 encode calls (50, 45, …, 10). Still too large
/// at the floor is [`FitError::TargetTooSmall`].
pub fn fallback<C: Codec>(
    guard: &mut EncodeGuard<'_, C>,
    decoded: &Decoded<C::Pixels>,
    decision: FormatDecision,
    target: u64,
    config: &SearchConfig,
) -> FitResult<Candidate> {
    let size = decoded.info.size();
    warn!(width = size.w, height = size.h, target, "running fallback compression");

    let pixels = guard.resample(&decoded.pixels, size, decision.background())?;
    let mut quality = config.fallback_start_quality;
    let mut candidate = guard.encode(&pixels, size, quality, decision.format, target)?;

    while !candidate.fits(target) && quality > config.fallback_floor {
        quality = quality
            .saturating_sub(config.fallback_step)
            .max(config.fallback_floor);
        candidate = guard.encode(&pixels, size, quality, decision.format, target)?;
    }

    if !candidate.fits(target) {
        return Err(FitError::target_too_small(target, candidate.len())
            .with_metadata("width", size.w.to_string())
            .with_metadata("quality", quality.to_string()));
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::FakeCodec;
    use crate::format::decide_format;

    fn run(codec: &FakeCodec, target: u64) -> FitResult<Candidate> {
        let config = SearchConfig::default();
        let decoded = codec.decode(b"ok").unwrap();
        let decision = decide_format("image/png", codec.info.has_alpha);
        let mut guard = EncodeGuard::new(codec, &config, None);
        fallback(&mut guard, &decoded, decision, target, &config)
    }

    #[test]
    fn first_attempt_fits() {
        let codec = FakeCodec::new(100, 100, false);
        let c = run(&codec, 1_000_000).unwrap();
        assert_eq!(c.quality, 50);
        assert_eq!(codec.encodes.borrow().len(), 1);
    }

    #[test]
    fn steps_down_by_five() {
        // len = 100 + 100 * q; 3_100 fits at q = 30
        let codec = FakeCodec::new(100, 100, false);
        let c = run(&codec, 3_100).unwrap();
        assert_eq!(c.quality, 30);
        let qualities: Vec<u8> = codec.encodes.borrow().iter().map(|(_, q)| *q).collect();
        assert_eq!(qualities, vec![50, 45, 40, 35, 30]);
    }

    #[test]
    fn infeasible_after_nine_attempts() {
        let codec = FakeCodec::new(100, 100, false);
        let err = run(&codec, 500).unwrap_err();
        assert_eq!(err.category(), "target_too_small");
        let encodes = codec.encodes.borrow();
        assert_eq!(encodes.len(), 9);
        assert!(encodes.iter().all(|(_, q)| (10..=50).contains(q)));
        assert!(encodes.iter().all(|(s, _)| s.w == 100 && s.h == 100));
    }
}
