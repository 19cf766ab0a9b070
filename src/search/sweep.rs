//! Outer loop: descending widths, quality search at each.

use sizefit_scale::plan::width_ladder;
use tracing::debug;

use super::{quality::search_quality, Candidate, EncodeGuard, SearchState};
use crate::codec::{Codec, Decoded};
use crate::config::SearchConfig;
use crate::error::FitResult;
use crate::format::FormatDecision;

/// Sweep the width ladder and return the candidate closest to `target`.
///
/// Stops early once the best candidate is within
/// `config.early_exit_tolerance` bytes *and* at or under the target; smaller
/// widths would only lose detail for no size benefit. Returns `None` when
/// no width produced a candidate (zero quality-iteration budget).
pub fn sweep_scales<C: Codec>(
    guard: &mut EncodeGuard<'_, C>,
    decoded: &Decoded<C::Pixels>,
    decision: FormatDecision,
    target: u64,
    config: &SearchConfig,
) -> FitResult<Option<Candidate>> {
    if config.max_quality_iterations == 0 {
        return Ok(None);
    }

    let mut state = SearchState::new();
    for plan in width_ladder(decoded.info.size(), &config.ladder()) {
        let pixels = guard.resample(&decoded.pixels, plan.out, decision.background())?;
        let Some(at_scale) =
            search_quality(guard, &pixels, plan.out, decision.format, target, config)?
        else {
            continue;
        };

        debug!(
            step = plan.step,
            width = plan.out.w,
            height = plan.out.h,
            quality = at_scale.quality,
            diff = at_scale.diff,
            "best at scale"
        );
        state.offer(at_scale);

        if let Some(best) = state.best() {
            if best.diff <= config.early_exit_tolerance && best.fits(target) {
                debug!(step = plan.step, diff = best.diff, "close enough under budget, stopping sweep");
                break;
            }
        }
    }

    Ok(state.into_best())
}
