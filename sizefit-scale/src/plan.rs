// SPDX-License-Identifier: MIT
//! # Width Ladder and Plan Computation
//!
//! Computes the sequence of output resolutions the scale sweep walks through.
//!
//! The ladder is linear in width: step `0` is the original width, step
//! `steps` is `min_scale` of it, and every step in between is evenly spaced.
//! Heights are always derived from the chosen width so the source aspect ratio
//! survives every step:
//!
//! ```text
//! width(i)  = max(min_width, round(W * (1 - (i / steps) * (1 - min_scale))))
//! height(w) = round(H * w / W)
//! ```
//!
//! ## Floors
//!
//! - `min_width = max(min_width_px, round(W * min_scale))`; sources narrower
//!   than `min_width_px` are lifted to it
//! - heights are clamped to at least 1px so extreme panoramas stay encodable

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Number of pixels covered by this size.
    pub fn area(self) -> u64 {
        self.w as u64 * self.h as u64
    }
}

/// Shape of the width ladder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LadderSpec {
    /// Number of intervals between full width and the smallest width.
    /// The ladder has `steps + 1` rungs before de-duplication.
    pub steps: u32,
    /// Smallest width as a fraction of the source width, in `(0, 1]`.
    pub min_scale: f64,
    /// Absolute floor for the smallest width.
    pub min_width_px: u32,
}

impl Default for LadderSpec {
    fn default() -> Self {
        Self {
            steps: 20,
            min_scale: 0.1,
            min_width_px: 10,
        }
    }
}

/// One rung of the ladder: the step index it came from and the output size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScalePlan {
    /// Ladder index `i` in `0..=steps`.
    pub step: u32,
    /// Original source dimensions.
    pub input: Size,
    /// Output dimensions for this rung.
    pub out: Size,
}

/// Smallest width the ladder may reach for a source of `width` pixels.
pub fn min_width(width: u32, spec: &LadderSpec) -> u32 {
    let scaled = (width as f64 * spec.min_scale).round() as u32;
    spec.min_width_px.max(scaled).max(1)
}

/// Width at ladder index `step`, floored at [`min_width`].
pub fn width_at(width: u32, step: u32, spec: &LadderSpec) -> u32 {
    let floor = min_width(width, spec);
    if spec.steps == 0 {
        return width.max(floor);
    }
    let fraction = step as f64 / spec.steps as f64;
    let raw = (width as f64 * (1.0 - fraction * (1.0 - spec.min_scale))).round() as u32;
    raw.max(floor)
}

/// Height matching `width` under the source aspect ratio.
pub fn height_for_width(input: Size, width: u32) -> u32 {
    if input.w == 0 {
        return 1;
    }
    let h = (input.h as f64 * (width as f64 / input.w as f64)).round() as u32;
    h.max(1)
}

/// Plan for a single explicit width.
pub fn plan_for_width(input: Size, step: u32, width: u32) -> ScalePlan {
    ScalePlan {
        step,
        input,
        out: Size {
            w: width,
            h: height_for_width(input, width),
        },
    }
}

/// Build the full descending ladder for `input`.
///
/// Consecutive rungs that collapse onto the same output size (small sources,
/// or the floor kicking in) are emitted once; a deterministic encoder would
/// produce byte-identical candidates for them anyway.
pub fn width_ladder(input: Size, spec: &LadderSpec) -> Vec<ScalePlan> {
    let mut ladder: Vec<ScalePlan> = Vec::with_capacity(spec.steps as usize + 1);
    for step in 0..=spec.steps {
        let plan = plan_for_width(input, step, width_at(input.w, step, spec));
        if ladder.last().map(|prev| prev.out) == Some(plan.out) {
            continue;
        }
        ladder.push(plan);
    }
    ladder
}
