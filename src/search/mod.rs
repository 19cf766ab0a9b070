//! # Size Search Engine
//!
//! Two nested, strictly sequential state machines over the encoder:
//!
//! 1. **Scale sweep** ([`sweep`]): walks the width ladder from 100% down to the
//!    minimum scale, keeping the closest candidate seen so far
//! 2. **Quality search** ([`quality`]): at one fixed resolution, binary-searches
//!    the integer quality that lands closest to the target
//!
//! If the sweep has nothing usable the [`fallback`] compressor lowers quality
//! at full resolution until the budget is met or quality floors out.
//!
//! Every encode call goes through one [`EncodeGuard`], the single place where
//! a search can be cancelled, time out, or hit its encode-call ceiling.
//!
//! ## Tie-break
//!
//! A candidate replaces the running best only with a *strictly* smaller
//! diff. Equal diffs keep the earlier candidate, which, given the sweep order,
//! is the one at the larger resolution.

pub mod fallback;
pub mod guard;
pub mod quality;
pub mod sweep;

pub use fallback::fallback;
pub use guard::{Attempt, CancelToken, EncodeGuard};
pub use quality::search_quality;
pub use sweep::sweep_scales;

use crate::codec::Size;
use crate::format::OutputFormat;

/// One encode attempt and its measured outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub size: Size,
    pub quality: u8,
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
    /// `|bytes.len() - target|`
    pub diff: u64,
}

impl Candidate {
    pub fn new(size: Size, quality: u8, format: OutputFormat, bytes: Vec<u8>, target: u64) -> Self {
        let diff = (bytes.len() as u64).abs_diff(target);
        Self {
            size,
            quality,
            format,
            bytes,
            diff,
        }
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// At or under `target`.
    pub fn fits(&self, target: u64) -> bool {
        self.len() <= target
    }
}

/// Running minimum-diff accumulator. `None` stands for "infinitely far".
#[derive(Debug, Default)]
pub struct SearchState {
    best: Option<Candidate>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `candidate` if its diff is strictly smaller than the current best.
    /// Returns whether it was kept.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        let better = match &self.best {
            Some(best) => candidate.diff < best.diff,
            None => true,
        };
        if better {
            self.best = Some(candidate);
        }
        better
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    pub fn best_diff(&self) -> Option<u64> {
        self.best.as_ref().map(|c| c.diff)
    }

    pub fn into_best(self) -> Option<Candidate> {
        self.best
    }
}
