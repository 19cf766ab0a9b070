// SPDX-License-Identifier: MIT
//! # sizefit-scale: Resolution Planning for Byte-Budget Fitting
//!
//! This crate holds the pixel-side half of the size search: deciding which
//! resolutions to try, and producing the resampled RGBA buffers the encoder
//! measures.
//!
//! ## Key Components
//!
//! - [`plan`]: the descending width ladder (100% down to a minimum scale) and
//!   aspect-preserving height derivation
//! - [`cpu`]: RGBA8 resampling built on `fast_image_resize`
//! - [`flatten`]: compositing transparent pixels onto an opaque background
//!   before handing them to an encoder without alpha support
//!
//! ## Usage Example
//!
//! ```rust
//! use sizefit_scale::plan::{width_ladder, LadderSpec, Size};
//!
//! let ladder = width_ladder(Size { w: 4000, h: 3000 }, &LadderSpec::default());
//! assert_eq!(ladder.first().unwrap().out, Size { w: 4000, h: 3000 });
//! assert_eq!(ladder.last().unwrap().out, Size { w: 400, h: 300 });
//! ```
//!
//! Everything here is a pure function of its inputs; the only reusable state
//! is the caller-owned `fast_image_resize::Resizer`.

pub mod cpu;
pub mod flatten;
pub mod plan;
