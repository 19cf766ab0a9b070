// SPDX-License-Identifier: MIT
// CPU resampler built on fast_image_resize (SIMD-accelerated).
// RGBA8 in → RGBA8 out, tightly packed rows on both sides.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x4;
use fir::{FilterType, ResizeAlg, ResizeOptions, Resizer};

use crate::plan::Size;

#[derive(Debug)]
pub enum ScaleError {
    BufferTooSmall { expected: usize, actual: usize },
    ZeroDimension(Size),
    Fir(fir::ResizeError),
    ImageBuf(fir::ImageBufferError),
}

impl From<fir::ResizeError> for ScaleError { fn from(e: fir::ResizeError) -> Self { Self::Fir(e) } }
impl From<fir::ImageBufferError> for ScaleError { fn from(e: fir::ImageBufferError) -> Self { Self::ImageBuf(e) } }

impl std::fmt::Display for ScaleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScaleError::BufferTooSmall { expected, actual } => {
                write!(f, "Pixel buffer too small: expected {} bytes, got {}", expected, actual)
            }
            ScaleError::ZeroDimension(size) => write!(f, "Zero-sized image: {}x{}", size.w, size.h),
            ScaleError::Fir(e) => write!(f, "Fast image resize error: {}", e),
            ScaleError::ImageBuf(e) => write!(f, "Image buffer error: {}", e),
        }
    }
}

impl std::error::Error for ScaleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScaleError::Fir(e) => Some(e),
            ScaleError::ImageBuf(e) => Some(e),
            _ => None,
        }
    }
}

/// Resampling kernel exposed on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Filter {
    /// Sharpest downscale, slowest.
    #[default]
    Lanczos3,
    CatmullRom,
    Bilinear,
    /// Pixel replication; only useful for pixel art.
    Nearest,
}

impl Filter {
    fn alg(self) -> ResizeAlg {
        match self {
            Filter::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
            Filter::CatmullRom => ResizeAlg::Convolution(FilterType::CatmullRom),
            Filter::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
            Filter::Nearest => ResizeAlg::Nearest,
        }
    }
}

/// Byte length of a tightly packed RGBA8 buffer of `size`.
pub fn rgba_len(size: Size) -> usize {
    (size.w as usize) * (size.h as usize) * 4
}

/// Resample `src_rgba` (tightly packed, `src` pixels) to `out`.
///
/// Alpha-aware: colour channels are premultiplied during convolution so
/// transparent neighbours do not bleed dark fringes into opaque edges.
/// Returns a copy when `out == src`.
pub fn resize_rgba(
    resizer: &mut Resizer,
    src_rgba: &[u8],
    src: Size,
    out: Size,
    filter: Filter,
) -> Result<Vec<u8>, ScaleError> {
    if src.w == 0 || src.h == 0 {
        return Err(ScaleError::ZeroDimension(src));
    }
    if out.w == 0 || out.h == 0 {
        return Err(ScaleError::ZeroDimension(out));
    }
    let src_len = rgba_len(src);
    if src_rgba.len() < src_len {
        return Err(ScaleError::BufferTooSmall {
            expected: src_len,
            actual: src_rgba.len(),
        });
    }
    if out == src {
        return Ok(src_rgba[..src_len].to_vec());
    }

    let src_view = TypedImageRef::<U8x4>::from_buffer(src.w, src.h, &src_rgba[..src_len])?;

    let mut dst = vec![0u8; rgba_len(out)];
    let mut dst_image = TypedImage::<U8x4>::from_buffer(out.w, out.h, dst.as_mut_slice())?;

    let opts = ResizeOptions::new().resize_alg(filter.alg()).use_alpha(true);
    resizer.resize_typed::<U8x4>(&src_view, &mut dst_image, &opts)?;

    Ok(dst)
}
