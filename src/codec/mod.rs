//! # Codec Adapter
//!
//! The search never touches pixels or bitstreams itself. Everything it needs
//! from an image library goes through the [`Codec`] capability:
//!
//! 1. **decode**: source bytes → dimensions, alpha flag and a pixel buffer
//! 2. **resample**: pixel buffer → exact output size, optionally flattened
//! 3. **encode**: resampled pixels + quality + container → bytes
//!
//! `encode(resample(pixels, size, background), quality, format)` is the
//! single expensive primitive the search measures. Implementations must be
//! pure: identical inputs give byte-identical output, with no state carried
//! between calls. That is what lets the search tests run against a
//! deterministic fake instead of a real JPEG encoder.

pub mod image_codec;

pub use image_codec::ImageCodec;
pub use sizefit_scale::plan::Size;

use crate::error::FitResult;
use crate::format::OutputFormat;

/// Metadata read from the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
}

impl ImageInfo {
    pub fn size(&self) -> Size {
        Size {
            w: self.width,
            h: self.height,
        }
    }
}

/// A decoded source: metadata plus the codec's own pixel representation.
#[derive(Debug, Clone)]
pub struct Decoded<P> {
    pub info: ImageInfo,
    pub pixels: P,
}

/// Image codec capability consumed by the search.
pub trait Codec {
    /// Codec-specific decoded pixel buffer.
    type Pixels;

    /// Decode source bytes. Undecodable input is
    /// [`FitError::UnsupportedOrCorruptImage`](crate::error::FitError::UnsupportedOrCorruptImage).
    fn decode(&self, bytes: &[u8]) -> FitResult<Decoded<Self::Pixels>>;

    /// Resample to exactly `size`. With `background` set, composite every
    /// pixel onto that opaque colour.
    fn resample(
        &self,
        pixels: &Self::Pixels,
        size: Size,
        background: Option<[u8; 3]>,
    ) -> FitResult<Self::Pixels>;

    /// Encode already-resampled pixels.
    fn encode(&self, pixels: &Self::Pixels, quality: u8, format: OutputFormat) -> FitResult<Vec<u8>>;
}

impl<C: Codec + ?Sized> Codec for &C {
    type Pixels = C::Pixels;

    fn decode(&self, bytes: &[u8]) -> FitResult<Decoded<Self::Pixels>> {
        (**self).decode(bytes)
    }

    fn resample(
        &self,
        pixels: &Self::Pixels,
        size: Size,
        background: Option<[u8; 3]>,
    ) -> FitResult<Self::Pixels> {
        (**self).resample(pixels, size, background)
    }

    fn encode(&self, pixels: &Self::Pixels, quality: u8, format: OutputFormat) -> FitResult<Vec<u8>> {
        (**self).encode(pixels, quality, format)
    }
}

/// Deterministic in-memory codec for unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;
    use crate::error::FitError;

    /// Pixels are just the size they were resampled to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FakePixels {
        pub size: Size,
        pub flattened: bool,
    }

    /// Encoded length is `base + area * quality / divisor`.
    pub struct FakeCodec {
        pub info: ImageInfo,
        pub base: u64,
        pub divisor: u64,
        pub encodes: RefCell<Vec<(Size, u8)>>,
        pub resamples: RefCell<Vec<(Size, Option<[u8; 3]>)>>,
    }

    impl FakeCodec {
        pub fn new(width: u32, height: u32, has_alpha: bool) -> Self {
            Self {
                info: ImageInfo {
                    width,
                    height,
                    has_alpha,
                },
                base: 100,
                divisor: 100,
                encodes: RefCell::new(Vec::new()),
                resamples: RefCell::new(Vec::new()),
            }
        }

        pub fn size_of(&self, size: Size, quality: u8) -> u64 {
            self.base + size.area() * quality as u64 / self.divisor
        }
    }

    impl Codec for FakeCodec {
        type Pixels = FakePixels;

        fn decode(&self, bytes: &[u8]) -> FitResult<Decoded<FakePixels>> {
            if bytes.starts_with(b"corrupt") {
                return Err(FitError::unsupported(None, "fake decode failure"));
            }
            Ok(Decoded {
                info: self.info,
                pixels: FakePixels {
                    size: self.info.size(),
                    flattened: false,
                },
            })
        }

        fn resample(&self, _: &FakePixels, size: Size, background: Option<[u8; 3]>) -> FitResult<FakePixels> {
            self.resamples.borrow_mut().push((size, background));
            Ok(FakePixels {
                size,
                flattened: background.is_some(),
            })
        }

        fn encode(&self, pixels: &FakePixels, quality: u8, format: OutputFormat) -> FitResult<Vec<u8>> {
            self.encodes.borrow_mut().push((pixels.size, quality));
            let len = self.size_of(pixels.size, quality) as usize;
            let magic: &[u8] = match format {
                OutputFormat::Jpeg => &[0xFF, 0xD8, 0xFF, 0xE0],
                OutputFormat::Png => &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
                OutputFormat::WebP => return Err(FitError::encoding("fake_encode", "no webp")),
            };
            let mut out = vec![0u8; len.max(magic.len())];
            out[..magic.len()].copy_from_slice(magic);
            Ok(out)
        }
    }
}
