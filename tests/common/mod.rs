//! Common test utilities for the sizefit tests
//!
//! Provides a deterministic fake codec for exercising the search without a
//! real encoder, and synthetic image builders for the real-codec scenarios.

#![allow(dead_code)]

/// Deterministic codec whose encoded size is a known function of the
/// resampled size and the quality.
pub mod fake_codec {
    use std::cell::RefCell;

    use sizefit::{Codec, Decoded, FitError, FitResult, ImageInfo, OutputFormat, Size};

    /// Encoded length as a function of output size and quality.
    pub type SizeModel = fn(Size, u8) -> u64;

    /// `100 + area * quality / 100`
    pub fn linear(size: Size, quality: u8) -> u64 {
        100 + size.area() * quality as u64 / 100
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Event {
        Resample { size: Size, background: Option<[u8; 3]> },
        Encode { size: Size, quality: u8 },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FakePixels {
        pub size: Size,
        pub flattened: bool,
    }

    pub struct FakeCodec {
        pub info: ImageInfo,
        pub model: SizeModel,
        pub log: RefCell<Vec<Event>>,
    }

    impl FakeCodec {
        pub fn new(width: u32, height: u32, has_alpha: bool) -> Self {
            Self::with_model(width, height, has_alpha, linear)
        }

        pub fn with_model(width: u32, height: u32, has_alpha: bool, model: SizeModel) -> Self {
            Self {
                info: ImageInfo {
                    width,
                    height,
                    has_alpha,
                },
                model,
                log: RefCell::new(Vec::new()),
            }
        }

        pub fn encodes(&self) -> Vec<(Size, u8)> {
            self.log
                .borrow()
                .iter()
                .filter_map(|e| match *e {
                    Event::Encode { size, quality } => Some((size, quality)),
                    _ => None,
                })
                .collect()
        }

        pub fn resamples(&self) -> Vec<(Size, Option<[u8; 3]>)> {
            self.log
                .borrow()
                .iter()
                .filter_map(|e| match *e {
                    Event::Resample { size, background } => Some((size, background)),
                    _ => None,
                })
                .collect()
        }

        /// Distinct widths encoded, in first-seen order.
        pub fn widths(&self) -> Vec<u32> {
            let mut widths: Vec<u32> = Vec::new();
            for (size, _) in self.encodes() {
                if widths.last() != Some(&size.w) {
                    widths.push(size.w);
                }
            }
            widths
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
            self.log.borrow_mut().push(Event::Resample { size, background });
            Ok(FakePixels {
                size,
                flattened: background.is_some(),
            })
        }

        fn encode(&self, pixels: &FakePixels, quality: u8, format: OutputFormat) -> FitResult<Vec<u8>> {
            self.log.borrow_mut().push(Event::Encode {
                size: pixels.size,
                quality,
            });
            let magic: &[u8] = match format {
                OutputFormat::Jpeg => &[0xFF, 0xD8, 0xFF, 0xE0],
                OutputFormat::Png => &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A],
                OutputFormat::WebP => return Err(FitError::encoding("fake_encode", "no webp")),
            };
            let len = ((self.model)(pixels.size, quality) as usize).max(magic.len());
            let mut out = vec![0u8; len];
            out[..magic.len()].copy_from_slice(magic);
            Ok(out)
        }
    }
}

/// Synthetic source images
pub mod images {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    /// Deterministic xorshift noise source.
    pub struct Noise(u32);

    impl Noise {
        pub fn new(seed: u32) -> Self {
            Self(seed.max(1))
        }

        pub fn next(&mut self) -> u8 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 17;
            self.0 ^= self.0 << 5;
            (self.0 & 0xFF) as u8
        }
    }

    /// Gradient with mild noise, photo-like enough for JPEG.
    pub fn photo(width: u32, height: u32) -> RgbImage {
        let mut noise = Noise::new(7);
        RgbImage::from_fn(width, height, |x, y| {
            let n = noise.next() / 16;
            Rgb([
                ((x * 180 / width) as u8).saturating_add(n),
                ((y * 180 / height) as u8).saturating_add(n),
                (((x ^ y) & 0x7F) as u8).saturating_add(n),
            ])
        })
    }

    /// Left half fully transparent black, right half an opaque gradient.
    pub fn half_transparent(width: u32, height: u32) -> RgbaImage {
        let opaque = photo(width, height);
        RgbaImage::from_fn(width, height, |x, y| {
            if x < width / 2 {
                Rgba([0, 0, 0, 0])
            } else {
                let [r, g, b] = opaque.get_pixel(x, y).0;
                Rgba([r, g, b, 255])
            }
        })
    }

    pub fn jpeg_bytes(img: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg)
            .expect("encode jpeg fixture");
        out.into_inner()
    }

    pub fn png_bytes_rgb(img: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .expect("encode png fixture");
        out.into_inner()
    }

    pub fn png_bytes_rgba(img: &RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .expect("encode png fixture");
        out.into_inner()
    }
}
