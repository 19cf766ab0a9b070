//! Production codec over the `image` crate, with resampling delegated to
//! `sizefit-scale` (fast_image_resize).
//!
//! Pixels are kept as RGBA8 for the whole search so resampling and
//! flattening work on one layout; the alpha channel is dropped only at
//! encode time.
//!
//! PNG is lossless, so below quality 100 the pixels are quantised to a
//! palette with NeuQuant and written as indexed PNG. Quality picks the
//! palette size (64 colours at 10, 256 at 99), so lower quality still means
//! smaller output and the binary search has a real axis to move along.
//! Quality 100 keeps every colour.

use color_quant::NeuQuant;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use sizefit_scale::cpu::{resize_rgba, Filter};
use sizefit_scale::flatten::{flatten_in_place, has_transparency};

use super::{Codec, Decoded, ImageInfo, Size};
use crate::error::{FitError, FitResult};
use crate::format::OutputFormat;

/// [`Codec`] implementation backed by `image` + `fast_image_resize`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec {
    filter: Filter,
}

impl ImageCodec {
    pub fn new(filter: Filter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }
}

const MIN_PALETTE: usize = 64;
const MAX_PALETTE: usize = 256;

/// Palette size for a PNG quality, `None` meaning truecolour.
fn palette_size(quality: u8) -> Option<usize> {
    if quality >= 100 {
        return None;
    }
    let q = quality.clamp(10, 99) as usize;
    Some(MIN_PALETTE + (q - 10) * (MAX_PALETTE - MIN_PALETTE) / 89)
}

/// NeuQuant sampling factor: examine fewer pixels on large images.
fn sample_factor(pixels: u64) -> i32 {
    match pixels {
        0..=100_000 => 3,
        100_001..=1_000_000 => 10,
        _ => 20,
    }
}

fn encode_jpeg(pixels: &RgbaImage, quality: u8) -> FitResult<Vec<u8>> {
    let (w, h) = pixels.dimensions();
    // JPEG has no alpha; transparent sources were flattened upstream.
    let rgb = rgba_to_rgb(pixels);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100))
        .write_image(&rgb, w, h, ExtendedColorType::Rgb8)
        .map_err(|e| FitError::encoding("jpeg_encode", e.to_string()))?;
    Ok(buf)
}

fn encode_truecolor_png(pixels: &RgbaImage) -> FitResult<Vec<u8>> {
    let (w, h) = pixels.dimensions();
    let mut buf = Vec::new();
    let enc = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilterType::Adaptive);
    if has_transparency(pixels.as_raw()) {
        enc.write_image(pixels.as_raw(), w, h, ExtendedColorType::Rgba8)
    } else {
        enc.write_image(&rgba_to_rgb(pixels), w, h, ExtendedColorType::Rgb8)
    }
    .map_err(|e| FitError::encoding("png_encode", e.to_string()))?;
    Ok(buf)
}

fn encode_indexed_png(pixels: &RgbaImage, colors: usize) -> FitResult<Vec<u8>> {
    let (w, h) = pixels.dimensions();
    let raw = pixels.as_raw();
    let quant = NeuQuant::new(sample_factor(w as u64 * h as u64), colors, raw);
    let indices: Vec<u8> = raw
        .chunks_exact(4)
        .map(|px| quant.index_of(px) as u8)
        .collect();

    let map = quant.color_map_rgba();
    let palette: Vec<u8> = map.chunks_exact(4).flat_map(|c| [c[0], c[1], c[2]]).collect();
    // tRNS may stop at the last non-opaque entry; the rest default to opaque.
    let trns = if has_transparency(raw) {
        let alphas: Vec<u8> = map.chunks_exact(4).map(|c| c[3]).collect();
        alphas
            .iter()
            .rposition(|&a| a < 255)
            .map(|last| alphas[..=last].to_vec())
    } else {
        None
    };

    let png_err = |e: png::EncodingError| FitError::encoding("png_encode", e.to_string());
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, w, h);
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_palette(palette);
        if let Some(trns) = trns {
            encoder.set_trns(trns);
        }
        encoder.set_compression(png::Compression::High);
        let mut writer = encoder.write_header().map_err(png_err)?;
        writer.write_image_data(&indices).map_err(png_err)?;
        writer.finish().map_err(png_err)?;
    }
    Ok(buf)
}

fn rgba_to_rgb(pixels: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixels.as_raw().len() / 4 * 3);
    for px in pixels.as_raw().chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
    }
    rgb
}

impl Codec for ImageCodec {
    type Pixels = RgbaImage;

    fn decode(&self, bytes: &[u8]) -> FitResult<Decoded<RgbaImage>> {
        let image = image::load_from_memory(bytes).map_err(|e| {
            FitError::unsupported(None, e.to_string()).with_operation("decode")
        })?;
        let info = ImageInfo {
            width: image.width(),
            height: image.height(),
            has_alpha: image.color().has_alpha(),
        };
        if info.width == 0 || info.height == 0 {
            return Err(FitError::unsupported(None, "image has zero width or height")
                .with_operation("decode"));
        }
        Ok(Decoded {
            info,
            pixels: image.into_rgba8(),
        })
    }

    fn resample(
        &self,
        pixels: &RgbaImage,
        size: Size,
        background: Option<[u8; 3]>,
    ) -> FitResult<RgbaImage> {
        let src = Size {
            w: pixels.width(),
            h: pixels.height(),
        };
        let mut resizer = fast_image_resize::Resizer::new();
        let mut raw = resize_rgba(&mut resizer, pixels.as_raw(), src, size, self.filter).map_err(|e| {
            FitError::encoding("resample", e.to_string())
                .with_metadata("from", format!("{}x{}", src.w, src.h))
                .with_metadata("to", format!("{}x{}", size.w, size.h))
        })?;
        if let Some(bg) = background {
            flatten_in_place(&mut raw, bg);
        }
        RgbaImage::from_raw(size.w, size.h, raw)
            .ok_or_else(|| FitError::encoding("resample", "resampled buffer has the wrong length"))
    }

    fn encode(&self, pixels: &RgbaImage, quality: u8, format: OutputFormat) -> FitResult<Vec<u8>> {
        match format {
            OutputFormat::Jpeg => encode_jpeg(pixels, quality),
            OutputFormat::Png => match palette_size(quality) {
                Some(colors) => encode_indexed_png(pixels, colors),
                None => encode_truecolor_png(pixels),
            },
            OutputFormat::WebP => Err(FitError::encoding(
                "webp_encode",
                "WebP output is not produced by this codec",
            )),
        }
    }
}
