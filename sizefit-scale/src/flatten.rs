// SPDX-License-Identifier: MIT
//! Alpha flattening: composite RGBA8 pixels onto an opaque background.
//!
//! Lossy encoders without an alpha channel would otherwise keep whatever
//! colour happens to sit under a transparent pixel, which is frequently black
//! or garbage. After flattening every pixel has alpha 255.

/// Opaque white, the background used ahead of JPEG encoding.
pub const WHITE: [u8; 3] = [255, 255, 255];

/// Composite every pixel of `rgba` over `bg` in place.
///
/// `out = (c * a + bg * (255 - a)) / 255`, rounded to nearest.
pub fn flatten_in_place(rgba: &mut [u8], bg: [u8; 3]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 255 {
            continue;
        }
        for c in 0..3 {
            let fg = px[c] as u32;
            let back = bg[c] as u32;
            px[c] = ((fg * a + back * (255 - a) + 127) / 255) as u8;
        }
        px[3] = 255;
    }
}

/// True if any pixel in `rgba` is not fully opaque.
pub fn has_transparency(rgba: &[u8]) -> bool {
    rgba.chunks_exact(4).any(|px| px[3] != 255)
}
