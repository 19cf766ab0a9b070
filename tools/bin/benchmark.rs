/// Benchmark of the size search against synthetic photos.
///
/// For each source size and target, reports wall time, encode calls, the
/// achieved size and whether the fallback ran. Sources are generated
/// noise-plus-gradient images so JPEG has real detail to chew on.
use std::io::Cursor;
use std::time::Instant;

use image::{Rgb, RgbImage};
use sizefit::validate::format_bytes;
use sizefit::Fitter;
use tracing_subscriber::EnvFilter;

fn synthetic_photo(width: u32, height: u32) -> Vec<u8> {
    // xorshift keeps the noise deterministic across runs
    let mut state: u32 = 0x9E37_79B9;
    let img = RgbImage::from_fn(width, height, |x, y| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let noise = (state & 0x3F) as u8;
        Rgb([
            ((x * 200 / width) as u8).saturating_add(noise),
            ((y * 200 / height) as u8).saturating_add(noise / 2),
            (((x + y) * 100 / (width + height)) as u8).saturating_add(noise),
        ])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("encoding the synthetic source");
    out.into_inner()
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    println!("Size Search Benchmark");
    println!("═══════════════════════");

    let fitter = Fitter::default();
    let sizes = [(640, 480), (1920, 1080), (4000, 3000)];
    let targets_kb = [20u64, 100, 200];

    for (w, h) in sizes {
        let source = synthetic_photo(w, h);
        println!();
        println!("Source {}x{} ({})", w, h, format_bytes(source.len() as u64));
        println!("───────────────────────────");

        for kb in targets_kb {
            let target = kb * 1024;
            let started = Instant::now();
            match fitter.fit(&source, "image/jpeg", target) {
                Ok(out) => println!(
                    "target {:>7}: {:>9} at {}x{} q={:<3} {:>3} encodes {:>8.1} ms{}",
                    format_bytes(target),
                    format_bytes(out.len()),
                    out.width,
                    out.height,
                    out.quality,
                    out.encode_calls,
                    started.elapsed().as_secs_f64() * 1000.0,
                    if out.via_fallback { " (fallback)" } else { "" }
                ),
                Err(e) => println!(
                    "target {:>7}: {} after {:.1} ms",
                    format_bytes(target),
                    e,
                    started.elapsed().as_secs_f64() * 1000.0
                ),
            }
        }
    }

    println!();
    println!("Worst case per invocation: 21 widths × 12 qualities + 9 fallback encodes");
}
