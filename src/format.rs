//! # Output Format Policy
//!
//! Decides the container the search encodes to, and whether alpha has to be
//! composited away first. Resolved once per invocation so every candidate of a
//! search shares the same format and flatten decision.
//!
//! | Source          | Alpha | Output | Flatten |
//! |-----------------|-------|--------|---------|
//! | `image/png`     | no    | PNG    | no      |
//! | `image/png`     | yes   | JPEG   | yes     |
//! | `image/jpeg`    | any   | JPEG   | if alpha|
//!
//! Flattening always composites onto opaque white ([`FLATTEN_BACKGROUND`]).

use std::fmt;

/// Background used when alpha must be removed before lossy encoding.
pub const FLATTEN_BACKGROUND: [u8; 3] = sizefit_scale::flatten::WHITE;

/// Declared mime types accepted from callers.
pub const ACCEPTED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/jpg", "image/png"];

/// Container formats the engine can emit or recognise in its own output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    /// Never requested by the policy; only reported if a codec emits it.
    WebP,
}

impl OutputFormat {
    /// Concrete mime type for this format.
    pub fn mime(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        })
    }
}

/// Result of [`decide_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDecision {
    pub format: OutputFormat,
    /// Composite onto [`FLATTEN_BACKGROUND`] before encoding.
    pub flatten: bool,
}

impl FormatDecision {
    /// Background to flatten onto, if flattening applies.
    pub fn background(self) -> Option<[u8; 3]> {
        self.flatten.then_some(FLATTEN_BACKGROUND)
    }
}

/// Lower-cased mime essence: `"Image/PNG; q=1"` → `"image/png"`.
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// True if `mime` is one of [`ACCEPTED_MIME_TYPES`].
pub fn is_accepted_mime(mime: &str) -> bool {
    let essence = normalize_mime(mime);
    ACCEPTED_MIME_TYPES.contains(&essence.as_str())
}

/// Choose the output container and flatten flag.
///
/// PNG sources without alpha stay PNG, since there is nothing alpha-related
/// to lose. Everything else becomes JPEG, and JPEG output of an image with
/// alpha is always flattened.
pub fn decide_format(source_mime: &str, has_alpha: bool) -> FormatDecision {
    let is_png = normalize_mime(source_mime) == "image/png";
    if is_png && !has_alpha {
        return FormatDecision {
            format: OutputFormat::Png,
            flatten: false,
        };
    }
    FormatDecision {
        format: OutputFormat::Jpeg,
        flatten: has_alpha,
    }
}

/// Identify the container of encoded bytes from their magic number.
pub fn sniff_format(bytes: &[u8]) -> Option<OutputFormat> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Jpeg => Some(OutputFormat::Jpeg),
        image::ImageFormat::Png => Some(OutputFormat::Png),
        image::ImageFormat::WebP => Some(OutputFormat::WebP),
        _ => None,
    }
}

/// Mime type for a path, from its extension.
pub fn mime_from_extension(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}
