//! TeX to raster rendering.
//!
//! Rendering happens in two stages: an [`EquationRenderer`] turns TeX markup
//! into SVG, then [`rasterize`] draws that SVG with `resvg` at a tier's scale
//! onto a transparent canvas that is larger than the content by
//! [`RenderConfig::padding`] on every side. The cropper later trims the
//! margin back off.

use crate::crop::CropMode;
use resvg::tiny_skia::{Color, Pixmap, Transform};
use resvg::usvg;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors that can occur while rendering an equation.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The equation has no markup to render.
    #[error("equation markup is empty")]
    EmptyMarkup,

    /// The markup renderer rejected the TeX source.
    #[error("failed to render TeX markup: {0}")]
    Markup(String),

    /// The markup renderer produced no SVG.
    #[error("SVG rendering returned empty output")]
    EmptyOutput,

    /// The produced SVG could not be parsed.
    #[error("failed to parse SVG: {0}")]
    Svg(#[from] usvg::Error),

    /// The scaled canvas would be zero-sized or too large to allocate.
    #[error("cannot allocate a {width}x{height} raster")]
    InvalidSize {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },

    /// The scaled size plus padding does not fit a raster dimension.
    #[error("canvas for scale {scale} with {padding}px padding is too large")]
    CanvasTooLarge {
        /// Tier scale.
        scale: f32,
        /// Configured padding.
        padding: u32,
    },

    /// Encoding the raster as PNG failed.
    #[error("failed to encode PNG: {0}")]
    Encode(String),

    /// Writing the raster failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for rendering equations to rasters.
///
/// The same configuration is shared by every tier; only the scale differs.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Font size in pixels at scale 1.0. Default: 300
    pub font_size: f32,

    /// Transparent margin added around the content before cropping, in pixels. Default: 16
    pub padding: u32,

    /// Text color as ARGB (0xAARRGGBB). Default: 0xff000000 (opaque black)
    pub text_color: u32,

    /// Whether to fill the canvas with opaque white before drawing.
    pub has_background: bool,

    /// How the cropper decides which pixels are content.
    pub crop_mode: CropMode,

    /// Pixels with alpha at or below this value are treated as blank. Default: 0
    pub alpha_threshold: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_size: 300.0,
            padding: 16,
            text_color: 0xff000000,
            has_background: false,
            crop_mode: CropMode::Alpha,
            alpha_threshold: 0,
        }
    }
}

/// Parses an ARGB color written as hex, with or without a `0x` prefix.
///
/// Six-digit values are taken as opaque RGB.
pub fn parse_color(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("Invalid color: {:?} is not hexadecimal", s));
    }
    let value = u32::from_str_radix(digits, 16).map_err(|e| format!("Invalid color: {}", e))?;
    match digits.len() {
        6 => Ok(0xff000000 | value),
        8 => Ok(value),
        _ => Err(format!("Invalid color: expected 6 or 8 hex digits, got {:?}", s)),
    }
}

/// Turns TeX markup into SVG markup.
///
/// Implementations must be shareable across the per-tier worker threads.
pub trait EquationRenderer: Send + Sync {
    /// Renders `tex` (without math delimiters) to a standalone SVG document.
    fn render_svg(&self, tex: &str) -> Result<String, RenderError>;
}

/// Outcome of the one-time engine start, shared by every renderer.
static MATHJAX_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Renderer backed by MathJax through the `mathjax_svg` crate.
///
/// The JS engine behind `mathjax_svg` sets up process-wide state on its
/// first conversion and must not do so from two threads at once. Build the
/// renderer with [`MathJaxRenderer::new`] before handing it to
/// [`crate::generate`] so that setup happens on the calling thread.
#[derive(Debug, Clone, Copy)]
pub struct MathJaxRenderer {
    _private: (),
}

impl MathJaxRenderer {
    /// Creates a MathJax renderer, starting the engine on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Markup`] if the engine fails to render a
    /// trivial equation. The failure is remembered; later calls return it
    /// again without retrying.
    pub fn new() -> Result<Self, RenderError> {
        MATHJAX_INIT
            .get_or_init(|| {
                log::debug!("starting MathJax engine");
                mathjax_svg::convert_to_svg("x")
                    .map(|_| ())
                    .map_err(|e| format!("{:?}", e))
            })
            .clone()
            .map_err(RenderError::Markup)?;
        Ok(Self { _private: () })
    }
}

impl EquationRenderer for MathJaxRenderer {
    fn render_svg(&self, tex: &str) -> Result<String, RenderError> {
        let tex = tex.trim();
        if tex.is_empty() {
            return Err(RenderError::EmptyMarkup);
        }

        let svg = mathjax_svg::convert_to_svg(tex)
            .map_err(|e| RenderError::Markup(format!("{:?}", e)))?;
        if svg.trim().is_empty() {
            return Err(RenderError::EmptyOutput);
        }
        // MathJax reports TeX errors inline instead of failing.
        if let Some(message) = find_markup_error(&svg) {
            return Err(RenderError::Markup(message));
        }
        Ok(svg)
    }
}

/// Extracts the message of the first `data-mjx-error` attribute, if any.
///
/// # Example
///
/// ```rust
/// use eqnimg::render::find_markup_error;
///
/// let svg = r#"<svg><g data-mml-node="merror" data-mjx-error="Missing close brace"></g></svg>"#;
/// assert_eq!(find_markup_error(svg).as_deref(), Some("Missing close brace"));
/// ```
pub fn find_markup_error(svg: &str) -> Option<String> {
    const ATTR: &str = "data-mjx-error=\"";
    let start = svg.find(ATTR)? + ATTR.len();
    let len = svg[start..].find('"')?;
    Some(svg[start..start + len].to_string())
}

/// Inserts presentation attributes into the root `<svg>` tag so MathJax's
/// `currentColor` resolves to the configured text color.
///
/// If no `<svg` tag is found the input is returned unchanged.
pub fn apply_text_color(svg: &str, argb: u32) -> String {
    let [a, r, g, b] = argb.to_be_bytes();
    let mut attrs = format!(r##" color="#{:02x}{:02x}{:02x}""##, r, g, b);
    if a != 0xff {
        attrs.push_str(&format!(r#" opacity="{:.4}""#, a as f32 / 255.0));
    }

    if let Some(svg_start) = svg.find("<svg") {
        if let Some(close_bracket) = svg[svg_start..].find('>') {
            let mut insert_pos = svg_start + close_bracket;
            // Self-closing root: keep the slash after the new attributes.
            if svg[..insert_pos].ends_with('/') {
                insert_pos -= 1;
            }
            let mut result = String::with_capacity(svg.len() + attrs.len());
            result.push_str(&svg[..insert_pos]);
            result.push_str(&attrs);
            result.push_str(&svg[insert_pos..]);
            return result;
        }
    }
    svg.to_string()
}

/// Draws `svg` at `scale` onto an oversized canvas.
///
/// The canvas measures the scaled SVG size plus `config.padding` on each
/// side; the content is drawn offset by the padding.
pub fn rasterize(svg: &str, scale: f32, config: &RenderConfig) -> Result<Pixmap, RenderError> {
    let svg = apply_text_color(svg, config.text_color);
    let options = usvg::Options {
        font_size: config.font_size,
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(&svg, &options)?;

    let size = tree.size();
    let pad = config.padding;
    let too_large = || RenderError::CanvasTooLarge {
        scale,
        padding: pad,
    };
    let width = padded_extent(size.width(), scale, pad).ok_or_else(too_large)?;
    let height = padded_extent(size.height(), scale, pad).ok_or_else(too_large)?;

    let mut pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })?;
    if config.has_background {
        pixmap.fill(Color::WHITE);
    }

    let transform = Transform::from_row(scale, 0.0, 0.0, scale, pad as f32, pad as f32);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    log::trace!(
        "rasterized {}x{} svg at scale {} into {}x{} canvas",
        size.width(),
        size.height(),
        scale,
        width,
        height
    );
    Ok(pixmap)
}

/// `ceil(len * scale) + 2 * pad`, or `None` if it does not fit in a `u32`.
fn padded_extent(len: f32, scale: f32, pad: u32) -> Option<u32> {
    let scaled = (len * scale).ceil();
    if !scaled.is_finite() || scaled < 0.0 || scaled > u32::MAX as f32 {
        return None;
    }
    pad.checked_mul(2)?.checked_add(scaled as u32)
}

/// Writes a raster as PNG.
pub fn write_png(pixmap: &Pixmap, path: &Path) -> Result<(), RenderError> {
    let data = pixmap
        .encode_png()
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    std::fs::write(path, data)?;
    Ok(())
}
