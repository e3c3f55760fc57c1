//! Trimming rendered rasters to their content.

use image::{imageops, Rgba, RgbaImage};
use std::path::Path;
use thiserror::Error;

/// Errors raised by the cropper.
#[derive(Error, Debug)]
pub enum CropError {
    /// No pixel of the image counts as content.
    #[error("image has no visible content")]
    Blank,

    /// Decoding or encoding the image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Rule deciding which pixels are content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropMode {
    /// Any pixel more opaque than the threshold.
    #[default]
    Alpha,
    /// Any pixel more opaque than the threshold that is not pure white.
    /// Used when the canvas has an opaque white background.
    NonWhite,
}

impl CropMode {
    fn is_content(self, px: &Rgba<u8>, alpha_threshold: u8) -> bool {
        let [r, g, b, a] = px.0;
        if a <= alpha_threshold {
            return false;
        }
        match self {
            CropMode::Alpha => true,
            CropMode::NonWhite => (r, g, b) != (255, 255, 255),
        }
    }
}

/// Pixel rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in pixels, at least 1.
    pub width: u32,
    /// Height in pixels, at least 1.
    pub height: u32,
}

/// Finds the smallest rectangle containing every content pixel.
///
/// Returns `None` when the image has no content at all.
pub fn content_bounds(img: &RgbaImage, mode: CropMode, alpha_threshold: u8) -> Option<Bounds> {
    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0;
    let mut max_y = 0;

    for (x, y, px) in img.enumerate_pixels() {
        if mode.is_content(px, alpha_threshold) {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }

    if min_x == u32::MAX {
        return None;
    }
    Some(Bounds {
        x: min_x,
        y: min_y,
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
    })
}

/// Crops `img` to [`content_bounds`].
pub fn crop_to_content(
    img: &RgbaImage,
    mode: CropMode,
    alpha_threshold: u8,
) -> Result<RgbaImage, CropError> {
    let b = content_bounds(img, mode, alpha_threshold).ok_or(CropError::Blank)?;
    Ok(imageops::crop_imm(img, b.x, b.y, b.width, b.height).to_image())
}

/// Loads the image at `src`, crops it and writes the result to `dst` as PNG.
///
/// Returns the size of the written image.
pub fn crop_file(
    src: &Path,
    dst: &Path,
    mode: CropMode,
    alpha_threshold: u8,
) -> Result<(u32, u32), CropError> {
    let img = image::open(src)?.to_rgba8();
    let cropped = crop_to_content(&img, mode, alpha_threshold)?;
    cropped.save_with_format(dst, image::ImageFormat::Png)?;
    log::debug!(
        "cropped {}x{} to {}x{} -> {}",
        img.width(),
        img.height(),
        cropped.width(),
        cropped.height(),
        dst.display()
    );
    Ok(cropped.dimensions())
}
