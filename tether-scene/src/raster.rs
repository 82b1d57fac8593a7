//! Rasterize highlight overlays into RGBA images

use std::path::Path;

use image::{Rgba, RgbaImage};
use tether_callout::{HighlightMask, Point};

use crate::error::SceneError;

/// Paint the dim-with-hole overlay, one pixel per overlay unit.
///
/// Pixels are sampled at their centers; the dimmed area is black at the
/// mask's alpha, the cutout fully transparent.
pub fn render_overlay(mask: &HighlightMask) -> RgbaImage {
    let size = mask.size();
    let width = size.width.max(0.0).ceil() as u32;
    let height = size.height.max(0.0).ceil() as u32;

    RgbaImage::from_fn(width, height, |x, y| {
        let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
        Rgba([0, 0, 0, mask.alpha_at(center)])
    })
}

/// Render the overlay and write it to `path` (format from the extension)
pub fn save_overlay(mask: &HighlightMask, path: impl AsRef<Path>) -> Result<(), SceneError> {
    let path = path.as_ref();
    render_overlay(mask).save(path)?;
    log::info!("wrote overlay {}x{} to {}", mask.size().width, mask.size().height, path.display());
    Ok(())
}
