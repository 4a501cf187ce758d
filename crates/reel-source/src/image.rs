use std::path::Path;

use anyhow::{Context, Result};
use reel_core::frame::LuminanceGrid;

/// Charge une image et la réduit à sa luminance (un octet par pixel).
///
/// Images already extracted in grayscale keep their values; color images are
/// collapsed with the `image` crate's luma conversion.
///
/// # Errors
/// Returns an error if the image cannot be opened or decoded.
///
/// # Example
/// ```no_run
/// use reel_source::image::load_luminance;
/// use std::path::Path;
/// let grid = load_luminance(Path::new("frames/frame_000001.png")).unwrap();
/// ```
pub fn load_luminance(path: &Path) -> Result<LuminanceGrid> {
    let img = image::open(path)
        .with_context(|| format!("Impossible de charger {}", path.display()))?;
    let luma = img.to_luma8();
    let (w, h) = luma.dimensions();
    let grid = LuminanceGrid::new(w as usize, h as usize, luma.into_raw())
        .with_context(|| format!("Image vide : {}", path.display()))?;
    Ok(grid)
}
