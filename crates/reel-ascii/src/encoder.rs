use rayon::prelude::*;
use reel_core::charset::GlyphRamp;
use reel_core::error::CoreError;
use reel_core::frame::{Animation, Frame, LuminanceGrid};

/// Convert one luminance grid into a character frame.
///
/// Each cell goes through [`GlyphRamp::map`]; row and column order are kept.
///
/// # Example
/// ```
/// use reel_core::charset::GlyphRamp;
/// use reel_core::frame::LuminanceGrid;
/// use reel_ascii::encoder::encode;
///
/// let ramp = GlyphRamp::new("@%#*+=-:. ").unwrap();
/// let grid = LuminanceGrid::new(3, 1, vec![0, 128, 255]).unwrap();
/// assert_eq!(encode(&grid, &ramp).rows(), ["@= "]);
/// ```
#[must_use]
pub fn encode(grid: &LuminanceGrid, ramp: &GlyphRamp) -> Frame {
    let rows: Vec<String> = grid
        .rows()
        .map(|row| row.iter().map(|&v| ramp.map(v)).collect())
        .collect();
    // Toutes les lignes ont `grid.width()` glyphes : la construction ne peut échouer.
    match Frame::new(rows) {
        Ok(frame) => frame,
        Err(e) => unreachable!("grille rectangulaire, frame irrégulière : {e}"),
    }
}

/// Convert a whole sequence of grids, in parallel.
///
/// Output frame `n` always corresponds to input grid `n`: display order is
/// the temporal order of the source video.
///
/// # Errors
/// Returns [`CoreError::InvalidDimensions`] if a grid differs in size from
/// the first one.
pub fn encode_all(grids: &[LuminanceGrid], ramp: &GlyphRamp) -> Result<Vec<Frame>, CoreError> {
    encode_all_with(grids, ramp, || ())
}

/// [`encode_all`], calling `on_frame` once per encoded frame.
///
/// Calls come from the worker threads, in no particular order. Used to drive
/// a progress bar.
///
/// # Errors
/// Returns [`CoreError::InvalidDimensions`] if a grid differs in size from
/// the first one. `on_frame` is not called in that case.
pub fn encode_all_with<F>(
    grids: &[LuminanceGrid],
    ramp: &GlyphRamp,
    on_frame: F,
) -> Result<Vec<Frame>, CoreError>
where
    F: Fn() + Sync,
{
    if let Some(first) = grids.first() {
        let size = (first.width(), first.height());
        if let Some(bad) = grids.iter().find(|g| (g.width(), g.height()) != size) {
            return Err(CoreError::InvalidDimensions {
                width: bad.width(),
                height: bad.height(),
            });
        }
        log::debug!(
            "Encodage de {} frames {}x{} ({} glyphes)",
            grids.len(),
            size.0,
            size.1,
            ramp.len()
        );
    }
    // par_iter().collect() sur un Vec conserve l'ordre d'entrée.
    Ok(grids
        .par_iter()
        .map(|g| {
            let frame = encode(g, ramp);
            on_frame();
            frame
        })
        .collect())
}

/// Encode a grid sequence and pair it with its frame rate.
///
/// `on_frame` is called once per encoded frame, see [`encode_all_with`].
///
/// # Errors
/// [`CoreError::InvalidFrameRate`] or [`CoreError::InvalidDimensions`].
///
/// # Example
/// ```
/// use reel_core::charset::GlyphRamp;
/// use reel_core::frame::LuminanceGrid;
/// use reel_ascii::encoder::build_animation;
///
/// let grids = vec![LuminanceGrid::new(1, 1, vec![0]).unwrap(); 4];
/// let anim = build_animation(24.0, &grids, &GlyphRamp::default(), || ()).unwrap();
/// assert_eq!(anim.len(), 4);
/// ```
pub fn build_animation<F>(
    frame_rate: f64,
    grids: &[LuminanceGrid],
    ramp: &GlyphRamp,
    on_frame: F,
) -> Result<Animation, CoreError>
where
    F: Fn() + Sync,
{
    reel_core::clock::frame_interval(frame_rate)?;
    Animation::new(frame_rate, encode_all_with(grids, ramp, on_frame)?)
}
