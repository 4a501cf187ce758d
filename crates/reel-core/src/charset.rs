use std::fmt;

use crate::error::CoreError;

/// 10 caractères — compact, bon contraste (index 0 = le plus sombre).
pub const RAMP_CLASSIC: &str = "@%#*+=-:. ";

/// 70 caractères — Paul Bourke, résolution maximale (dense→clair).
pub const RAMP_DETAILED: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Blocs Unicode — pseudo-pixels.
pub const RAMP_BLOCKS: &str = "█▓▒░ ";

/// Ordered glyph palette, index 0 = darkest, last index = brightest.
///
/// Mapping is pre-computed into a 256-entry lookup table at construction,
/// so `map` is O(1) per pixel.
///
/// Rounding: the index for luminance `v` is `round(v * (L - 1) / 255)`,
/// computed exactly in integers. 255 being odd, an exact half never occurs,
/// so the result does not depend on a tie-breaking rule.
///
/// # Example
/// ```
/// use reel_core::charset::{GlyphRamp, RAMP_CLASSIC};
/// let ramp = GlyphRamp::new(RAMP_CLASSIC).unwrap();
/// assert_eq!(ramp.map(0), '@');
/// assert_eq!(ramp.map(128), '=');
/// assert_eq!(ramp.map(255), ' ');
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct GlyphRamp {
    glyphs: Vec<char>,
    lut: [char; 256],
}

impl GlyphRamp {
    /// Build a ramp from a string ordered darkest→brightest.
    ///
    /// # Errors
    /// Returns [`CoreError::EmptyRamp`] if `ramp` has no character.
    pub fn new(ramp: &str) -> Result<Self, CoreError> {
        Self::from_glyphs(ramp.chars().collect())
    }

    fn from_glyphs(glyphs: Vec<char>) -> Result<Self, CoreError> {
        let Some(last) = glyphs.len().checked_sub(1) else {
            return Err(CoreError::EmptyRamp);
        };
        let lut = std::array::from_fn(|v| glyphs[glyph_index(v, last)]);
        Ok(Self { glyphs, lut })
    }

    /// Map a luminance value to its glyph.
    #[inline(always)]
    #[must_use]
    pub fn map(&self, luminance: u8) -> char {
        self.lut[usize::from(luminance)]
    }

    /// Map an unchecked integer luminance to its glyph.
    ///
    /// # Errors
    /// Returns [`CoreError::LuminanceOutOfRange`] if `value` is outside [0, 255].
    ///
    /// # Example
    /// ```
    /// use reel_core::charset::GlyphRamp;
    /// let ramp = GlyphRamp::new(" #").unwrap();
    /// assert_eq!(ramp.map_value(255).unwrap(), '#');
    /// assert!(ramp.map_value(256).is_err());
    /// ```
    pub fn map_value(&self, value: i64) -> Result<char, CoreError> {
        u8::try_from(value)
            .map(|v| self.map(v))
            .map_err(|_| CoreError::LuminanceOutOfRange(value))
    }

    /// Same glyphs, brightest first. Used for light-background terminals.
    #[must_use]
    pub fn inverted(&self) -> Self {
        let mut glyphs = self.glyphs.clone();
        glyphs.reverse();
        let mut lut = self.lut;
        lut.reverse();
        Self { glyphs, lut }
    }

    /// Glyphs in ramp order.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// Number of glyphs (always ≥ 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always `false`: an empty ramp cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl Default for GlyphRamp {
    fn default() -> Self {
        let glyphs: Vec<char> = RAMP_CLASSIC.chars().collect();
        let last = glyphs.len() - 1;
        let lut = std::array::from_fn(|v| glyphs[glyph_index(v, last)]);
        Self { glyphs, lut }
    }
}

impl fmt::Display for GlyphRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.glyphs.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

impl fmt::Debug for GlyphRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlyphRamp").field(&self.to_string()).finish()
    }
}

/// round(v * last / 255) = floor((2·v·last + 255) / 510).
#[inline]
fn glyph_index(v: usize, last: usize) -> usize {
    (2 * v * last + 255) / 510
}
