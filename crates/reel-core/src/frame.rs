use crate::clock::frame_interval;
use crate::error::CoreError;

/// Grille de luminance 8 bits, row-major. Une frame vidéo décodée en niveaux de gris.
///
/// # Example
/// ```
/// use reel_core::frame::LuminanceGrid;
/// let grid = LuminanceGrid::new(2, 1, vec![0, 255]).unwrap();
/// assert_eq!(grid.get(1, 0), 255);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LuminanceGrid {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl LuminanceGrid {
    /// Wrap a row-major buffer of `width × height` luminance values.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidDimensions`] if a dimension is zero or
    /// `data.len() != width * height`.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, CoreError> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a grid from rows of unchecked integers.
    ///
    /// # Errors
    /// [`CoreError::LuminanceOutOfRange`] for a value outside [0, 255],
    /// [`CoreError::InvalidDimensions`] if rows are empty or of unequal length.
    ///
    /// # Example
    /// ```
    /// use reel_core::frame::LuminanceGrid;
    /// let grid = LuminanceGrid::from_rows(&[vec![0, 128], vec![255, 64]]).unwrap();
    /// assert_eq!((grid.width(), grid.height()), (2, 2));
    /// assert!(LuminanceGrid::from_rows(&[vec![0, 256]]).is_err());
    /// ```
    pub fn from_rows(rows: &[Vec<i64>]) -> Result<Self, CoreError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(width * height);
        for row in rows {
            if row.len() != width {
                return Err(CoreError::InvalidDimensions {
                    width: row.len(),
                    height,
                });
            }
            for &v in row {
                data.push(u8::try_from(v).map_err(|_| CoreError::LuminanceOutOfRange(v))?);
            }
        }
        Self::new(width, height, data)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Luminance at (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.data[y * self.width + x]
    }

    /// Rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.width)
    }
}

/// Une image en caractères : lignes de longueur égale, immuable une fois construite.
///
/// # Example
/// ```
/// use reel_core::frame::Frame;
/// let frame = Frame::new(vec!["@@".into(), "..".into()]).unwrap();
/// assert_eq!(frame.dimensions(), (2, 2));
/// assert!(Frame::new(vec!["@@".into(), ".".into()]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    rows: Vec<String>,
}

impl Frame {
    /// Build a frame, checking that every row has the same number of characters.
    ///
    /// # Errors
    /// Returns [`CoreError::RaggedFrame`] on the first row whose length differs.
    pub fn new(rows: Vec<String>) -> Result<Self, CoreError> {
        let expected = rows.first().map_or(0, |r| r.chars().count());
        for (row, text) in rows.iter().enumerate().skip(1) {
            let len = text.chars().count();
            if len != expected {
                return Err(CoreError::RaggedFrame { row, len, expected });
            }
        }
        Ok(Self { rows })
    }

    /// Rows top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// (columns, rows).
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        let width = self.rows.first().map_or(0, |r| r.chars().count());
        (width, self.rows.len())
    }
}

/// Séquence jouable : une fréquence d'images et des frames de dimensions identiques.
///
/// # Example
/// ```
/// use reel_core::frame::{Animation, Frame};
/// let frames = vec![Frame::new(vec!["#".into()]).unwrap(); 3];
/// let anim = Animation::new(12.0, frames).unwrap();
/// assert_eq!(anim.len(), 3);
/// assert!(Animation::new(0.0, vec![]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Animation {
    frame_rate: f64,
    frames: Vec<Frame>,
}

impl Animation {
    /// Build an animation.
    ///
    /// An empty frame list is accepted: playing it is a no-op.
    ///
    /// # Errors
    /// [`CoreError::InvalidFrameRate`] if `frame_rate` does not yield a finite,
    /// non-zero interval; [`CoreError::InvalidDimensions`] if a frame differs in
    /// size from the first one.
    pub fn new(frame_rate: f64, frames: Vec<Frame>) -> Result<Self, CoreError> {
        frame_interval(frame_rate)?;
        if let Some(first) = frames.first() {
            let expected = first.dimensions();
            if let Some(bad) = frames.iter().find(|f| f.dimensions() != expected) {
                let (width, height) = bad.dimensions();
                return Err(CoreError::InvalidDimensions { width, height });
            }
        }
        Ok(Self { frame_rate, frames })
    }

    /// Frames per second.
    #[must_use]
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Frames in display order.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` if there is nothing to play.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
