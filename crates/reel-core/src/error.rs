use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Frame rate is zero, negative, non-finite or too small to yield a finite interval.
    #[error("Fréquence d'images invalide : {0} (doit être > 0)")]
    InvalidFrameRate(f64),

    /// Glyph ramp contains no character.
    #[error("Rampe de glyphes vide")]
    EmptyRamp,

    /// Luminance value outside [0, 255].
    #[error("Luminance hors bornes : {0} (attendu 0..=255)")]
    LuminanceOutOfRange(i64),

    /// Grid or frame dimensions are zero or inconsistent.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: usize,
        /// Height value.
        height: usize,
    },

    /// A frame row does not have the same length as the first row.
    #[error("Frame irrégulière : ligne {row} de {len} caractères, attendu {expected}")]
    RaggedFrame {
        /// Index of the offending row.
        row: usize,
        /// Its length in characters.
        len: usize,
        /// Length of the first row.
        expected: usize,
    },

    /// An external program (transcoder, audio player) exited with a failure.
    #[error("{program} a échoué ({status}) : {stderr}")]
    ExternalProcess {
        /// Executable name.
        program: String,
        /// Exit status as reported by the OS.
        status: String,
        /// Captured diagnostic output.
        stderr: String,
    },

    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),
}
