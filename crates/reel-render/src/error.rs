use reel_audio::AudioError;
use thiserror::Error;

/// Errors originating from the playback engine.
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The animation's frame rate cannot be paced.
    #[error("Fréquence d'images invalide : {0} (doit être > 0)")]
    InvalidFrameRate(f64),

    /// The audio player could not be started, or failed on its own.
    #[error("Audio : {0}")]
    Audio(#[from] AudioError),

    /// Writing to the terminal failed.
    #[error("Erreur d'écriture terminal : {0}")]
    Io(#[from] std::io::Error),
}
