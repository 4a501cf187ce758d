use std::path::PathBuf;

use reel_core::error::CoreError;
use thiserror::Error;

/// Errors originating from the audio module.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The audio track does not exist.
    #[error("Piste audio introuvable : {}", .0.display())]
    TrackNotFound(PathBuf),

    /// The player executable could not be started.
    #[error("Impossible de lancer le lecteur audio {program}")]
    Spawn {
        /// Executable name.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The player exited with a failure before being stopped.
    #[error(transparent)]
    Player(#[from] CoreError),

    /// Signalling or awaiting the player failed.
    #[error("Erreur d'arrêt du lecteur audio : {0}")]
    Io(#[from] std::io::Error),
}
