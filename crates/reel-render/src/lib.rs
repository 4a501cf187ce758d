//! Terminal playback for termreel.
//!
//! [`player::Player`] draws an [`reel_core::Animation`] at its frame rate,
//! correcting drift against a monotonic clock, while an audio player runs
//! beside it. Every exit path stops the audio before returning.

pub mod error;
pub mod player;
pub mod signal;
pub mod stats;
mod terminal;

pub use error::PlaybackError;
pub use player::{PlaybackState, Player};
pub use signal::{StopHandle, StopSignal, stop_channel};
pub use stats::{PlaybackOutcome, PlaybackReport};
