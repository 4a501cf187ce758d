//! Audio playback for termreel.
//!
//! Audio is never decoded here: a platform player runs as an independent OS
//! process, and the [`handle::AudioHandle`] guarantees it is terminated.

pub mod error;
pub mod handle;
pub mod launcher;

pub use error::AudioError;
pub use handle::{AudioHandle, AudioProcess};
pub use launcher::{
    AudioLauncher, CommandLauncher, SilentLauncher, launcher_from_settings, platform_launcher,
};
