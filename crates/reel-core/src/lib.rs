//! Shared types for termreel: glyph ramps, luminance grids, frames,
//! animations, frame pacing, errors and configuration.
//!
//! Every other crate of the workspace builds on these types.

pub mod charset;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;

pub use charset::GlyphRamp;
pub use clock::{Pacer, frame_interval};
pub use config::AppConfig;
pub use error::CoreError;
pub use frame::{Animation, Frame, LuminanceGrid};
