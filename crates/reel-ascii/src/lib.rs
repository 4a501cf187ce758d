//! Character-art conversion for termreel.
//!
//! Converts luminance grids into character frames.

pub mod encoder;

pub use encoder::{build_animation, encode, encode_all, encode_all_with};
