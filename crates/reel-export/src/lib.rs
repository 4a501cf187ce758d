//! Durable storage of encoded animations.
//!
//! An animation is written as a small versioned JSON document next to its
//! audio track, so that `termreel play` never needs the source video again.

pub mod store;

pub use store::{FORMAT_VERSION, StoreError, load, save};
