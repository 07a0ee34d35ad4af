//! Audio system for playing sound cues
//!
//! Built on top of the rodio audio library.
//! Supports WAV, MP3, OGG, and FLAC formats.

mod bank;

pub use bank::{AudioError, CueBank};
