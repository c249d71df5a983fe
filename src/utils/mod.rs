//! Utility functions shared by the analysis stages.
//!
//! # Modules
//!
//! - [`audio_math`] - Mel/MIDI/note conversions and frequency grids
//! - [`generation`] - Synthetic test signals

pub mod audio_math;
pub mod generation;

pub use audio_math::*;
pub use generation::*;
