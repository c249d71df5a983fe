// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)]
// Duplicate match arms

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::vec_box)] // Avoids using `Vec<Box<T>>` when unnecessary
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![deny(missing_docs)] // Documentation is a must for release
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # AudioFeatures
//!
//! Spectral and rhythmic feature extraction for mono audio: frequency-scale
//! conversions, the short-time Fourier transform, mel filterbanks and
//! spectrograms, MFCCs, onset strength envelopes and global tempo estimation.
//!
//! ## Overview
//!
//! Every stage is a pure function of its inputs and an explicit configuration
//! struct. Nothing is cached between calls and no global state exists, so
//! independent analyses can run concurrently. Numeric kernels (FFT, DCT,
//! matrix products) are implemented in this crate with fixed accumulation
//! order, so results do not depend on the host's linear-algebra backend.
//!
//! ## Features
//!
//! - `parallel`: computes STFT frames on the rayon thread pool. Results are
//!   identical to the sequential path.
//!
//! ## Error Handling
//!
//! All fallible operations return [`AudioFeatureResult`]:
//!
//! ```rust
//! use audio_features::{AudioFeatureError, StftConfig};
//!
//! let config = StftConfig::with_sizes(1024, 0);
//! match config.validate() {
//!     Err(AudioFeatureError::InvalidConfig { parameter, .. }) => assert_eq!(parameter, "hop_length"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```
//!
//! Degenerate but valid inputs are not errors: silence produces an all-zero
//! onset envelope and the tempo prior's mode, and mel bands too narrow to
//! contain an FFT bin produce zero rows (with a `tracing` warning).
//!
//! ## Logging
//!
//! Stages emit `tracing` events (`debug` for parameters and shapes, `warn`
//! for degenerate inputs). The library never installs a subscriber.
//!
//! ## Quick Start
//!
//! ```rust
//! use audio_features::{
//!     AudioFeatures, MfccConfig, OnsetConfig, SampleBuffer, TempoConfig, impulse_train,
//! };
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let samples = impulse_train(120.0, Duration::from_secs(10), 22050, 1.0)?;
//! let buffer = SampleBuffer::new(&samples, 22050)?;
//!
//! let mfcc = buffer.mfcc(&MfccConfig::new())?;
//! assert_eq!(mfcc.nrows(), 20);
//!
//! let estimate = buffer.tempo(&OnsetConfig::new(), &TempoConfig::new())?;
//! assert!((estimate.bpm - 120.0).abs() < 6.0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod error;
pub mod fixtures;
pub mod numeric;
pub mod operations;
mod repr;
pub mod traits;
pub mod utils;

pub use crate::error::{AudioFeatureError, AudioFeatureResult};
pub use crate::operations::{
    AudioFeatures, DbConfig, Detrend, MelConfig, MelFilterbank, MelNorm, MelSpectrogram,
    MfccConfig, OnsetConfig, PadMode, Spectrogram, SpectrogramOutput, SpectrogramValues,
    StftConfig, TempoCandidate, TempoConfig, TempoEstimate, WindowType,
};
pub use crate::repr::SampleBuffer;
pub use crate::traits::AudioSample;
pub use crate::utils::audio_math::{
    MelScale, fft_frequencies, frames_to_time, hz_to_mel, hz_to_mel_array, hz_to_midi,
    hz_to_midi_array, hz_to_note, mel_frequencies, mel_to_hz, mel_to_hz_array, midi_to_hz,
    note_to_hz, time_to_frames,
};
pub use crate::utils::generation::{
    ToneComponent, click_train, compound_tone, impulse, impulse_train, silence, sine_wave,
};
