//! Analysis stages and their configuration.
//!
//! Each stage lives in its own module and is exposed as free functions over
//! `f64` samples or intermediate matrices. The [`AudioFeatures`] trait offers
//! the same stages as methods on a [`SampleBuffer`](crate::SampleBuffer).
//!
//! ## Module Organization
//!
//! - [`types`] - Configuration structs and enums
//! - [`traits`] - The [`AudioFeatures`] entry-point trait
//! - [`transforms`] - Windows and the short-time Fourier transform
//! - [`filterbank`] - Mel filterbanks and mel spectrograms
//! - [`mfcc`] - Cepstral coefficients, liftering, deltas and inversion
//! - [`onset_detection`] - Onset strength envelopes and spectral flux
//! - [`tempo`] - Autocorrelation tempo estimation
//!
//! ## Quick Start
//!
//! ```rust
//! use audio_features::operations::*;
//! use audio_features::SampleBuffer;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let samples = vec![0.0f32; 44100];
//! let buffer = SampleBuffer::new(&samples, 44100)?;
//!
//! let mel = buffer.mel_spectrogram(&StftConfig::new(), &MelConfig::new())?;
//! let onsets = buffer.onset_strength(&OnsetConfig::new())?;
//! let estimate = buffer.tempo(&OnsetConfig::new(), &TempoConfig::new())?;
//! assert_eq!(mel.n_frames(), onsets.len());
//! assert_eq!(estimate.bpm, 120.0);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod traits;
pub mod types;

pub mod filterbank;
pub mod mfcc;
pub mod onset_detection;
pub mod tempo;
pub mod transforms;

pub use traits::AudioFeatures;

pub use types::{
    DbConfig, Detrend, MelConfig, MelNorm, MfccConfig, OnsetConfig, PadMode, SpectrogramOutput,
    StftConfig, TempoConfig, WindowType,
};

pub use filterbank::{MelFilterbank, MelSpectrogram, mel_spectrogram};
pub use mfcc::{delta, lifter_weights, mfcc, mfcc_from_log_mel, mfcc_from_power, mfcc_to_mel};
pub use onset_detection::{
    band_groups, onset_strength, onset_strength_from_log_mel, onset_strength_from_mel,
    onset_strength_multi, spectral_flux,
};
pub use tempo::{TempoCandidate, TempoEstimate, autocorrelate, estimate_tempo, tempo, tempo_prior};
pub use transforms::{
    Spectrogram, SpectrogramValues, generate_window, power_spectrogram, power_to_db, stft,
    stft_complex,
};
