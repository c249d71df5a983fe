//! Entry-point trait for feature extraction on sample buffers.
//!
//! Every method converts the buffer to normalized `f64` once, validates its
//! configuration and delegates to the free function of the same name in the
//! stage's module. The free functions remain available for callers that
//! already hold `f64` samples or intermediate representations.

use super::filterbank::{self, MelSpectrogram};
use super::tempo::{self, TempoEstimate};
use super::transforms::{self, Spectrogram};
use super::types::{MelConfig, MfccConfig, OnsetConfig, StftConfig, TempoConfig};
use super::{mfcc, onset_detection};
use crate::repr::SampleBuffer;
use crate::traits::AudioSample;
use crate::AudioFeatureResult;
use ndarray::{Array1, Array2};

/// Spectral and rhythmic feature extraction.
///
/// Implemented for [`SampleBuffer`], so any supported sample format can be
/// analysed directly.
///
/// ```rust
/// use audio_features::{AudioFeatures, MfccConfig, SampleBuffer};
///
/// let samples = vec![0.0f32; 22050];
/// let buffer = SampleBuffer::new(&samples, 22050).unwrap();
/// let mfcc = buffer.mfcc(&MfccConfig::new()).unwrap();
/// assert_eq!(mfcc.dim(), (20, 44));
/// ```
pub trait AudioFeatures {
    /// Short-time Fourier transform.
    ///
    /// # Errors
    /// Fails on invalid configuration or if the buffer is shorter than `n_fft`.
    fn stft(&self, config: &StftConfig) -> AudioFeatureResult<Spectrogram>;

    /// Mel power spectrogram, `(n_mels, n_frames)`.
    ///
    /// # Errors
    /// Fails on invalid configuration or if the buffer is shorter than `n_fft`.
    fn mel_spectrogram(&self, stft: &StftConfig, mel: &MelConfig) -> AudioFeatureResult<MelSpectrogram>;

    /// Mel-frequency cepstral coefficients, `(n_mfcc, n_frames)`.
    ///
    /// # Errors
    /// Fails on invalid configuration (including `n_mfcc > n_mels`) or if the
    /// buffer is shorter than `n_fft`.
    fn mfcc(&self, config: &MfccConfig) -> AudioFeatureResult<Array2<f64>>;

    /// Onset strength envelope, one value per frame.
    ///
    /// # Errors
    /// Fails on invalid configuration or if the buffer is shorter than `n_fft`.
    fn onset_strength(&self, config: &OnsetConfig) -> AudioFeatureResult<Array1<f64>>;

    /// Onset strength per group of adjacent mel bands, `(n_groups, n_frames)`.
    ///
    /// # Errors
    /// Fails on invalid configuration or if the buffer is shorter than `n_fft`.
    fn onset_strength_multi(&self, config: &OnsetConfig, n_groups: usize) -> AudioFeatureResult<Array2<f64>>;

    /// Global tempo estimate.
    ///
    /// # Errors
    /// Fails on invalid configuration or if the buffer is shorter than `n_fft`.
    /// Silence is not an error; it yields `tempo.start_bpm`.
    fn tempo(&self, onset: &OnsetConfig, tempo: &TempoConfig) -> AudioFeatureResult<TempoEstimate>;
}

impl<T: AudioSample> AudioFeatures for SampleBuffer<'_, T> {
    fn stft(&self, config: &StftConfig) -> AudioFeatureResult<Spectrogram> {
        transforms::stft(&self.normalized_samples(), self.sample_rate_hz(), config)
    }

    fn mel_spectrogram(&self, stft: &StftConfig, mel: &MelConfig) -> AudioFeatureResult<MelSpectrogram> {
        filterbank::mel_spectrogram(&self.normalized_samples(), self.sample_rate_hz(), stft, mel)
    }

    fn mfcc(&self, config: &MfccConfig) -> AudioFeatureResult<Array2<f64>> {
        mfcc::mfcc(&self.normalized_samples(), self.sample_rate_hz(), config)
    }

    fn onset_strength(&self, config: &OnsetConfig) -> AudioFeatureResult<Array1<f64>> {
        onset_detection::onset_strength(&self.normalized_samples(), self.sample_rate_hz(), config)
    }

    fn onset_strength_multi(&self, config: &OnsetConfig, n_groups: usize) -> AudioFeatureResult<Array2<f64>> {
        onset_detection::onset_strength_multi(
            &self.normalized_samples(),
            self.sample_rate_hz(),
            config,
            n_groups,
        )
    }

    fn tempo(&self, onset_config: &OnsetConfig, tempo_config: &TempoConfig) -> AudioFeatureResult<TempoEstimate> {
        tempo::tempo(
            &self.normalized_samples(),
            self.sample_rate_hz(),
            onset_config,
            tempo_config,
        )
    }
}
