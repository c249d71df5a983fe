//! Borrowed sample buffer handed to every analysis entry point.

use crate::traits::AudioSample;
use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::Array1;
use std::num::NonZeroU32;

/// An immutable view over caller-owned mono samples plus their sample rate.
///
/// The buffer never copies or retains the samples beyond the borrow; each
/// analysis call converts what it needs into its own `f64` working storage.
#[derive(Debug, Clone, Copy)]
pub struct SampleBuffer<'a, T: AudioSample = f32> {
    samples: &'a [T],
    sample_rate: NonZeroU32,
}

impl<'a, T: AudioSample> SampleBuffer<'a, T> {
    /// Wraps `samples` recorded at `sample_rate` Hz.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] if `sample_rate` is zero.
    pub fn new(samples: &'a [T], sample_rate: u32) -> AudioFeatureResult<Self> {
        let sample_rate = NonZeroU32::new(sample_rate).ok_or_else(|| {
            AudioFeatureError::invalid_config("sample_rate", "must be greater than 0")
        })?;
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// The borrowed samples.
    pub const fn samples(&self) -> &'a [T] {
        self.samples
    }

    /// Sample rate in Hz.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate.get()
    }

    /// Sample rate in Hz as `f64`, the form every analysis stage uses.
    pub fn sample_rate_hz(&self) -> f64 {
        f64::from(self.sample_rate.get())
    }

    /// Number of samples in the buffer.
    pub const fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the buffer holds no samples.
    pub const fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration of the buffer in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / f64::from(self.sample_rate.get())
    }

    /// Normalized `f64` copy of the samples.
    pub fn to_f64(&self) -> Array1<f64> {
        Array1::from_vec(self.normalized_samples())
    }

    /// Normalized `f64` copy of the samples as a plain vector.
    pub fn normalized_samples(&self) -> Vec<f64> {
        self.samples
            .iter()
            .map(|&s| s.to_f64_normalized())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sample_rate_is_rejected() {
        let data = [0.0f32; 16];
        let err = SampleBuffer::new(&data, 0).unwrap_err();
        assert!(matches!(err, AudioFeatureError::InvalidConfig { .. }));
    }

    #[test]
    fn test_buffer_metadata() {
        let data = vec![0i16; 22050];
        let buffer = SampleBuffer::new(&data, 22050).unwrap();
        assert_eq!(buffer.len(), 22050);
        assert_eq!(buffer.sample_rate(), 22050);
        assert!((buffer.duration_seconds() - 1.0).abs() < 1e-12);
        assert!(buffer.to_f64().iter().all(|&x| x == 0.0));
    }
}
