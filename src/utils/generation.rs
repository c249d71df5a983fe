//! Synthetic test signals.
//!
//! These produce the signals used to exercise and benchmark the analysis
//! stages: pure and compound tones, single impulses, impulse and click trains
//! at a given tempo, and silence. All generators return `f64` samples in
//! [-1, 1] that can be wrapped in a [`SampleBuffer`](crate::SampleBuffer).

use crate::{AudioFeatureError, AudioFeatureResult};
use std::f64::consts::PI;
use std::time::Duration;

fn sample_count(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * f64::from(sample_rate)) as usize
}

/// Generates a sine wave.
///
/// # Arguments
/// * `frequency` - Frequency of the sine wave in Hz
/// * `duration` - Duration of the signal
/// * `sample_rate` - Sample rate in Hz
/// * `amplitude` - Peak amplitude
pub fn sine_wave(frequency: f64, duration: Duration, sample_rate: u32, amplitude: f64) -> Vec<f64> {
    let sr = f64::from(sample_rate);
    let omega = 2.0 * PI * frequency;
    (0..sample_count(duration, sample_rate))
        .map(|i| amplitude * (omega * i as f64 / sr).sin())
        .collect()
}

/// A component of a compound tone, specifying frequency and relative amplitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneComponent {
    /// Frequency in Hz
    pub frequency: f64,
    /// Relative amplitude (typically 0.0 to 1.0)
    pub amplitude: f64,
}

impl ToneComponent {
    /// Creates a new tone component.
    pub const fn new(frequency: f64, amplitude: f64) -> Self {
        Self {
            frequency,
            amplitude,
        }
    }
}

/// Sum of sine components, e.g. a fundamental and its harmonics.
pub fn compound_tone(components: &[ToneComponent], duration: Duration, sample_rate: u32) -> Vec<f64> {
    let sr = f64::from(sample_rate);
    (0..sample_count(duration, sample_rate))
        .map(|i| {
            let t = i as f64 / sr;
            components
                .iter()
                .map(|c| c.amplitude * (2.0 * PI * c.frequency * t).sin())
                .sum()
        })
        .collect()
}

/// A single impulse of `amplitude` at `position` seconds; zero elsewhere.
pub fn impulse(duration: Duration, sample_rate: u32, amplitude: f64, position: f64) -> Vec<f64> {
    let n = sample_count(duration, sample_rate);
    let mut samples = vec![0.0; n];
    let index = (position.max(0.0) * f64::from(sample_rate)) as usize;
    if index < n {
        samples[index] = amplitude;
    }
    samples
}

fn beat_positions(bpm: f64, n_samples: usize, sample_rate: u32) -> AudioFeatureResult<Vec<usize>> {
    if !(bpm > 0.0) || !bpm.is_finite() {
        return Err(AudioFeatureError::invalid_config(
            "bpm",
            "must be a positive tempo",
        ));
    }
    let period = 60.0 / bpm * f64::from(sample_rate);
    Ok((0u64..)
        .map(|k| (k as f64 * period).round() as usize)
        .take_while(|&i| i < n_samples)
        .collect())
}

/// Single-sample impulses of `amplitude` every `60 / bpm` seconds, starting at 0.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `bpm` is not a positive, finite tempo.
pub fn impulse_train(
    bpm: f64,
    duration: Duration,
    sample_rate: u32,
    amplitude: f64,
) -> AudioFeatureResult<Vec<f64>> {
    let n = sample_count(duration, sample_rate);
    let mut samples = vec![0.0; n];
    for i in beat_positions(bpm, n, sample_rate)? {
        samples[i] = amplitude;
    }
    Ok(samples)
}

/// Hann-windowed tone bursts every `60 / bpm` seconds, starting at 0.
///
/// Each click is a `click_frequency` Hz sine of length `click_duration`
/// shaped by a Hann envelope. Clicks that would run past the end are truncated.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `bpm` is not a positive,
/// finite tempo or the click is shorter than two samples.
pub fn click_train(
    bpm: f64,
    duration: Duration,
    sample_rate: u32,
    click_frequency: f64,
    click_duration: Duration,
) -> AudioFeatureResult<Vec<f64>> {
    let click_len = sample_count(click_duration, sample_rate);
    if click_len < 2 {
        return Err(AudioFeatureError::invalid_config(
            "click_duration",
            "must span at least two samples",
        ));
    }
    let sr = f64::from(sample_rate);
    let click: Vec<f64> = (0..click_len)
        .map(|i| {
            let envelope = 0.5 - 0.5 * (2.0 * PI * i as f64 / (click_len - 1) as f64).cos();
            envelope * (2.0 * PI * click_frequency * i as f64 / sr).sin()
        })
        .collect();

    let n = sample_count(duration, sample_rate);
    let mut samples = vec![0.0; n];
    for start in beat_positions(bpm, n, sample_rate)? {
        for (out, &c) in samples[start..].iter_mut().zip(click.iter()) {
            *out += c;
        }
    }
    Ok(samples)
}

/// All-zero signal.
pub fn silence(duration: Duration, sample_rate: u32) -> Vec<f64> {
    vec![0.0; sample_count(duration, sample_rate)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_wave() {
        let samples = sine_wave(1000.0, Duration::from_millis(10), 44100, 0.5);
        assert_eq!(samples.len(), 441);
        assert!(samples.iter().all(|&s| s.abs() <= 0.5));
        // Quarter period of 1 kHz at 44.1 kHz is ~11 samples
        assert!(samples[11] > 0.49);
    }

    #[test]
    fn test_compound_tone() {
        let components = [ToneComponent::new(100.0, 1.0), ToneComponent::new(200.0, 0.5)];
        let samples = compound_tone(&components, Duration::from_secs(1), 8000);
        assert_eq!(samples.len(), 8000);
        let t = 20.0 / 8000.0;
        let expected = (2.0 * PI * 100.0 * t).sin() + 0.5 * (2.0 * PI * 200.0 * t).sin();
        assert!((samples[20] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_impulse() {
        let samples = impulse(Duration::from_secs(1), 1000, 0.8, 0.25);
        assert_eq!(samples[250], 0.8);
        assert_eq!(samples.iter().filter(|&&s| s != 0.0).count(), 1);
        // Out-of-range positions leave the signal silent
        assert!(impulse(Duration::from_secs(1), 1000, 1.0, 2.0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_impulse_train_spacing() {
        let samples = impulse_train(120.0, Duration::from_secs(2), 22050, 1.0).unwrap();
        let positions: Vec<usize> = samples
            .iter()
            .enumerate()
            .filter(|(_, s)| **s != 0.0)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(positions, vec![0, 11025, 22050, 33075]);

        assert!(impulse_train(0.0, Duration::from_secs(1), 22050, 1.0).is_err());
        assert!(impulse_train(f64::NAN, Duration::from_secs(1), 22050, 1.0).is_err());
    }

    #[test]
    fn test_click_train() {
        let samples = click_train(
            60.0,
            Duration::from_secs(3),
            16000,
            1000.0,
            Duration::from_millis(10),
        )
        .unwrap();
        assert_eq!(samples.len(), 48000);
        // Each click is 160 samples; the gaps between them are silent
        assert!(samples[200..16000].iter().all(|&s| s == 0.0));
        assert!(samples[16000..16160].iter().any(|&s| s.abs() > 0.5));
        assert!(samples.iter().all(|&s| s.abs() <= 1.0));

        assert!(click_train(60.0, Duration::from_secs(1), 16000, 1000.0, Duration::ZERO).is_err());
    }

    #[test]
    fn test_silence() {
        let samples = silence(Duration::from_millis(500), 48000);
        assert_eq!(samples.len(), 24000);
        assert!(samples.iter().all(|&s| s == 0.0));
    }
}
