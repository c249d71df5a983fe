//! Mel-frequency cepstral coefficients.
//!
//! The pipeline is power STFT, mel projection, decibel compression and an
//! orthonormal DCT-II along the band axis, keeping the first `n_mfcc`
//! coefficients of every frame. Optional sinusoidal liftering rescales the
//! coefficients afterwards.

use super::filterbank::MelFilterbank;
use super::transforms::{power_spectrogram, power_to_db};
use super::types::MfccConfig;
use crate::numeric::{dct_ii_matrix, linalg};
use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::f64::consts::PI;
use tracing::debug;

/// Computes MFCCs of `samples`, returning an `(n_mfcc, n_frames)` matrix.
///
/// # Errors
/// - [`AudioFeatureError::InvalidConfig`] for invalid parameters, including
///   `n_mfcc > n_mels`.
/// - [`AudioFeatureError::InsufficientSamples`] if `samples` is shorter than `n_fft`.
pub fn mfcc(samples: &[f64], sample_rate: f64, config: &MfccConfig) -> AudioFeatureResult<Array2<f64>> {
    config.validate()?;
    config.stft.validate()?;
    let bank = MelFilterbank::new(sample_rate, config.stft.n_fft, &config.mel)?;
    let power = power_spectrogram(samples, &config.stft)?;
    mfcc_with_bank(&bank, power.view(), config)
}

/// Computes MFCCs from an existing `(n_fft / 2 + 1, n_frames)` power spectrogram
/// computed with `config.stft.n_fft`.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] for invalid parameters and
/// [`AudioFeatureError::DimensionMismatch`] if the spectrogram does not match `n_fft`.
pub fn mfcc_from_power(
    power: ArrayView2<'_, f64>,
    sample_rate: f64,
    config: &MfccConfig,
) -> AudioFeatureResult<Array2<f64>> {
    config.validate()?;
    let bank = MelFilterbank::new(sample_rate, config.stft.n_fft, &config.mel)?;
    mfcc_with_bank(&bank, power, config)
}

fn mfcc_with_bank(
    bank: &MelFilterbank,
    power: ArrayView2<'_, f64>,
    config: &MfccConfig,
) -> AudioFeatureResult<Array2<f64>> {
    let mel_power = bank.apply(power)?;
    let mel_db = power_to_db(mel_power.view(), &config.db)?;
    debug!(
        n_mfcc = config.n_mfcc,
        n_mels = config.mel.n_mels,
        n_frames = mel_db.ncols(),
        lifter = config.lifter,
        "computing MFCCs"
    );
    mfcc_from_log_mel(mel_db.view(), config.n_mfcc, config.lifter)
}

/// Applies the DCT-II to a `(n_mels, n_frames)` log-mel matrix, keeping the
/// first `n_mfcc` coefficients, then lifters them if `lifter > 0`.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `n_mfcc` is zero or exceeds
/// the band count, or `lifter` is negative.
pub fn mfcc_from_log_mel(
    log_mel: ArrayView2<'_, f64>,
    n_mfcc: usize,
    lifter: f64,
) -> AudioFeatureResult<Array2<f64>> {
    if !(lifter >= 0.0) {
        return Err(AudioFeatureError::invalid_config(
            "lifter",
            "must be non-negative",
        ));
    }
    let basis = dct_ii_matrix(n_mfcc, log_mel.nrows())?;
    let mut coefficients = linalg::matmul(basis.view(), log_mel)?;
    if lifter > 0.0 {
        let weights = lifter_weights(n_mfcc, lifter);
        for (mut row, &w) in coefficients.axis_iter_mut(Axis(0)).zip(weights.iter()) {
            row *= w;
        }
    }
    Ok(coefficients)
}

/// Sinusoidal lifter gains `1 + (L / 2) * sin(pi * k / L)` for `k = 1..=n`.
pub fn lifter_weights(n_mfcc: usize, lifter: f64) -> Array1<f64> {
    Array1::from_shape_fn(n_mfcc, |i| {
        1.0 + 0.5 * lifter * (PI * (i + 1) as f64 / lifter).sin()
    })
}

/// Approximately inverts [`mfcc`], returning mel power `(n_mels, n_frames)`.
///
/// Liftering is undone, the coefficients are taken back to decibels with a
/// DCT-III (missing high-order coefficients are zero) and converted to power
/// relative to `config.db.reference`. Decibel clipping is not recoverable.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] for invalid parameters, or if a
/// lifter gain is zero, and [`AudioFeatureError::DimensionMismatch`] if
/// `coefficients` has more rows than `n_mels`.
pub fn mfcc_to_mel(coefficients: ArrayView2<'_, f64>, config: &MfccConfig) -> AudioFeatureResult<Array2<f64>> {
    let n_mfcc = coefficients.nrows();
    let n_mels = config.mel.n_mels;
    if n_mfcc > n_mels {
        return Err(AudioFeatureError::DimensionMismatch(format!(
            "{n_mfcc} coefficients cannot be inverted to {n_mels} bands"
        )));
    }

    let mut unlifted = coefficients.to_owned();
    if config.lifter > 0.0 {
        let weights = lifter_weights(n_mfcc, config.lifter);
        if weights.iter().any(|&w| w.abs() < f64::EPSILON) {
            return Err(AudioFeatureError::invalid_config(
                "lifter",
                "produces a zero gain and cannot be inverted",
            ));
        }
        for (mut row, &w) in unlifted.axis_iter_mut(Axis(0)).zip(weights.iter()) {
            row /= w;
        }
    }

    let basis = dct_ii_matrix(n_mfcc, n_mels)?;
    let log_mel = linalg::matmul(basis.t(), unlifted.view())?;
    let reference = config.db.reference;
    Ok(log_mel.mapv(|db| reference * 10f64.powf(db / 10.0)))
}

/// Regression (delta) features along the time axis.
///
/// `delta[t] = sum_{n=1..N} n * (x[t+n] - x[t-n]) / (2 * sum_{n=1..N} n^2)`
/// with `N = width / 2`; frames beyond either end repeat the edge frame.
/// `order = 2` returns the delta of the delta, and so on.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `width` is even or below 3,
/// or `order` is zero.
pub fn delta(features: ArrayView2<'_, f64>, width: usize, order: usize) -> AudioFeatureResult<Array2<f64>> {
    if width < 3 || width % 2 == 0 {
        return Err(AudioFeatureError::invalid_config(
            "width",
            "must be an odd number of frames, at least 3",
        ));
    }
    if order == 0 {
        return Err(AudioFeatureError::invalid_config(
            "order",
            "must be at least 1",
        ));
    }

    let mut current = features.to_owned();
    for _ in 0..order {
        current = delta_once(current.view(), width / 2);
    }
    Ok(current)
}

fn delta_once(features: ArrayView2<'_, f64>, half_width: usize) -> Array2<f64> {
    let n_frames = features.ncols();
    let mut out = Array2::zeros(features.dim());
    if n_frames == 0 {
        return out;
    }
    let denominator = 2.0 * (1..=half_width).map(|n| (n * n) as f64).sum::<f64>();
    let last = n_frames - 1;
    for (mut out_row, row) in out.rows_mut().into_iter().zip(features.rows()) {
        for t in 0..n_frames {
            let mut acc = 0.0;
            for n in 1..=half_width {
                let ahead = row[(t + n).min(last)];
                let behind = row[t.saturating_sub(n)];
                acc += n as f64 * (ahead - behind);
            }
            out_row[t] = acc / denominator;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::types::{DbConfig, StftConfig};
    use crate::utils::audio_math::MelScale;
    use crate::operations::filterbank::mel_spectrogram;
    use ndarray::array;

    fn tone_with_harmonics(sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let t = i as f64 / sample_rate;
                (2.0 * PI * 220.0 * t).sin()
                    + 0.5 * (2.0 * PI * 660.0 * t).sin()
                    + 0.25 * (2.0 * PI * 1320.0 * t).sin()
            })
            .collect()
    }

    #[test]
    fn test_mfcc_shape_matches_stft_frames() {
        let samples = tone_with_harmonics(22050.0, 22050);
        let config = MfccConfig::new();
        let coefficients = mfcc(&samples, 22050.0, &config).unwrap();
        assert_eq!(coefficients.dim(), (20, config.stft.n_frames(samples.len())));
        assert!(coefficients.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_too_many_coefficients_rejected() {
        let samples = vec![0.1; 4096];
        let config = MfccConfig::with_counts(41, 40);
        assert!(matches!(
            mfcc(&samples, 22050.0, &config),
            Err(AudioFeatureError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_mel_config_checked_before_length() {
        let mut config = MfccConfig::new();
        config.mel.fmax = Some(20000.0);
        assert!(matches!(
            mfcc(&[0.1; 100], 22050.0, &config),
            Err(AudioFeatureError::InvalidConfig { ref parameter, .. }) if parameter == "fmax"
        ));

        // Too many bands for the FFT size is also a configuration error
        let mut config = MfccConfig::with_counts(13, 128);
        config.stft = StftConfig::with_sizes(128, 64);
        assert!(matches!(
            mfcc(&[0.1; 10], 22050.0, &config),
            Err(AudioFeatureError::InvalidConfig { ref parameter, .. }) if parameter == "n_mels"
        ));

        // A valid configuration still reports the short buffer
        assert!(matches!(
            mfcc(&[0.1; 100], 22050.0, &MfccConfig::new()),
            Err(AudioFeatureError::InsufficientSamples { required: 2048, actual: 100 })
        ));
    }

    #[test]
    fn test_silence_gives_only_dc_coefficient() {
        let samples = vec![0.0; 8192];
        let config = MfccConfig::with_counts(13, 40);
        let coefficients = mfcc(&samples, 16000.0, &config).unwrap();
        // Every band sits at the -100 dB floor
        let expected_c0 = -100.0 * 40f64.sqrt();
        for frame in coefficients.columns() {
            assert!((frame[0] - expected_c0).abs() < 1e-9);
            assert!(frame.iter().skip(1).all(|c| c.abs() < 1e-9));
        }
    }

    #[test]
    fn test_dct_of_small_log_mel() {
        let log_mel = array![[1.0], [2.0], [3.0], [4.0]];
        let coefficients = mfcc_from_log_mel(log_mel.view(), 2, 0.0).unwrap();
        assert!((coefficients[[0, 0]] - 5.0).abs() < 1e-12);
        // sqrt(1/2) * sum x[n] cos(pi (2n+1) / 8)
        let expected: f64 = (0..4)
            .map(|n| (n + 1) as f64 * (PI * (2 * n + 1) as f64 / 8.0).cos())
            .sum::<f64>()
            * 0.5f64.sqrt();
        assert!((coefficients[[1, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_lifter_scales_rows() {
        let log_mel = Array2::from_shape_fn((8, 3), |(i, j)| (i * 3 + j) as f64 * 0.1 - 1.0);
        let plain = mfcc_from_log_mel(log_mel.view(), 6, 0.0).unwrap();
        let lifted = mfcc_from_log_mel(log_mel.view(), 6, 22.0).unwrap();
        let weights = lifter_weights(6, 22.0);
        for ((k, t), &value) in lifted.indexed_iter() {
            assert!((value - plain[[k, t]] * weights[k]).abs() < 1e-12);
        }
        assert!(weights.iter().all(|&w| w > 1.0));
    }

    #[test]
    fn test_mfcc_to_mel_inverts_full_cepstrum() {
        let sample_rate = 16000.0;
        let samples = tone_with_harmonics(sample_rate, 16000);
        let mut config = MfccConfig::with_counts(32, 32);
        config.stft = StftConfig::with_sizes(512, 256);
        config.mel = crate::operations::types::MelConfig::with_scale(32, MelScale::Slaney);
        config.db = DbConfig::unclipped();
        config.lifter = 10.0;

        let coefficients = mfcc(&samples, sample_rate, &config).unwrap();
        let restored = mfcc_to_mel(coefficients.view(), &config).unwrap();
        let reference = mel_spectrogram(&samples, sample_rate, &config.stft, &config.mel).unwrap();

        assert_eq!(restored.dim(), reference.power().dim());
        for (&r, &m) in restored.iter().zip(reference.power().iter()) {
            let m = m.max(config.db.amin);
            assert!((r - m).abs() <= 1e-6 * m, "{r} vs {m}");
        }
    }

    #[test]
    fn test_mfcc_to_mel_rejects_oversized_input() {
        let coefficients = Array2::zeros((50, 2));
        assert!(mfcc_to_mel(coefficients.view(), &MfccConfig::with_counts(20, 40)).is_err());
    }

    #[test]
    fn test_delta_of_ramp_and_constant() {
        let ramp = Array2::from_shape_fn((2, 10), |(i, t)| if i == 0 { 2.0 * t as f64 } else { 7.0 });
        let d = delta(ramp.view(), 5, 1).unwrap();
        // Interior frames see the exact slope
        for t in 2..8 {
            assert!((d[[0, t]] - 2.0).abs() < 1e-12);
        }
        assert!(d.row(1).iter().all(|&x| x.abs() < 1e-12));

        let dd = delta(ramp.view(), 5, 2).unwrap();
        assert!(dd[[0, 5]].abs() < 1e-12);

        assert!(delta(ramp.view(), 4, 1).is_err());
        assert!(delta(ramp.view(), 1, 1).is_err());
        assert!(delta(ramp.view(), 3, 0).is_err());
    }
}
