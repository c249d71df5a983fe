//! Onset strength (novelty) envelopes.
//!
//! The envelope measures how much the log-mel spectrum grows from one frame
//! to the next:
//!
//! `env[t] = (1 / n_mels) * sum_b max(0, S[b, t] - S[b, t - lag])`
//!
//! where `S` is the decibel mel spectrogram. Averaging over bands keeps the
//! envelope's scale independent of the band count, so maxima are comparable
//! across configurations; the envelope is never renormalized per frame. The
//! first `lag` frames have no predecessor and are zero.

use super::filterbank::{MelSpectrogram, mel_spectrogram};
use super::types::{Detrend, OnsetConfig};
use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};
use std::ops::Range;
use tracing::{debug, trace};

/// Computes the onset strength envelope of `samples`, one value per STFT frame.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] for invalid parameters and
/// [`AudioFeatureError::InsufficientSamples`] if `samples` is shorter than `n_fft`.
pub fn onset_strength(
    samples: &[f64],
    sample_rate: f64,
    config: &OnsetConfig,
) -> AudioFeatureResult<Array1<f64>> {
    config.validate()?;
    let mel = mel_spectrogram(samples, sample_rate, &config.stft, &config.mel)?;
    onset_strength_from_mel(&mel, config)
}

/// Computes the onset strength envelope from a precomputed mel power spectrogram.
///
/// Only `lag`, `detrend` and `db` of `config` are used.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] for invalid parameters.
pub fn onset_strength_from_mel(
    mel: &MelSpectrogram,
    config: &OnsetConfig,
) -> AudioFeatureResult<Array1<f64>> {
    config.validate()?;
    let log_mel = mel.to_db(&config.db)?;
    debug!(
        n_mels = log_mel.nrows(),
        n_frames = log_mel.ncols(),
        lag = config.lag,
        detrend = ?config.detrend,
        "computing onset strength"
    );
    onset_strength_from_log_mel(log_mel.view(), config.lag, config.detrend)
}

/// Computes the onset strength envelope of a `(n_bands, n_frames)` log-power matrix.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `lag` is zero or a local
/// detrending window is zero.
pub fn onset_strength_from_log_mel(
    log_mel: ArrayView2<'_, f64>,
    lag: usize,
    detrend: Detrend,
) -> AudioFeatureResult<Array1<f64>> {
    if lag == 0 {
        return Err(AudioFeatureError::invalid_config(
            "lag",
            "must be at least 1 frame",
        ));
    }
    let mut envelope = rectified_flux(log_mel, lag);
    apply_detrend(&mut envelope, detrend)?;
    trace!(n_frames = envelope.len(), "onset envelope complete");
    Ok(envelope)
}

/// Computes one onset envelope per group of adjacent mel bands.
///
/// The bands are split into `n_groups` contiguous groups of `n_mels / n_groups`
/// bands; the last group also takes the remainder. Returns `(n_groups, n_frames)`.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `n_groups` is zero or
/// exceeds `n_mels`, plus the errors of [`onset_strength`].
pub fn onset_strength_multi(
    samples: &[f64],
    sample_rate: f64,
    config: &OnsetConfig,
    n_groups: usize,
) -> AudioFeatureResult<Array2<f64>> {
    config.validate()?;
    let groups = band_groups(config.mel.n_mels, n_groups)?;
    let mel = mel_spectrogram(samples, sample_rate, &config.stft, &config.mel)?;
    let log_mel = mel.to_db(&config.db)?;
    debug!(n_groups, n_frames = log_mel.ncols(), "computing per-group onset strength");

    let mut out = Array2::zeros((groups.len(), log_mel.ncols()));
    for (mut row, range) in out.axis_iter_mut(Axis(0)).zip(groups) {
        let group = log_mel.slice(s![range, ..]);
        row.assign(&onset_strength_from_log_mel(group, config.lag, config.detrend)?);
    }
    Ok(out)
}

/// Contiguous band ranges for [`onset_strength_multi`].
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `n_groups` is zero or
/// exceeds `n_bands`.
pub fn band_groups(n_bands: usize, n_groups: usize) -> AudioFeatureResult<Vec<Range<usize>>> {
    if n_groups == 0 || n_groups > n_bands {
        return Err(AudioFeatureError::invalid_config(
            "n_groups",
            format!("must be in 1..={n_bands}"),
        ));
    }
    let size = n_bands / n_groups;
    Ok((0..n_groups)
        .map(|g| {
            let start = g * size;
            let end = if g + 1 == n_groups { n_bands } else { start + size };
            start..end
        })
        .collect())
}

/// Unsigned spectral flux of a `(n_bins, n_frames)` magnitude spectrogram:
/// `flux[t] = sum_k |M[k, t] - M[k, t - lag]|`, zero for the first `lag` frames.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `lag` is zero.
pub fn spectral_flux(magnitude: ArrayView2<'_, f64>, lag: usize) -> AudioFeatureResult<Array1<f64>> {
    if lag == 0 {
        return Err(AudioFeatureError::invalid_config(
            "lag",
            "must be at least 1 frame",
        ));
    }
    let n_frames = magnitude.ncols();
    let mut flux = Array1::zeros(n_frames);
    for t in lag..n_frames {
        let current = magnitude.column(t);
        let previous = magnitude.column(t - lag);
        flux[t] = current
            .iter()
            .zip(previous.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
    }
    Ok(flux)
}

fn rectified_flux(log_mel: ArrayView2<'_, f64>, lag: usize) -> Array1<f64> {
    let (n_bands, n_frames) = log_mel.dim();
    let mut envelope = Array1::zeros(n_frames);
    if n_bands == 0 {
        return envelope;
    }
    for t in lag..n_frames {
        let current = log_mel.column(t);
        let previous = log_mel.column(t - lag);
        let rise: f64 = current
            .iter()
            .zip(previous.iter())
            .map(|(a, b)| (a - b).max(0.0))
            .sum();
        envelope[t] = rise / n_bands as f64;
    }
    envelope
}

fn apply_detrend(envelope: &mut Array1<f64>, detrend: Detrend) -> AudioFeatureResult<()> {
    let floor = match detrend {
        Detrend::Off => return Ok(()),
        Detrend::Global => {
            let mean = envelope.mean().unwrap_or(0.0);
            Array1::from_elem(envelope.len(), mean)
        }
        Detrend::Local { window } => moving_average(envelope.view(), window)?,
    };
    envelope.zip_mut_with(&floor, |e, &f| *e = (*e - f).max(0.0));
    Ok(())
}

/// Centered moving average; the window shrinks at the edges.
fn moving_average(signal: ArrayView1<'_, f64>, window: usize) -> AudioFeatureResult<Array1<f64>> {
    if window == 0 {
        return Err(AudioFeatureError::invalid_config(
            "detrend.window",
            "must be at least 1 frame",
        ));
    }
    let len = signal.len();
    let half = window / 2;
    Ok(Array1::from_shape_fn(len, |i| {
        let start = i.saturating_sub(half);
        let end = (i + half + 1).min(len);
        signal.slice(s![start..end]).sum() / (end - start) as f64
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn clicks(sample_rate: f64, seconds: f64, interval: f64) -> Vec<f64> {
        let n = (sample_rate * seconds) as usize;
        let period = (sample_rate * interval) as usize;
        (0..n)
            .map(|i| if i % period < 64 { 1.0 - (i % period) as f64 / 64.0 } else { 0.0 })
            .collect()
    }

    #[test]
    fn test_flux_of_small_matrix() {
        let log_mel = array![[0.0, 1.0, 0.0], [0.0, 3.0, 5.0]];
        let env = onset_strength_from_log_mel(log_mel.view(), 1, Detrend::Off).unwrap();
        assert_eq!(env, array![0.0, 2.0, 1.0]);

        let env = onset_strength_from_log_mel(log_mel.view(), 2, Detrend::Off).unwrap();
        assert_eq!(env, array![0.0, 0.0, 2.5]);
    }

    #[test]
    fn test_envelope_non_negative_with_zero_prefix() {
        let samples = clicks(22050.0, 3.0, 0.5);
        for lag in [1, 3] {
            let mut config = OnsetConfig::new();
            config.lag = lag;
            let env = onset_strength(&samples, 22050.0, &config).unwrap();
            assert_eq!(env.len(), config.stft.n_frames(samples.len()));
            assert!(env.iter().all(|&x| x >= 0.0));
            assert!(env.iter().take(lag).all(|&x| x == 0.0));
            assert!(env.iter().any(|&x| x > 0.0));
        }
    }

    #[test]
    fn test_envelope_peaks_follow_clicks() {
        let sample_rate = 22050.0;
        let samples = clicks(sample_rate, 4.0, 0.5);
        let config = OnsetConfig::new();
        let env = onset_strength(&samples, sample_rate, &config).unwrap();

        // Click k starts at k * 0.5 s; the strongest rise lands within a couple of frames
        let frame_rate = sample_rate / config.stft.hop_length as f64;
        let max = env.iter().copied().fold(0.0, f64::max);
        for k in 1..7 {
            let expected = (k as f64 * 0.5 * frame_rate).round() as usize;
            let local = env
                .slice(s![expected.saturating_sub(3)..(expected + 4).min(env.len())])
                .iter()
                .copied()
                .fold(0.0, f64::max);
            assert!(local > 0.3 * max, "click {k}: {local} vs max {max}");
        }
    }

    #[test]
    fn test_silence_gives_zero_envelope() {
        let samples = vec![0.0; 22050];
        let env = onset_strength(&samples, 22050.0, &OnsetConfig::new()).unwrap();
        assert!(env.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_detrending() {
        let log_mel = array![[0.0, 2.0, 2.0, 6.0, 6.0, 8.0]];
        let raw = onset_strength_from_log_mel(log_mel.view(), 1, Detrend::Off).unwrap();
        assert_eq!(raw, array![0.0, 2.0, 0.0, 4.0, 0.0, 2.0]);

        let global = onset_strength_from_log_mel(log_mel.view(), 1, Detrend::Global).unwrap();
        // Mean is 4/3
        assert!((global[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((global[3] - 8.0 / 3.0).abs() < 1e-12);
        assert_eq!(global[2], 0.0);

        let local =
            onset_strength_from_log_mel(log_mel.view(), 1, Detrend::Local { window: 3 }).unwrap();
        // Frame 3: 4 - (0 + 4 + 0) / 3
        assert!((local[3] - 8.0 / 3.0).abs() < 1e-12);
        assert!(local.iter().all(|&x| x >= 0.0));
        assert_eq!(local[0], 0.0);
    }

    #[test]
    fn test_band_groups() {
        assert_eq!(band_groups(10, 3).unwrap(), vec![0..3, 3..6, 6..10]);
        assert_eq!(band_groups(4, 4).unwrap(), vec![0..1, 1..2, 2..3, 3..4]);
        assert!(band_groups(4, 0).is_err());
        assert!(band_groups(4, 5).is_err());
    }

    #[test]
    fn test_multi_band_envelopes_average_to_full_envelope() {
        let samples = clicks(16000.0, 2.0, 0.25);
        let mut config = OnsetConfig::with_hop_length(256);
        config.stft.n_fft = 1024;
        config.mel.n_mels = 64;
        let full = onset_strength(&samples, 16000.0, &config).unwrap();
        let multi = onset_strength_multi(&samples, 16000.0, &config, 4).unwrap();
        assert_eq!(multi.nrows(), 4);
        assert_eq!(multi.ncols(), full.len());
        let averaged = multi.mean_axis(Axis(0)).unwrap();
        for (a, b) in averaged.iter().zip(full.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_spectral_flux() {
        let magnitude = array![[1.0, 3.0, 2.0], [0.0, 0.5, 1.5]];
        let flux = spectral_flux(magnitude.view(), 1).unwrap();
        assert_eq!(flux, array![0.0, 2.5, 2.0]);
        assert!(spectral_flux(magnitude.view(), 0).is_err());
    }

    #[test]
    fn test_zero_lag_rejected() {
        let log_mel = array![[0.0, 1.0]];
        assert!(onset_strength_from_log_mel(log_mel.view(), 0, Detrend::Off).is_err());
        let mut config = OnsetConfig::new();
        config.lag = 0;
        assert!(onset_strength(&[0.0; 4096], 22050.0, &config).is_err());
    }
}
