//! Mel filterbank construction and application.
//!
//! Band edges are `n_mels + 2` points equally spaced on the mel scale between
//! `fmin` and `fmax`. Band `i` rises linearly from edge `i` to a peak at edge
//! `i + 1` and falls back to zero at edge `i + 2`; weights are evaluated at the
//! FFT bin frequencies. With [`MelNorm::Slaney`] every row is scaled by
//! `2 / (edge[i+2] - edge[i])`, giving each triangle unit area in Hz.
//!
//! When bands are narrower than the FFT bin spacing some rows may contain
//! no bin at all. Such banks are still returned; a warning lists the empty bands.

use super::transforms::{power_spectrogram, power_to_db};
use super::types::{DbConfig, MelConfig, MelNorm, StftConfig};
use crate::numeric::linalg;
use crate::utils::audio_math::{fft_frequencies, frames_to_time, mel_frequencies};
use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use tracing::{debug, warn};

/// A `(n_mels, n_fft / 2 + 1)` matrix of non-negative triangular weights.
#[derive(Debug, Clone, PartialEq)]
pub struct MelFilterbank {
    weights: Array2<f64>,
    band_edges: Array1<f64>,
    sample_rate: f64,
    n_fft: usize,
    config: MelConfig,
}

impl MelFilterbank {
    /// Builds the filterbank for an `n_fft`-point spectrum at `sample_rate`.
    ///
    /// # Arguments
    /// * `sample_rate` - Sample rate of the analysed signal in Hz
    /// * `n_fft` - FFT size the spectra were computed with
    /// * `config` - Band count, frequency range, scale and normalization
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] if the configuration is
    /// invalid for `sample_rate`, `n_fft` is zero, or `n_mels` exceeds the
    /// number of FFT bins.
    pub fn new(sample_rate: f64, n_fft: usize, config: &MelConfig) -> AudioFeatureResult<Self> {
        config.validate(sample_rate)?;
        if n_fft == 0 {
            return Err(AudioFeatureError::invalid_config(
                "n_fft",
                "must be greater than 0",
            ));
        }
        let n_bins = n_fft / 2 + 1;
        if config.n_mels > n_bins {
            return Err(AudioFeatureError::invalid_config(
                "n_mels",
                format!("{} bands exceed the {n_bins} available frequency bins", config.n_mels),
            ));
        }

        let fmax = config.fmax_for(sample_rate);
        let bin_freqs = fft_frequencies(sample_rate, n_fft);
        let edges = mel_frequencies(config.n_mels + 2, config.fmin, fmax, config.scale);

        let mut weights = Array2::zeros((config.n_mels, n_bins));
        for (i, mut row) in weights.rows_mut().into_iter().enumerate() {
            let (left, center, right) = (edges[i], edges[i + 1], edges[i + 2]);
            let rise = center - left;
            let fall = right - center;
            for (w, &f) in row.iter_mut().zip(bin_freqs.iter()) {
                let lower = (f - left) / rise;
                let upper = (right - f) / fall;
                *w = lower.min(upper).max(0.0);
            }
            if config.norm == MelNorm::Slaney {
                row *= 2.0 / (right - left);
            }
        }

        let bank = Self {
            weights,
            band_edges: edges,
            sample_rate,
            n_fft,
            config: *config,
        };

        let empty = bank.empty_bands();
        if !empty.is_empty() {
            warn!(
                n_mels = config.n_mels,
                n_fft,
                empty_bands = ?empty,
                "mel bands contain no FFT bin; consider a larger n_fft or fewer bands"
            );
        }
        debug!(
            n_mels = config.n_mels,
            n_bins,
            fmin = config.fmin,
            fmax,
            scale = ?config.scale,
            "built mel filterbank"
        );
        Ok(bank)
    }

    /// Weight matrix, `(n_mels, n_bins)`.
    pub const fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    /// Number of bands.
    pub fn n_mels(&self) -> usize {
        self.weights.nrows()
    }

    /// Number of FFT bins each band is defined over.
    pub fn n_bins(&self) -> usize {
        self.weights.ncols()
    }

    /// FFT size the bank was built for.
    pub const fn n_fft(&self) -> usize {
        self.n_fft
    }

    /// Sample rate the bank was built for.
    pub const fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Parameters the bank was built from.
    pub const fn config(&self) -> &MelConfig {
        &self.config
    }

    /// The `n_mels + 2` band edge frequencies in Hz.
    pub const fn band_edges(&self) -> &Array1<f64> {
        &self.band_edges
    }

    /// Peak frequency of every band in Hz (strictly increasing).
    pub fn center_frequencies(&self) -> Array1<f64> {
        self.band_edges.slice(s![1..-1]).to_owned()
    }

    /// Indices of bands whose row is entirely zero.
    pub fn empty_bands(&self) -> Vec<usize> {
        self.weights
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| row.iter().all(|&w| w == 0.0))
            .map(|(i, _)| i)
            .collect()
    }

    /// Projects a `(n_bins, n_frames)` power spectrogram onto the bands.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::DimensionMismatch`] if the spectrogram does
    /// not have `n_bins` rows.
    pub fn apply(&self, power: ArrayView2<'_, f64>) -> AudioFeatureResult<Array2<f64>> {
        if power.nrows() != self.n_bins() {
            return Err(AudioFeatureError::DimensionMismatch(format!(
                "filterbank expects {} frequency bins, spectrogram has {}",
                self.n_bins(),
                power.nrows()
            )));
        }
        linalg::matmul(self.weights.view(), power)
    }

    /// Projects a single power spectrum onto the bands.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::DimensionMismatch`] if `spectrum` is not `n_bins` long.
    pub fn apply_frame(&self, spectrum: ArrayView1<'_, f64>) -> AudioFeatureResult<Array1<f64>> {
        linalg::matvec(self.weights.view(), spectrum)
    }
}

/// Mel-band power over time.
#[derive(Debug, Clone, PartialEq)]
pub struct MelSpectrogram {
    power: Array2<f64>,
    sample_rate: f64,
    hop_length: usize,
}

impl MelSpectrogram {
    /// Wraps a `(n_mels, n_frames)` mel power matrix.
    pub const fn new(power: Array2<f64>, sample_rate: f64, hop_length: usize) -> Self {
        Self {
            power,
            sample_rate,
            hop_length,
        }
    }

    /// Band power, `(n_mels, n_frames)`.
    pub const fn power(&self) -> &Array2<f64> {
        &self.power
    }

    /// Consumes the spectrogram, returning the band power matrix.
    pub fn into_power(self) -> Array2<f64> {
        self.power
    }

    /// Number of bands.
    pub fn n_mels(&self) -> usize {
        self.power.nrows()
    }

    /// Number of frames.
    pub fn n_frames(&self) -> usize {
        self.power.ncols()
    }

    /// Sample rate of the analysed signal in Hz.
    pub const fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Samples between frames.
    pub const fn hop_length(&self) -> usize {
        self.hop_length
    }

    /// Analysis frames per second.
    pub fn frame_rate(&self) -> f64 {
        self.sample_rate / self.hop_length as f64
    }

    /// Time in seconds of every frame.
    pub fn frame_times(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n_frames(), |t| {
            frames_to_time(t, self.sample_rate, self.hop_length)
        })
    }

    /// Log-compressed band power.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] if `db` is invalid.
    pub fn to_db(&self, db: &DbConfig) -> AudioFeatureResult<Array2<f64>> {
        power_to_db(self.power.view(), db)
    }
}

/// Computes a mel power spectrogram: `|STFT|^2` projected onto a mel filterbank.
///
/// `stft.output` is ignored; the projection always uses power.
///
/// # Errors
/// Propagates configuration and length errors from the STFT and filterbank.
pub fn mel_spectrogram(
    samples: &[f64],
    sample_rate: f64,
    stft: &StftConfig,
    mel: &MelConfig,
) -> AudioFeatureResult<MelSpectrogram> {
    let bank = MelFilterbank::new(sample_rate, stft.n_fft, mel)?;
    let power = power_spectrogram(samples, stft)?;
    let mel_power = bank.apply(power.view())?;
    Ok(MelSpectrogram::new(mel_power, sample_rate, stft.hop_length))
}
