//! Short-time Fourier transform.
//!
//! Frames are taken every `hop_length` samples, multiplied by a periodic
//! analysis window and transformed with the crate's own FFT. With
//! `center = true` the signal is padded by `n_fft / 2` samples on each side
//! so that frame `t` is centered on sample `t * hop_length`.
//!
//! ```rust
//! use audio_features::operations::transforms::stft;
//! use audio_features::{SpectrogramOutput, StftConfig};
//!
//! let samples: Vec<f64> = (0..22050)
//!     .map(|i| (2.0 * std::f64::consts::PI * 440.0 * i as f64 / 22050.0).sin())
//!     .collect();
//! let spectrogram = stft(&samples, 22050.0, &StftConfig::new()).unwrap();
//! assert_eq!(spectrogram.shape(), (1025, 44));
//! assert_eq!(spectrogram.output(), SpectrogramOutput::Power);
//! ```

use super::types::{DbConfig, PadMode, SpectrogramOutput, StftConfig, WindowType};
use crate::numeric::FftPlan;
use crate::utils::audio_math::{self, fft_frequencies, frames_to_time};
use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::{Array1, Array2, ArrayView2};
use num_complex::Complex;
use std::borrow::Cow;
use std::f64::consts::PI;
use tracing::{debug, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// STFT cells in the representation requested by [`StftConfig::output`].
///
/// All matrices are `(n_bins, n_frames)`.
#[derive(Debug, Clone, PartialEq)]
pub enum SpectrogramValues {
    /// Complex coefficients
    Complex(Array2<Complex<f64>>),
    /// `|X|`
    Magnitude(Array2<f64>),
    /// `|X|^2`
    Power(Array2<f64>),
}

/// Result of an STFT together with the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrogram {
    values: SpectrogramValues,
    sample_rate: f64,
    config: StftConfig,
}

impl Spectrogram {
    /// The cells as produced.
    pub const fn values(&self) -> &SpectrogramValues {
        &self.values
    }

    /// Consumes the spectrogram, returning its cells.
    pub fn into_values(self) -> SpectrogramValues {
        self.values
    }

    /// Representation of the cells.
    pub const fn output(&self) -> SpectrogramOutput {
        match self.values {
            SpectrogramValues::Complex(_) => SpectrogramOutput::Complex,
            SpectrogramValues::Magnitude(_) => SpectrogramOutput::Magnitude,
            SpectrogramValues::Power(_) => SpectrogramOutput::Power,
        }
    }

    /// `(n_bins, n_frames)`.
    pub fn shape(&self) -> (usize, usize) {
        match &self.values {
            SpectrogramValues::Complex(m) => m.dim(),
            SpectrogramValues::Magnitude(m) | SpectrogramValues::Power(m) => m.dim(),
        }
    }

    /// Number of frequency bins, `n_fft / 2 + 1`.
    pub fn n_bins(&self) -> usize {
        self.shape().0
    }

    /// Number of frames.
    pub fn n_frames(&self) -> usize {
        self.shape().1
    }

    /// Sample rate of the analysed signal in Hz.
    pub const fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Parameters used for the analysis.
    pub const fn config(&self) -> &StftConfig {
        &self.config
    }

    /// Analysis frames per second.
    pub fn frame_rate(&self) -> f64 {
        self.sample_rate / self.config.hop_length as f64
    }

    /// Complex cells, if the spectrogram kept them.
    pub const fn complex(&self) -> Option<&Array2<Complex<f64>>> {
        match &self.values {
            SpectrogramValues::Complex(m) => Some(m),
            _ => None,
        }
    }

    /// `|X|` for every cell.
    pub fn magnitude(&self) -> Array2<f64> {
        match &self.values {
            SpectrogramValues::Complex(m) => m.mapv(|c| c.norm()),
            SpectrogramValues::Magnitude(m) => m.clone(),
            SpectrogramValues::Power(m) => m.mapv(f64::sqrt),
        }
    }

    /// `|X|^2` for every cell.
    pub fn power(&self) -> Array2<f64> {
        match &self.values {
            SpectrogramValues::Complex(m) => m.mapv(|c| c.norm_sqr()),
            SpectrogramValues::Magnitude(m) => m.mapv(|x| x * x),
            SpectrogramValues::Power(m) => m.clone(),
        }
    }

    /// Power in decibels; see [`power_to_db`].
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] if `db` is invalid.
    pub fn to_db(&self, db: &DbConfig) -> AudioFeatureResult<Array2<f64>> {
        power_to_db(self.power().view(), db)
    }

    /// Center frequency of every bin in Hz.
    pub fn frequencies(&self) -> Array1<f64> {
        fft_frequencies(self.sample_rate, self.config.n_fft)
    }

    /// Time in seconds of every frame.
    ///
    /// For centered analysis this is the frame center; otherwise the frame start.
    pub fn frame_times(&self) -> Array1<f64> {
        Array1::from_shape_fn(self.n_frames(), |t| {
            frames_to_time(t, self.sample_rate, self.config.hop_length)
        })
    }
}

/// Periodic window of `size` points.
///
/// Periodic windows are the first `size` points of a symmetric window of
/// `size + 1` points, so `w[0]` is the window's minimum and `w[size / 2]` its peak.
pub fn generate_window(size: usize, window_type: WindowType) -> Vec<f64> {
    let n = size as f64;
    match window_type {
        WindowType::Rectangular => vec![1.0; size],
        WindowType::Hann => (0..size)
            .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n).cos())
            .collect(),
        WindowType::Hamming => (0..size)
            .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / n).cos())
            .collect(),
        WindowType::Blackman => (0..size)
            .map(|i| {
                let phase = 2.0 * PI * i as f64 / n;
                0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos()
            })
            .collect(),
    }
}

/// The `n_fft`-point analysis window: a `win_length` window zero-padded
/// equally on both sides.
fn analysis_window(config: &StftConfig) -> Vec<f64> {
    let win_length = config.win_length();
    let mut window = vec![0.0; config.n_fft];
    let offset = (config.n_fft - win_length) / 2;
    window[offset..offset + win_length].copy_from_slice(&generate_window(win_length, config.window));
    window
}

/// Maps an index outside `0..len` back into range by mirroring about the
/// first and last samples without repeating them.
fn reflect_index(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let folded = index.rem_euclid(period);
    if folded >= len as isize {
        (period - folded) as usize
    } else {
        folded as usize
    }
}

fn pad_signal<'a>(samples: &'a [f64], config: &StftConfig) -> Cow<'a, [f64]> {
    if !config.center {
        return Cow::Borrowed(samples);
    }
    let pad = config.n_fft / 2;
    let len = samples.len();
    let padded = match config.pad_mode {
        PadMode::Constant => {
            let mut out = vec![0.0; len + 2 * pad];
            out[pad..pad + len].copy_from_slice(samples);
            out
        }
        PadMode::Reflect => (0..len + 2 * pad)
            .map(|i| samples[reflect_index(i as isize - pad as isize, len)])
            .collect(),
    };
    Cow::Owned(padded)
}

/// Computes the complex STFT of `samples` as an `(n_fft / 2 + 1, n_frames)` matrix.
///
/// # Errors
/// - [`AudioFeatureError::InvalidConfig`] if the configuration is invalid.
/// - [`AudioFeatureError::InsufficientSamples`] if `samples` is shorter than
///   one frame (`n_fft`), centered or not.
pub fn stft_complex(
    samples: &[f64],
    config: &StftConfig,
) -> AudioFeatureResult<Array2<Complex<f64>>> {
    config.validate()?;
    if samples.len() < config.n_fft {
        return Err(AudioFeatureError::InsufficientSamples {
            required: config.n_fft,
            actual: samples.len(),
        });
    }

    let signal = pad_signal(samples, config);
    let window = analysis_window(config);
    let n_frames = config.n_frames(samples.len());
    let n_bins = config.n_bins();
    debug!(
        n_fft = config.n_fft,
        hop_length = config.hop_length,
        n_frames,
        center = config.center,
        "computing STFT"
    );

    let plan = FftPlan::new(config.n_fft)?;
    let analyse = |t: usize| -> AudioFeatureResult<Vec<Complex<f64>>> {
        let start = t * config.hop_length;
        let frame: Vec<f64> = signal[start..start + config.n_fft]
            .iter()
            .zip(window.iter())
            .map(|(&x, &w)| x * w)
            .collect();
        plan.real_forward(&frame)
    };

    #[cfg(feature = "parallel")]
    let frames: Vec<Vec<Complex<f64>>> = (0..n_frames)
        .into_par_iter()
        .map(analyse)
        .collect::<AudioFeatureResult<_>>()?;
    #[cfg(not(feature = "parallel"))]
    let frames: Vec<Vec<Complex<f64>>> = (0..n_frames)
        .map(analyse)
        .collect::<AudioFeatureResult<_>>()?;

    let mut out = Array2::zeros((n_bins, n_frames));
    for (mut column, spectrum) in out.columns_mut().into_iter().zip(frames) {
        for (cell, value) in column.iter_mut().zip(spectrum) {
            *cell = value;
        }
    }
    trace!(shape = ?out.dim(), "STFT complete");
    Ok(out)
}

/// Computes the STFT of `samples` in the representation selected by `config.output`.
///
/// # Errors
/// See [`stft_complex`].
pub fn stft(
    samples: &[f64],
    sample_rate: f64,
    config: &StftConfig,
) -> AudioFeatureResult<Spectrogram> {
    if !(sample_rate > 0.0) {
        return Err(AudioFeatureError::invalid_config(
            "sample_rate",
            "must be greater than 0",
        ));
    }
    let complex = stft_complex(samples, config)?;
    let values = match config.output {
        SpectrogramOutput::Complex => SpectrogramValues::Complex(complex),
        SpectrogramOutput::Magnitude => SpectrogramValues::Magnitude(complex.mapv(|c| c.norm())),
        SpectrogramOutput::Power => SpectrogramValues::Power(complex.mapv(|c| c.norm_sqr())),
    };
    Ok(Spectrogram {
        values,
        sample_rate,
        config: *config,
    })
}

/// `|STFT|^2` regardless of `config.output`.
///
/// # Errors
/// See [`stft_complex`].
pub fn power_spectrogram(samples: &[f64], config: &StftConfig) -> AudioFeatureResult<Array2<f64>> {
    Ok(stft_complex(samples, config)?.mapv(|c| c.norm_sqr()))
}

/// Converts a power matrix to decibels.
///
/// Each cell becomes `10 * log10(max(x, amin) / reference)`. With `top_db`
/// set, cells are then raised to at least `max_db - top_db`, where `max_db`
/// is the largest value in the whole matrix.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `db` is invalid.
pub fn power_to_db(power: ArrayView2<'_, f64>, db: &DbConfig) -> AudioFeatureResult<Array2<f64>> {
    db.validate()?;
    let mut out = power.mapv(|x| audio_math::power_to_db(x, db.reference, db.amin));
    if let Some(top_db) = db.top_db {
        let max_db = out.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let floor = max_db - top_db;
        out.mapv_inplace(|x| x.max(floor));
    }
    Ok(out)
}
