//! Reference-record schema for comparing outputs against external fixtures.
//!
//! Full matrices are rarely worth storing; fixtures instead hold compact
//! summaries (shapes, sums, per-row statistics) that a reference
//! implementation and this crate can both produce. Every record is
//! serde-serializable so fixtures can live in JSON files next to the tests
//! that consume them.

use crate::utils::audio_math::{MelScale, hz_to_mel, hz_to_midi};
use crate::AudioFeatureResult;
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Relative error `|actual - expected| / |expected|`, or the absolute error
/// when `expected` is zero.
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    let diff = (actual - expected).abs();
    if expected == 0.0 {
        diff
    } else {
        diff / expected.abs()
    }
}

/// True if `actual` is within `rel_tol` relative or `abs_tol` absolute error
/// of `expected`.
pub fn approx_eq(actual: f64, expected: f64, rel_tol: f64, abs_tol: f64) -> bool {
    let diff = (actual - expected).abs();
    diff <= abs_tol || diff <= rel_tol * expected.abs()
}

/// Element-wise [`approx_eq`] over equal-length slices.
pub fn all_approx_eq(actual: &[f64], expected: &[f64], rel_tol: f64, abs_tol: f64) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(&a, &e)| approx_eq(a, e, rel_tol, abs_tol))
}

/// True if `detected` is within `tolerance_percent` percent of `truth`.
pub fn tempo_matches(detected: f64, truth: f64, tolerance_percent: f64) -> bool {
    (detected - truth).abs() <= truth.abs() * tolerance_percent / 100.0
}

/// One frequency and its conversions on every supported scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRecord {
    /// Input frequency in Hz
    pub hz: f64,
    /// Slaney mel value
    pub mel_slaney: f64,
    /// HTK mel value
    pub mel_htk: f64,
    /// MIDI note number
    pub midi: f64,
}

impl ConversionRecord {
    /// Computes the record for `hz`.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::DomainError`](crate::AudioFeatureError::DomainError)
    /// if `hz` is not positive.
    pub fn compute(hz: f64) -> AudioFeatureResult<Self> {
        Ok(Self {
            hz,
            mel_slaney: hz_to_mel(hz, MelScale::Slaney),
            mel_htk: hz_to_mel(hz, MelScale::Htk),
            midi: hz_to_midi(hz)?,
        })
    }

    /// True if every field agrees with `reference` within `rel_tol`.
    pub fn matches(&self, reference: &Self, rel_tol: f64) -> bool {
        all_approx_eq(
            &[self.hz, self.mel_slaney, self.mel_htk, self.midi],
            &[reference.hz, reference.mel_slaney, reference.mel_htk, reference.midi],
            rel_tol,
            1e-12,
        )
    }
}

/// Shape and mass of a filterbank matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterbankSummary {
    /// `(n_mels, n_bins)`
    pub shape: (usize, usize),
    /// Sum of all weights
    pub sum: f64,
    /// Largest weight
    pub max: f64,
    /// Sum of each row
    pub row_sums: Vec<f64>,
}

impl FilterbankSummary {
    /// Summarizes a `(n_mels, n_bins)` weight matrix.
    pub fn summarize(weights: ArrayView2<'_, f64>) -> Self {
        Self {
            shape: weights.dim(),
            sum: weights.sum(),
            max: weights.iter().copied().fold(0.0, f64::max),
            row_sums: weights.sum_axis(Axis(1)).to_vec(),
        }
    }

    /// True if the shapes are equal and every statistic agrees within `rel_tol`.
    pub fn matches(&self, reference: &Self, rel_tol: f64) -> bool {
        self.shape == reference.shape
            && approx_eq(self.sum, reference.sum, rel_tol, 1e-12)
            && approx_eq(self.max, reference.max, rel_tol, 1e-12)
            && all_approx_eq(&self.row_sums, &reference.row_sums, rel_tol, 1e-12)
    }
}

/// Shape and per-row statistics of a feature matrix such as MFCCs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    /// `(n_features, n_frames)`
    pub shape: (usize, usize),
    /// Mean of each feature over time
    pub mean: Vec<f64>,
    /// Population standard deviation of each feature over time
    pub std: Vec<f64>,
}

impl FeatureSummary {
    /// Summarizes a `(n_features, n_frames)` matrix.
    pub fn summarize(features: ArrayView2<'_, f64>) -> Self {
        let (mean, std) = features
            .rows()
            .into_iter()
            .map(|row| {
                let mean = row.mean().unwrap_or(0.0);
                let var = row.mapv(|x| (x - mean).powi(2)).mean().unwrap_or(0.0);
                (mean, var.sqrt())
            })
            .unzip();
        Self {
            shape: features.dim(),
            mean,
            std,
        }
    }

    /// True if the shapes are equal and every statistic is within `abs_tol`
    /// absolute or `rel_tol` relative error.
    pub fn matches(&self, reference: &Self, rel_tol: f64, abs_tol: f64) -> bool {
        self.shape == reference.shape
            && all_approx_eq(&self.mean, &reference.mean, rel_tol, abs_tol)
            && all_approx_eq(&self.std, &reference.std, rel_tol, abs_tol)
    }
}

/// A tempo test case and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoRecord {
    /// Tempo the signal was generated at
    pub true_bpm: f64,
    /// Tempo reported by the estimator
    pub detected_bpm: f64,
    /// Allowed deviation in percent
    pub tolerance_percent: f64,
}

impl TempoRecord {
    /// Creates a record.
    pub const fn new(true_bpm: f64, detected_bpm: f64, tolerance_percent: f64) -> Self {
        Self {
            true_bpm,
            detected_bpm,
            tolerance_percent,
        }
    }

    /// True if the detected tempo is within tolerance.
    pub fn passes(&self) -> bool {
        tempo_matches(self.detected_bpm, self.true_bpm, self.tolerance_percent)
    }
}

/// Shape and level statistics of an onset envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnsetSummary {
    /// Number of frames
    pub length: usize,
    /// Largest value
    pub max: f64,
    /// Mean value
    pub mean: f64,
    /// Threshold used for `count_above`
    pub threshold: f64,
    /// Frames strictly above `threshold` times `max`
    pub count_above: usize,
}

impl OnsetSummary {
    /// Default relative threshold for counting active frames.
    pub const DEFAULT_THRESHOLD: f64 = 0.1;

    /// Summarizes an envelope, counting frames above `threshold * max`.
    pub fn summarize(envelope: ArrayView1<'_, f64>, threshold: f64) -> Self {
        let max = envelope.iter().copied().fold(0.0, f64::max);
        let cutoff = threshold * max;
        Self {
            length: envelope.len(),
            max,
            mean: envelope.mean().unwrap_or(0.0),
            threshold,
            count_above: envelope.iter().filter(|&&x| x > cutoff).count(),
        }
    }

    /// True if lengths are equal and levels agree within `rel_tol`.
    pub fn matches(&self, reference: &Self, rel_tol: f64) -> bool {
        self.length == reference.length
            && approx_eq(self.max, reference.max, rel_tol, 1e-9)
            && approx_eq(self.mean, reference.mean, rel_tol, 1e-9)
    }
}
