//! Error types and result utilities for feature extraction.

use thiserror::Error;

/// Convenience type alias for results that may contain AudioFeatureError
pub type AudioFeatureResult<T> = Result<T, AudioFeatureError>;

/// Error types that can occur during feature extraction.
///
/// Configuration errors are raised at the entry point before any computation
/// starts, so an `Err` never accompanies a partially computed result.
/// Degenerate-but-valid inputs (silent buffers, all-zero filterbank rows) are
/// not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioFeatureError {
    /// A configuration parameter is out of its valid range.
    ///
    /// Covers non-positive sample rates, hop lengths, FFT sizes and band or
    /// coefficient counts, as well as inconsistent combinations such as
    /// `hop_length > n_fft` or `fmax > sample_rate / 2`.
    #[error("Invalid configuration: `{parameter}` {reason}")]
    InvalidConfig {
        /// Name of the offending parameter
        parameter: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The sample buffer is shorter than one analysis frame.
    #[error("Insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples {
        /// Minimum number of samples required
        required: usize,
        /// Number of samples supplied
        actual: usize,
    },

    /// A scale conversion received a value outside its domain.
    #[error("Domain error: {value} {reason}")]
    DomainError {
        /// The rejected input value
        value: f64,
        /// Why the value is outside the domain
        reason: String,
    },

    /// A precomputed input has a shape that contradicts the configuration.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
}

impl AudioFeatureError {
    /// Creates an [`AudioFeatureError::InvalidConfig`] for `parameter`.
    pub fn invalid_config(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates an [`AudioFeatureError::DomainError`] for `value`.
    pub fn domain(value: f64, reason: impl Into<String>) -> Self {
        Self::DomainError {
            value,
            reason: reason.into(),
        }
    }

    /// Returns true for errors the caller can fix by choosing other parameters.
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::DimensionMismatch(_)
        )
    }
}
