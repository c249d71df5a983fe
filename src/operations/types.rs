//! Configuration types for every analysis stage.
//!
//! Every parameter is passed explicitly per call; there is no global state.
//! Defaults follow the conventions of common reference tooling (2048-point
//! FFT, 512-sample hop, 128 Slaney mel bands, 80 dB dynamic range).

use crate::utils::audio_math::MelScale;
use crate::{AudioFeatureError, AudioFeatureResult};
use serde::{Deserialize, Serialize};

/// Window functions for STFT analysis.
///
/// All windows are periodic (DFT-even), the form used for spectral analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Rectangular window (no windowing)
    Rectangular,
    /// Hann window - good general purpose window
    #[default]
    Hann,
    /// Hamming window - reduced first side lobe
    Hamming,
    /// Blackman window - excellent side lobe suppression
    Blackman,
}

/// How the signal is extended when frames are centered on their sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadMode {
    /// Mirror the signal about its first and last samples (edge sample not repeated)
    #[default]
    Reflect,
    /// Extend with zeros
    Constant,
}

/// What each STFT cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectrogramOutput {
    /// Complex FFT coefficients
    Complex,
    /// `|X|`
    Magnitude,
    /// `|X|^2`
    #[default]
    Power,
}

/// Per-band normalization applied to mel filterbank rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MelNorm {
    /// Scale row `i` by `2 / (edge[i+2] - edge[i])` so bands carry comparable energy
    Slaney,
    /// Leave triangles with unit peak
    Unnormalized,
}

impl MelNorm {
    /// The normalization conventionally paired with a mel scale: Slaney-scale
    /// banks are area-normalized, HTK banks are not.
    pub const fn for_scale(scale: MelScale) -> Self {
        match scale {
            MelScale::Slaney => Self::Slaney,
            MelScale::Htk => Self::Unnormalized,
        }
    }
}

/// Short-time Fourier transform parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StftConfig {
    /// FFT size in samples
    pub n_fft: usize,
    /// Samples between successive frames (1..=n_fft)
    pub hop_length: usize,
    /// Window length; `None` uses `n_fft`. Shorter windows are zero-padded
    /// symmetrically to `n_fft`.
    pub win_length: Option<usize>,
    /// Analysis window
    pub window: WindowType,
    /// Center frame `t` on sample `t * hop_length` by padding `n_fft / 2` on both ends
    pub center: bool,
    /// Padding used when `center` is set
    pub pad_mode: PadMode,
    /// Cell representation of the result
    pub output: SpectrogramOutput,
}

impl StftConfig {
    /// Default analysis: 2048-point Hann frames, 512-sample hop, centered with
    /// reflect padding, power output.
    pub const fn new() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            win_length: None,
            window: WindowType::Hann,
            center: true,
            pad_mode: PadMode::Reflect,
            output: SpectrogramOutput::Power,
        }
    }

    /// Default analysis with a different frame and hop size.
    pub const fn with_sizes(n_fft: usize, hop_length: usize) -> Self {
        let mut config = Self::new();
        config.n_fft = n_fft;
        config.hop_length = hop_length;
        config
    }

    /// Effective window length.
    pub fn win_length(&self) -> usize {
        self.win_length.unwrap_or(self.n_fft)
    }

    /// Number of frequency bins per frame.
    pub const fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of frames produced for `n_samples` input samples.
    ///
    /// Depends only on the buffer length, frame length, hop length and
    /// centering; callers must validate the configuration first.
    pub const fn n_frames(&self, n_samples: usize) -> usize {
        let padded = if self.center {
            n_samples + 2 * (self.n_fft / 2)
        } else {
            n_samples
        };
        if padded < self.n_fft {
            0
        } else {
            1 + (padded - self.n_fft) / self.hop_length
        }
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] naming the first bad parameter.
    pub fn validate(&self) -> AudioFeatureResult<()> {
        if self.n_fft == 0 {
            return Err(AudioFeatureError::invalid_config(
                "n_fft",
                "must be greater than 0",
            ));
        }
        if self.hop_length == 0 {
            return Err(AudioFeatureError::invalid_config(
                "hop_length",
                "must be greater than 0",
            ));
        }
        if self.hop_length > self.n_fft {
            return Err(AudioFeatureError::invalid_config(
                "hop_length",
                format!("must not exceed n_fft ({})", self.n_fft),
            ));
        }
        let win_length = self.win_length();
        if win_length == 0 || win_length > self.n_fft {
            return Err(AudioFeatureError::invalid_config(
                "win_length",
                format!("must be in 1..={}", self.n_fft),
            ));
        }
        Ok(())
    }
}

impl Default for StftConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Mel filterbank parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MelConfig {
    /// Number of mel bands
    pub n_mels: usize,
    /// Lowest band edge in Hz
    pub fmin: f64,
    /// Highest band edge in Hz; `None` means the Nyquist frequency
    pub fmax: Option<f64>,
    /// Mel scale convention
    pub scale: MelScale,
    /// Row normalization
    pub norm: MelNorm,
}

impl MelConfig {
    /// 128 Slaney bands spanning 0 Hz to Nyquist, area-normalized.
    pub const fn new() -> Self {
        Self::with_scale(128, MelScale::Slaney)
    }

    /// `n_mels` bands on `scale`, with the normalization conventionally
    /// paired with that scale.
    pub const fn with_scale(n_mels: usize, scale: MelScale) -> Self {
        Self {
            n_mels,
            fmin: 0.0,
            fmax: None,
            scale,
            norm: MelNorm::for_scale(scale),
        }
    }

    /// Highest band edge for a given sample rate.
    pub fn fmax_for(&self, sample_rate: f64) -> f64 {
        self.fmax.unwrap_or(sample_rate / 2.0)
    }

    /// Checks the configuration against a sample rate.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] naming the first bad parameter.
    pub fn validate(&self, sample_rate: f64) -> AudioFeatureResult<()> {
        if !(sample_rate > 0.0) {
            return Err(AudioFeatureError::invalid_config(
                "sample_rate",
                "must be greater than 0",
            ));
        }
        if self.n_mels == 0 {
            return Err(AudioFeatureError::invalid_config(
                "n_mels",
                "must be greater than 0",
            ));
        }
        if !self.fmin.is_finite() || self.fmin < 0.0 {
            return Err(AudioFeatureError::invalid_config(
                "fmin",
                "must be a non-negative frequency",
            ));
        }
        let fmax = self.fmax_for(sample_rate);
        let nyquist = sample_rate / 2.0;
        if !fmax.is_finite() || fmax <= self.fmin {
            return Err(AudioFeatureError::invalid_config(
                "fmax",
                format!("must be greater than fmin ({})", self.fmin),
            ));
        }
        if fmax > nyquist * (1.0 + 1e-9) {
            return Err(AudioFeatureError::invalid_config(
                "fmax",
                format!("must not exceed the Nyquist frequency ({nyquist})"),
            ));
        }
        Ok(())
    }
}

impl Default for MelConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Power-to-decibel compression parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Power mapped to 0 dB
    pub reference: f64,
    /// Floor applied before the logarithm
    pub amin: f64,
    /// If set, values are clipped to `max_db - top_db`
    pub top_db: Option<f64>,
}

impl DbConfig {
    /// Reference 1.0, floor 1e-10 (-100 dB), 80 dB dynamic range.
    pub const fn new() -> Self {
        Self {
            reference: 1.0,
            amin: 1e-10,
            top_db: Some(80.0),
        }
    }

    /// No dynamic-range clipping; only the `amin` floor applies.
    pub const fn unclipped() -> Self {
        Self {
            reference: 1.0,
            amin: 1e-10,
            top_db: None,
        }
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] naming the first bad parameter.
    pub fn validate(&self) -> AudioFeatureResult<()> {
        if !(self.amin > 0.0) {
            return Err(AudioFeatureError::invalid_config(
                "amin",
                "must be greater than 0",
            ));
        }
        if !(self.reference > 0.0) {
            return Err(AudioFeatureError::invalid_config(
                "reference",
                "must be greater than 0",
            ));
        }
        if let Some(top_db) = self.top_db {
            if !(top_db >= 0.0) {
                return Err(AudioFeatureError::invalid_config(
                    "top_db",
                    "must be non-negative",
                ));
            }
        }
        Ok(())
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// MFCC extraction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MfccConfig {
    /// Number of cepstral coefficients kept
    pub n_mfcc: usize,
    /// STFT used to build the power spectrogram
    pub stft: StftConfig,
    /// Mel filterbank
    pub mel: MelConfig,
    /// Log compression
    pub db: DbConfig,
    /// Sinusoidal liftering coefficient; 0 disables liftering
    pub lifter: f64,
}

impl MfccConfig {
    /// 20 coefficients from 128 Slaney bands of a 2048/512 power spectrogram.
    pub const fn new() -> Self {
        Self {
            n_mfcc: 20,
            stft: StftConfig::new(),
            mel: MelConfig::new(),
            db: DbConfig::new(),
            lifter: 0.0,
        }
    }

    /// Default extraction with a different coefficient and band count.
    pub const fn with_counts(n_mfcc: usize, n_mels: usize) -> Self {
        let mut config = Self::new();
        config.n_mfcc = n_mfcc;
        config.mel.n_mels = n_mels;
        config
    }

    /// Checks the MFCC-specific parameters (the nested configs validate
    /// themselves where they are used).
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] naming the first bad parameter.
    pub fn validate(&self) -> AudioFeatureResult<()> {
        if self.n_mfcc == 0 {
            return Err(AudioFeatureError::invalid_config(
                "n_mfcc",
                "must be greater than 0",
            ));
        }
        if self.n_mfcc > self.mel.n_mels {
            return Err(AudioFeatureError::invalid_config(
                "n_mfcc",
                format!("must not exceed n_mels ({})", self.mel.n_mels),
            ));
        }
        if !(self.lifter >= 0.0) {
            return Err(AudioFeatureError::invalid_config(
                "lifter",
                "must be non-negative",
            ));
        }
        self.db.validate()
    }
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Noise-floor removal applied to an onset envelope before clipping at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detrend {
    /// Leave the envelope unchanged
    #[default]
    Off,
    /// Subtract the mean of the whole envelope
    Global,
    /// Subtract a centered moving average of `window` frames
    Local {
        /// Moving-average width in frames
        window: usize,
    },
}

/// Onset strength parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnsetConfig {
    /// Frame distance between the compared spectra
    pub lag: usize,
    /// Noise-floor removal
    pub detrend: Detrend,
    /// STFT used to build the power spectrogram
    pub stft: StftConfig,
    /// Mel filterbank
    pub mel: MelConfig,
    /// Log compression
    pub db: DbConfig,
}

impl OnsetConfig {
    /// First-order flux of a 128-band log-mel spectrogram at a 512-sample hop.
    pub const fn new() -> Self {
        Self {
            lag: 1,
            detrend: Detrend::Off,
            stft: StftConfig::new(),
            mel: MelConfig::new(),
            db: DbConfig::new(),
        }
    }

    /// Default onset analysis with a different hop length.
    pub const fn with_hop_length(hop_length: usize) -> Self {
        let mut config = Self::new();
        config.stft.hop_length = hop_length;
        config
    }

    /// Checks the onset-specific parameters.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] naming the first bad parameter.
    pub fn validate(&self) -> AudioFeatureResult<()> {
        if self.lag == 0 {
            return Err(AudioFeatureError::invalid_config(
                "lag",
                "must be at least 1 frame",
            ));
        }
        if let Detrend::Local { window } = self.detrend {
            if window == 0 {
                return Err(AudioFeatureError::invalid_config(
                    "detrend.window",
                    "must be at least 1 frame",
                ));
            }
        }
        self.db.validate()
    }
}

impl Default for OnsetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Tempo estimation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoConfig {
    /// Slowest tempo considered (BPM)
    pub min_bpm: f64,
    /// Fastest tempo considered (BPM)
    pub max_bpm: f64,
    /// Mode of the log-normal tempo prior; also the tempo reported for silence
    pub start_bpm: f64,
    /// Standard deviation of the prior in octaves
    pub std_bpm: f64,
    /// Halve the chosen period while the half-period carries comparable
    /// autocorrelation mass
    pub octave_check: bool,
}

impl TempoConfig {
    /// 30–300 BPM search with a one-octave prior centered on 120 BPM.
    pub const fn new() -> Self {
        Self {
            min_bpm: 30.0,
            max_bpm: 300.0,
            start_bpm: 120.0,
            std_bpm: 1.0,
            octave_check: true,
        }
    }

    /// Checks the configuration.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] naming the first bad parameter.
    pub fn validate(&self) -> AudioFeatureResult<()> {
        if !(self.min_bpm > 0.0) || !self.min_bpm.is_finite() {
            return Err(AudioFeatureError::invalid_config(
                "min_bpm",
                "must be a positive tempo",
            ));
        }
        if !(self.max_bpm > self.min_bpm) || !self.max_bpm.is_finite() {
            return Err(AudioFeatureError::invalid_config(
                "max_bpm",
                format!("must be greater than min_bpm ({})", self.min_bpm),
            ));
        }
        if !(self.start_bpm > 0.0) || !self.start_bpm.is_finite() {
            return Err(AudioFeatureError::invalid_config(
                "start_bpm",
                "must be a positive tempo",
            ));
        }
        if !(self.std_bpm > 0.0) || !self.std_bpm.is_finite() {
            return Err(AudioFeatureError::invalid_config(
                "std_bpm",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self::new()
    }
}
