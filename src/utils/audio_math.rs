//! Frequency-scale conversions and related unit helpers.
//!
//! Mel conversions come in the two conventions used by reference tooling:
//! the Slaney (Auditory Toolbox) scale, linear below 1 kHz and logarithmic
//! above, and the HTK scale, `2595 * log10(1 + hz / 700)` everywhere. Both
//! round-trip exactly up to floating-point error.
//!
//! # Examples
//!
//! ```rust
//! use audio_features::{hz_to_mel, mel_to_hz, hz_to_midi, MelScale};
//!
//! let mel = hz_to_mel(1000.0, MelScale::Slaney);
//! assert!((mel - 15.0).abs() < 1e-12);
//! assert!((mel_to_hz(mel, MelScale::Slaney) - 1000.0).abs() < 1e-9);
//! assert_eq!(hz_to_midi(440.0).unwrap(), 69.0);
//! ```

use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

// Slaney scale: linear segment of 200/3 Hz per mel up to 1 kHz (mel 15),
// then a constant log step of ln(6.4) / 27 per mel.
const SLANEY_F_SP: f64 = 200.0 / 3.0;
const SLANEY_MIN_LOG_HZ: f64 = 1000.0;
const SLANEY_MIN_LOG_MEL: f64 = SLANEY_MIN_LOG_HZ / SLANEY_F_SP;

fn slaney_log_step() -> f64 {
    6.4f64.ln() / 27.0
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Mel scale convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MelScale {
    /// Slaney's Auditory Toolbox scale: linear below 1 kHz, logarithmic above.
    #[default]
    Slaney,
    /// HTK scale: `2595 * log10(1 + hz / 700)`.
    Htk,
}

impl MelScale {
    /// Maps the conventional `htk` flag to a scale.
    pub const fn from_htk(htk: bool) -> Self {
        if htk { Self::Htk } else { Self::Slaney }
    }

    /// Returns true for the HTK convention.
    pub const fn is_htk(self) -> bool {
        matches!(self, Self::Htk)
    }
}

// =============================================================================
// FREQUENCY CONVERSIONS
// =============================================================================

/// Converts a frequency in Hz to mels.
///
/// # Examples
///
/// ```rust
/// use audio_features::{hz_to_mel, MelScale};
///
/// assert!((hz_to_mel(200.0, MelScale::Slaney) - 3.0).abs() < 1e-12);
/// assert!((hz_to_mel(700.0, MelScale::Htk) - 2595.0 * 2f64.log10()).abs() < 1e-9);
/// ```
pub fn hz_to_mel(hz: f64, scale: MelScale) -> f64 {
    match scale {
        MelScale::Htk => 2595.0 * (1.0 + hz / 700.0).log10(),
        MelScale::Slaney => {
            if hz >= SLANEY_MIN_LOG_HZ {
                SLANEY_MIN_LOG_MEL + (hz / SLANEY_MIN_LOG_HZ).ln() / slaney_log_step()
            } else {
                hz / SLANEY_F_SP
            }
        }
    }
}

/// Converts mels back to Hz. Exact inverse of [`hz_to_mel`].
pub fn mel_to_hz(mel: f64, scale: MelScale) -> f64 {
    match scale {
        MelScale::Htk => 700.0 * (10f64.powf(mel / 2595.0) - 1.0),
        MelScale::Slaney => {
            if mel >= SLANEY_MIN_LOG_MEL {
                SLANEY_MIN_LOG_HZ * (slaney_log_step() * (mel - SLANEY_MIN_LOG_MEL)).exp()
            } else {
                SLANEY_F_SP * mel
            }
        }
    }
}

/// Element-wise [`hz_to_mel`].
pub fn hz_to_mel_array(hz: &[f64], scale: MelScale) -> Array1<f64> {
    hz.iter().map(|&f| hz_to_mel(f, scale)).collect()
}

/// Element-wise [`mel_to_hz`].
pub fn mel_to_hz_array(mels: &[f64], scale: MelScale) -> Array1<f64> {
    mels.iter().map(|&m| mel_to_hz(m, scale)).collect()
}

/// Converts a frequency in Hz to a (fractional) MIDI note number.
///
/// `midi = 12 * log2(hz / 440) + 69`, so A4 maps to exactly 69.
///
/// # Errors
/// Returns [`AudioFeatureError::DomainError`] if `hz` is not a positive finite number.
pub fn hz_to_midi(hz: f64) -> AudioFeatureResult<f64> {
    if !hz.is_finite() || hz <= 0.0 {
        return Err(AudioFeatureError::domain(
            hz,
            "is not a positive finite frequency",
        ));
    }
    Ok(12.0 * (hz / 440.0).log2() + 69.0)
}

/// Element-wise [`hz_to_midi`]; fails on the first out-of-domain element.
pub fn hz_to_midi_array(hz: &[f64]) -> AudioFeatureResult<Array1<f64>> {
    hz.iter()
        .map(|&f| hz_to_midi(f))
        .collect::<AudioFeatureResult<Vec<f64>>>()
        .map(Array1::from_vec)
}

/// Converts a MIDI note number to Hz.
pub fn midi_to_hz(midi: f64) -> f64 {
    440.0 * 2f64.powf((midi - 69.0) / 12.0)
}

/// Names the nearest equal-tempered note, e.g. `"A4"` for 440 Hz.
///
/// # Errors
/// Returns [`AudioFeatureError::DomainError`] for non-positive frequencies.
pub fn hz_to_note(hz: f64) -> AudioFeatureResult<String> {
    let midi = hz_to_midi(hz)?.round() as i64;
    let octave = midi.div_euclid(12) - 1;
    let name = NOTE_NAMES[midi.rem_euclid(12) as usize];
    Ok(format!("{name}{octave}"))
}

/// Parses a note name such as `"A4"`, `"C#3"`, `"Bb-1"` or `"E"` (octave 4)
/// and returns its frequency in Hz.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if the name cannot be parsed.
pub fn note_to_hz(note: &str) -> AudioFeatureResult<f64> {
    let invalid = || AudioFeatureError::invalid_config("note", format!("'{note}' is not a note name"));

    let mut chars = note.trim().chars().peekable();
    let base = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
    let mut offset: i64 = match base {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(invalid()),
    };
    match chars.peek() {
        Some('#') => {
            offset += 1;
            chars.next();
        }
        Some('b') => {
            offset -= 1;
            chars.next();
        }
        _ => {}
    }

    let rest: String = chars.collect();
    let octave: i64 = if rest.is_empty() {
        4
    } else {
        rest.parse().map_err(|_| invalid())?
    };

    let midi = octave
        .checked_add(1)
        .and_then(|o| o.checked_mul(12))
        .and_then(|m| m.checked_add(offset))
        .ok_or_else(invalid)?;
    Ok(midi_to_hz(midi as f64))
}

// =============================================================================
// GRIDS
// =============================================================================

/// Center frequencies of the `n_fft / 2 + 1` non-negative FFT bins.
pub fn fft_frequencies(sample_rate: f64, n_fft: usize) -> Array1<f64> {
    let n_bins = n_fft / 2 + 1;
    (0..n_bins)
        .map(|k| k as f64 * sample_rate / n_fft as f64)
        .collect()
}

/// `n` frequencies equally spaced on the mel scale between `fmin` and `fmax`
/// (both inclusive).
pub fn mel_frequencies(n: usize, fmin: f64, fmax: f64, scale: MelScale) -> Array1<f64> {
    let mel_min = hz_to_mel(fmin, scale);
    let mel_max = hz_to_mel(fmax, scale);
    linspace(mel_min, mel_max, n).mapv(|m| mel_to_hz(m, scale))
}

fn linspace(start: f64, end: f64, num: usize) -> Array1<f64> {
    match num {
        0 => Array1::zeros(0),
        1 => Array1::from_elem(1, start),
        _ => {
            let step = (end - start) / (num - 1) as f64;
            (0..num).map(|i| start + i as f64 * step).collect()
        }
    }
}

// =============================================================================
// AMPLITUDE AND TIME
// =============================================================================

/// Converts a power value to decibels: `10 * log10(max(power, amin) / reference)`.
pub fn power_to_db(power: f64, reference: f64, amin: f64) -> f64 {
    10.0 * power.max(amin).log10() - 10.0 * reference.abs().max(amin).log10()
}

/// Start time in seconds of frame `frames` for a given hop.
pub fn frames_to_time(frames: usize, sample_rate: f64, hop_length: usize) -> f64 {
    (frames * hop_length) as f64 / sample_rate
}

/// Index of the frame containing `time_seconds`.
pub fn time_to_frames(time_seconds: f64, sample_rate: f64, hop_length: usize) -> usize {
    (time_seconds * sample_rate / hop_length as f64).floor().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slaney_breakpoint() {
        assert!((hz_to_mel(1000.0, MelScale::Slaney) - 15.0).abs() < 1e-12);
        assert!((mel_to_hz(15.0, MelScale::Slaney) - 1000.0).abs() < 1e-9);
        // Linear segment
        assert!((hz_to_mel(100.0, MelScale::Slaney) - 1.5).abs() < 1e-12);
        // Log segment: one log step of 27 mels multiplies frequency by 6.4
        assert!((hz_to_mel(6400.0, MelScale::Slaney) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_reference_values() {
        // Published librosa values
        let cases = [
            (20.0, 0.3, 31.748414),
            (440.0, 6.6, 549.638675),
            (4000.0, 35.163760, 2146.064528),
            (16000.0, 55.327521, 3574.919829),
        ];
        for (hz, slaney, htk) in cases {
            let s = hz_to_mel(hz, MelScale::Slaney);
            let h = hz_to_mel(hz, MelScale::Htk);
            assert!((s - slaney).abs() / slaney < 1e-5, "slaney({hz}) = {s}");
            assert!((h - htk).abs() / htk < 1e-5, "htk({hz}) = {h}");
        }
    }

    #[test]
    fn test_mel_round_trip() {
        for scale in [MelScale::Slaney, MelScale::Htk] {
            let mut hz = 1.0;
            while hz < 30000.0 {
                let back = mel_to_hz(hz_to_mel(hz, scale), scale);
                assert!(
                    (back - hz).abs() <= hz * 1e-10,
                    "{scale:?}: {hz} -> {back}"
                );
                hz *= 1.37;
            }
        }
    }

    #[test]
    fn test_vectorized_matches_scalar() {
        let hz = [0.0, 250.0, 999.9, 1000.0, 5000.0];
        let mels = hz_to_mel_array(&hz, MelScale::Slaney);
        for (m, &f) in mels.iter().zip(hz.iter()) {
            assert_eq!(*m, hz_to_mel(f, MelScale::Slaney));
        }
        let back = mel_to_hz_array(mels.as_slice().unwrap(), MelScale::Slaney);
        for (b, &f) in back.iter().zip(hz.iter()) {
            assert!((b - f).abs() < 1e-9);
        }
    }

    #[test]
    fn test_midi_conversions() {
        assert_eq!(hz_to_midi(440.0).unwrap(), 69.0);
        assert!((hz_to_midi(880.0).unwrap() - 81.0).abs() < 1e-12);
        assert!((midi_to_hz(60.0) - 261.625_565_300_598_6).abs() < 1e-9);
        assert!(matches!(
            hz_to_midi(0.0),
            Err(AudioFeatureError::DomainError { .. })
        ));
        assert!(hz_to_midi(-5.0).is_err());
        assert!(hz_to_midi(f64::NAN).is_err());
        assert!(hz_to_midi_array(&[440.0, 0.0]).is_err());
        assert_eq!(hz_to_midi_array(&[440.0]).unwrap()[0], 69.0);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(hz_to_note(440.0).unwrap(), "A4");
        assert_eq!(hz_to_note(261.63).unwrap(), "C4");
        assert!((note_to_hz("A4").unwrap() - 440.0).abs() < 1e-9);
        assert!((note_to_hz("A").unwrap() - 440.0).abs() < 1e-9);
        assert!((note_to_hz("C#5").unwrap() - midi_to_hz(73.0)).abs() < 1e-9);
        assert!((note_to_hz("Bb3").unwrap() - midi_to_hz(58.0)).abs() < 1e-9);
        assert!((note_to_hz("C-1").unwrap() - midi_to_hz(0.0)).abs() < 1e-12);
        assert!(note_to_hz("H2").is_err());
        assert!(note_to_hz("").is_err());
        assert!(note_to_hz("A4x").is_err());
        // Octaves whose MIDI number overflows i64 are rejected
        assert!(matches!(
            note_to_hz("C999999999999999999"),
            Err(AudioFeatureError::InvalidConfig { .. })
        ));
        assert!(note_to_hz("Cb-999999999999999999").is_err());
    }

    #[test]
    fn test_frequency_grids() {
        let freqs = fft_frequencies(22050.0, 2048);
        assert_eq!(freqs.len(), 1025);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1024] - 11025.0).abs() < 1e-9);

        let mels = mel_frequencies(10, 100.0, 8000.0, MelScale::Htk);
        assert_eq!(mels.len(), 10);
        assert!((mels[0] - 100.0).abs() < 1e-9);
        assert!((mels[9] - 8000.0).abs() < 1e-6);
        assert!(mels.windows(2).into_iter().all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_db_and_time_helpers() {
        assert!((power_to_db(1.0, 1.0, 1e-10) - 0.0).abs() < 1e-12);
        assert!((power_to_db(0.01, 1.0, 1e-10) + 20.0).abs() < 1e-9);
        assert!((power_to_db(0.0, 1.0, 1e-10) + 100.0).abs() < 1e-9);
        assert!((frames_to_time(43, 22050.0, 512) - 0.998_458).abs() < 1e-5);
        assert_eq!(time_to_frames(1.0, 22050.0, 512), 43);
    }
}
