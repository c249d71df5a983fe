//! Global tempo estimation from an onset envelope.
//!
//! The envelope's autocorrelation (normalized so lag 0 is 1) is evaluated
//! over the lags that correspond to `min_bpm..=max_bpm`. Each lag is scored
//! by its autocorrelation times a log-normal prior on tempo,
//!
//! `prior(bpm) = exp(-0.5 * ((log2(bpm) - log2(start_bpm)) / std_bpm)^2)`,
//!
//! and local maxima of the score become ranked candidates. The best candidate
//! is refined to a fractional lag by parabolic interpolation. With
//! `octave_check` set, the period is then halved while the autocorrelation
//! around half the lag carries at least half the mass found around the chosen
//! lag; this recovers fast tempi whose sub-frame period smears their own peak
//! below that of the doubled period.
//!
//! An envelope without energy (silence) has a degenerate autocorrelation; the
//! estimate then falls back to `start_bpm`, the prior's mode.

use super::onset_detection::onset_strength;
use super::types::{OnsetConfig, TempoConfig};
use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, trace, warn};

/// One local maximum of the prior-weighted autocorrelation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoCandidate {
    /// Tempo implied by the refined lag
    pub bpm: f64,
    /// Lag in frames after parabolic refinement
    pub lag: f64,
    /// Prior-weighted autocorrelation at the integer lag
    pub score: f64,
    /// Normalized autocorrelation at the integer lag
    pub autocorrelation: f64,
}

/// Result of tempo estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Estimated tempo in beats per minute
    pub bpm: f64,
    /// Candidates ranked by descending score (ties go to the shorter lag).
    /// Empty when the estimate fell back to the prior's mode.
    pub candidates: Vec<TempoCandidate>,
    /// Autocorrelation of the envelope normalized by its lag-0 value, for
    /// lags `0..=max_lag` (all zero for silent envelopes)
    pub autocorrelation: Array1<f64>,
}

impl TempoEstimate {
    /// The `k` highest-scoring candidates.
    pub fn top_candidates(&self, k: usize) -> &[TempoCandidate] {
        &self.candidates[..k.min(self.candidates.len())]
    }

    /// True if the envelope carried no usable periodicity and `bpm` is the
    /// prior's mode.
    pub fn is_fallback(&self) -> bool {
        self.candidates.is_empty()
    }

    fn fallback(config: &TempoConfig, autocorrelation: Array1<f64>) -> Self {
        Self {
            bpm: config.start_bpm,
            candidates: Vec::new(),
            autocorrelation,
        }
    }
}

/// Log-normal tempo prior, 1 at `start_bpm`.
pub fn tempo_prior(bpm: f64, start_bpm: f64, std_bpm: f64) -> f64 {
    let z = (bpm.log2() - start_bpm.log2()) / std_bpm;
    (-0.5 * z * z).exp()
}

/// Autocorrelation `ac[l] = sum_t env[t] * env[t + l]` for `l = 0..=max_lag`,
/// divided by `ac[0]`. Returns zeros if `ac[0]` is zero.
pub fn autocorrelate(envelope: ArrayView1<'_, f64>, max_lag: usize) -> Array1<f64> {
    let n = envelope.len();
    let n_lags = (max_lag + 1).min(n);
    let mut ac = Array1::zeros(n_lags);
    for (lag, value) in ac.iter_mut().enumerate() {
        let mut acc = 0.0;
        for t in 0..n - lag {
            acc += envelope[t] * envelope[t + lag];
        }
        *value = acc;
    }
    match ac.first().copied() {
        Some(energy) if energy > 0.0 => ac.mapv_inplace(|x| x / energy),
        _ => ac.fill(0.0),
    }
    ac
}

/// Estimates the tempo of `samples` from their onset strength envelope.
///
/// # Errors
/// Propagates configuration and length errors from onset detection, and
/// returns [`AudioFeatureError::InvalidConfig`] for an invalid tempo configuration.
pub fn tempo(
    samples: &[f64],
    sample_rate: f64,
    onset: &OnsetConfig,
    config: &TempoConfig,
) -> AudioFeatureResult<TempoEstimate> {
    config.validate()?;
    let envelope = onset_strength(samples, sample_rate, onset)?;
    let frame_rate = sample_rate / onset.stft.hop_length as f64;
    estimate_tempo(envelope.view(), frame_rate, config)
}

/// Estimates the tempo of an onset envelope sampled at `frame_rate` frames per second.
///
/// # Arguments
/// * `envelope` - Onset strength, one value per frame
/// * `frame_rate` - `sample_rate / hop_length`
/// * `config` - Search range, prior and octave handling
///
/// # Returns
/// The estimate and its ranked candidates. Silent or too-short envelopes
/// yield `config.start_bpm` with no candidates.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if `config` is invalid or
/// `frame_rate` is not positive.
pub fn estimate_tempo(
    envelope: ArrayView1<'_, f64>,
    frame_rate: f64,
    config: &TempoConfig,
) -> AudioFeatureResult<TempoEstimate> {
    config.validate()?;
    if !(frame_rate > 0.0) || !frame_rate.is_finite() {
        return Err(AudioFeatureError::invalid_config(
            "frame_rate",
            "must be a positive rate",
        ));
    }

    let n = envelope.len();
    // Fractional lags of the range bounds; integer lags stay inside them
    let shortest = 60.0 * frame_rate / config.max_bpm;
    let longest = 60.0 * frame_rate / config.min_bpm;
    let min_lag = (shortest.ceil() as usize).max(1);
    let max_lag = (longest.floor() as usize).min(n.saturating_sub(1));
    debug!(
        n_frames = n,
        frame_rate,
        min_lag,
        max_lag,
        start_bpm = config.start_bpm,
        "estimating tempo"
    );

    // One extra lag so the neighbourhood of max_lag is defined
    let ac = autocorrelate(envelope, max_lag + 1);
    if max_lag < min_lag || ac.iter().all(|&x| x == 0.0) {
        warn!(
            n_frames = n,
            fallback_bpm = config.start_bpm,
            "onset envelope has no usable periodicity; using the prior's mode"
        );
        return Ok(TempoEstimate::fallback(config, ac));
    }

    let lag_to_bpm = |lag: f64| 60.0 * frame_rate / lag;
    let refine_in_range = |lag: usize| refine_lag(ac.view(), lag).clamp(shortest, longest);
    let scores: Vec<f64> = (min_lag..=max_lag)
        .map(|lag| ac[lag] * tempo_prior(lag_to_bpm(lag as f64), config.start_bpm, config.std_bpm))
        .collect();

    let mut peaks: Vec<usize> = (0..scores.len())
        .filter(|&i| {
            let s = scores[i];
            let left = if i == 0 { f64::NEG_INFINITY } else { scores[i - 1] };
            let right = scores.get(i + 1).copied().unwrap_or(f64::NEG_INFINITY);
            s > 0.0 && s >= left && s > right
        })
        .collect();
    peaks.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal).then(a.cmp(&b)));

    let candidates: Vec<TempoCandidate> = peaks
        .iter()
        .map(|&i| {
            let lag = min_lag + i;
            let refined = refine_in_range(lag);
            TempoCandidate {
                bpm: lag_to_bpm(refined).clamp(config.min_bpm, config.max_bpm),
                lag: refined,
                score: scores[i],
                autocorrelation: ac[lag],
            }
        })
        .collect();

    let Some(best) = peaks.first().map(|&i| min_lag + i) else {
        warn!(
            fallback_bpm = config.start_bpm,
            "autocorrelation has no positive peak in the tempo range; using the prior's mode"
        );
        return Ok(TempoEstimate::fallback(config, ac));
    };

    let mut lag = best;
    if config.octave_check {
        lag = halve_while_supported(ac.view(), lag, |l| lag_to_bpm(l as f64) <= config.max_bpm);
        if lag != best {
            trace!(from = best, to = lag, "octave check moved to half period");
        }
    }

    let bpm = lag_to_bpm(refine_in_range(lag)).clamp(config.min_bpm, config.max_bpm);
    debug!(bpm, n_candidates = candidates.len(), "tempo estimated");
    Ok(TempoEstimate {
        bpm,
        candidates,
        autocorrelation: ac,
    })
}

/// Fractional lag of the parabola through `ac[lag - 1..=lag + 1]`, with the
/// vertex offset limited to half a frame. Returns `lag` unchanged at the
/// array edges or when the three points are not concave.
fn refine_lag(ac: ArrayView1<'_, f64>, lag: usize) -> f64 {
    if lag == 0 || lag + 1 >= ac.len() {
        return lag as f64;
    }
    let (a, b, c) = (ac[lag - 1], ac[lag], ac[lag + 1]);
    let curvature = a - 2.0 * b + c;
    if curvature >= 0.0 {
        return lag as f64;
    }
    let offset = (0.5 * (a - c) / curvature).clamp(-0.5, 0.5);
    lag as f64 + offset
}

fn neighbourhood(ac: ArrayView1<'_, f64>, lag: usize) -> f64 {
    let lo = lag.saturating_sub(1);
    let hi = (lag + 1).min(ac.len().saturating_sub(1));
    (lo..=hi).map(|l| ac[l]).sum()
}

fn halve_while_supported(ac: ArrayView1<'_, f64>, mut lag: usize, in_range: impl Fn(usize) -> bool) -> usize {
    loop {
        let half = (refine_lag(ac, lag) / 2.0).round() as usize;
        if half < 2 || !in_range(half) {
            return lag;
        }
        // Strongest lag adjacent to the half period
        let Some(peak) = (half - 1..=half + 1)
            .filter(|&l| l < ac.len())
            .max_by(|&a, &b| ac[a].partial_cmp(&ac[b]).unwrap_or(Ordering::Equal))
        else {
            return lag;
        };
        if peak >= lag || neighbourhood(ac, peak) < 0.5 * neighbourhood(ac, lag) {
            return lag;
        }
        lag = peak;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::generation::{click_train, impulse_train, silence};
    use ndarray::array;
    use std::time::Duration;

    fn within_percent(estimate: f64, truth: f64, percent: f64) -> bool {
        (estimate - truth).abs() <= truth * percent / 100.0
    }

    #[test]
    fn test_impulse_trains_within_five_percent() {
        let sample_rate = 22050;
        for bpm in [60.0, 90.0, 120.0, 150.0, 180.0] {
            let samples = impulse_train(bpm, Duration::from_secs(20), sample_rate, 1.0).unwrap();
            let estimate = tempo(
                &samples,
                f64::from(sample_rate),
                &OnsetConfig::new(),
                &TempoConfig::new(),
            )
            .unwrap();
            assert!(
                within_percent(estimate.bpm, bpm, 5.0),
                "{bpm} BPM estimated as {}",
                estimate.bpm
            );
            assert!(!estimate.is_fallback());
        }
    }

    #[test]
    fn test_click_train_tempo() {
        let samples = click_train(
            100.0,
            Duration::from_secs(12),
            22050,
            1500.0,
            Duration::from_millis(20),
        )
        .unwrap();
        let estimate = tempo(&samples, 22050.0, &OnsetConfig::new(), &TempoConfig::new()).unwrap();
        assert!(within_percent(estimate.bpm, 100.0, 5.0), "{}", estimate.bpm);
    }

    #[test]
    fn test_silence_falls_back_to_prior_mode() {
        let samples = silence(Duration::from_secs(5), 22050);
        let mut config = TempoConfig::new();
        config.start_bpm = 96.0;
        let estimate = tempo(&samples, 22050.0, &OnsetConfig::new(), &config).unwrap();
        assert_eq!(estimate.bpm, 96.0);
        assert!(estimate.is_fallback());
        assert!(estimate.autocorrelation.iter().all(|&x| x == 0.0));

        let short = estimate_tempo(array![0.0, 1.0, 0.0].view(), 43.0, &TempoConfig::new()).unwrap();
        assert_eq!(short.bpm, 120.0);
        assert!(estimate_tempo(Array1::zeros(0).view(), 43.0, &TempoConfig::new()).unwrap().is_fallback());
    }

    #[test]
    fn test_candidates_are_ranked() {
        // Pulses every 20 frames at 40 frames per second: 120 BPM
        let envelope = Array1::from_shape_fn(800, |t| if t % 20 == 0 { 1.0 } else { 0.0 });
        let estimate = estimate_tempo(envelope.view(), 40.0, &TempoConfig::new()).unwrap();
        assert!((estimate.bpm - 120.0).abs() < 1e-9);

        let top = estimate.top_candidates(3);
        assert_eq!(top.len(), 3);
        assert!((top[0].bpm - 120.0).abs() < 1e-9);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
        // Multiples of the period follow: 60 BPM outranks 40 BPM
        assert!((top[1].bpm - 60.0).abs() < 1e-9);
        assert!(estimate.top_candidates(100).len() <= estimate.candidates.len());
    }

    #[test]
    fn test_candidates_stay_inside_search_range() {
        // A pulse every 8 frames is about 323 BPM, just above the default range
        let frame_rate = 22050.0 / 512.0;
        let envelope = Array1::from_shape_fn(1000, |t| if t % 8 == 0 { 1.0 } else { 0.0 });
        let config = TempoConfig::new();
        let estimate = estimate_tempo(envelope.view(), frame_rate, &config).unwrap();
        assert!(!estimate.candidates.is_empty());
        for candidate in &estimate.candidates {
            assert!(
                (config.min_bpm..=config.max_bpm).contains(&candidate.bpm),
                "candidate at {} BPM",
                candidate.bpm
            );
        }
        assert!((config.min_bpm..=config.max_bpm).contains(&estimate.bpm));

        // Narrow ranges are honoured by every candidate too
        let mut narrow = TempoConfig::new();
        narrow.min_bpm = 100.0;
        narrow.max_bpm = 170.0;
        let estimate = estimate_tempo(envelope.view(), frame_rate, &narrow).unwrap();
        assert!(
            estimate
                .candidates
                .iter()
                .all(|c| (100.0..=170.0).contains(&c.bpm))
        );
    }

    #[test]
    fn test_octave_check_prefers_half_period() {
        // Period of 14.5 frames alternates between 14 and 15, splitting its
        // own peak while the doubled period (29) stays sharp
        let envelope = Array1::from_shape_fn(1200, |t| {
            let phase = (t as f64 / 14.5).fract();
            if phase < 1.0 / 14.5 { 1.0 } else { 0.0 }
        });
        let frame_rate = 43.0;
        let expected = 60.0 * frame_rate / 14.5;

        let checked = estimate_tempo(envelope.view(), frame_rate, &TempoConfig::new()).unwrap();
        assert!(within_percent(checked.bpm, expected, 5.0), "{}", checked.bpm);

        let mut config = TempoConfig::new();
        config.octave_check = false;
        let unchecked = estimate_tempo(envelope.view(), frame_rate, &config).unwrap();
        assert!(within_percent(unchecked.bpm, expected / 2.0, 5.0), "{}", unchecked.bpm);
    }

    #[test]
    fn test_prior_and_autocorrelation() {
        assert_eq!(tempo_prior(120.0, 120.0, 1.0), 1.0);
        assert!((tempo_prior(60.0, 120.0, 1.0) - (-0.5f64).exp()).abs() < 1e-12);
        assert!((tempo_prior(240.0, 120.0, 1.0) - tempo_prior(60.0, 120.0, 1.0)).abs() < 1e-12);

        let ac = autocorrelate(array![1.0, 0.0, 1.0, 0.0].view(), 3);
        assert_eq!(ac, array![1.0, 0.0, 0.5, 0.0]);
        assert_eq!(autocorrelate(array![0.0, 0.0].view(), 5), array![0.0, 0.0]);
    }

    #[test]
    fn test_parabolic_refinement() {
        let ac = array![0.0, 0.5, 1.0, 0.5, 0.0];
        assert_eq!(refine_lag(ac.view(), 2), 2.0);
        let skewed = array![0.0, 0.8, 1.0, 0.2, 0.0];
        let refined = refine_lag(skewed.view(), 2);
        assert!(refined < 2.0 && refined > 1.5);
        assert_eq!(refine_lag(skewed.view(), 4), 4.0);
    }

    #[test]
    fn test_invalid_arguments() {
        let envelope = Array1::from_elem(100, 1.0);
        assert!(estimate_tempo(envelope.view(), 0.0, &TempoConfig::new()).is_err());
        let mut config = TempoConfig::new();
        config.min_bpm = 200.0;
        config.max_bpm = 100.0;
        assert!(estimate_tempo(envelope.view(), 43.0, &config).is_err());
    }
}
