//! Sample format trait shared by every analysis entry point.

use num_traits::{NumCast, ToPrimitive};
use std::fmt::{Debug, Display};

/// Core trait defining the interface for audio sample types.
///
/// Analysis always runs in `f64`. Floating-point samples are taken as-is,
/// integer samples are scaled into `[-1.0, 1.0)` by their full-scale value,
/// so an `i16` buffer and the equivalent normalized `f32` buffer produce the
/// same features.
///
/// # Supported Types
/// - `i16`: 16-bit signed integer samples
/// - `i32`: 32-bit signed integer samples
/// - `f32`: 32-bit floating-point samples (normalized -1.0 to 1.0)
/// - `f64`: 64-bit floating-point samples (highest precision)
pub trait AudioSample:
    Copy + Default + Debug + Display + PartialEq + PartialOrd + Send + Sync + ToPrimitive + NumCast
{
    /// Full-scale magnitude used to normalize this format.
    const FULL_SCALE: f64;

    /// Converts the sample to a normalized `f64`.
    #[inline]
    fn to_f64_normalized(self) -> f64 {
        self.to_f64().unwrap_or(0.0) / Self::FULL_SCALE
    }
}

impl AudioSample for f32 {
    const FULL_SCALE: f64 = 1.0;

    #[inline]
    fn to_f64_normalized(self) -> f64 {
        self.into()
    }
}

impl AudioSample for f64 {
    const FULL_SCALE: f64 = 1.0;

    #[inline]
    fn to_f64_normalized(self) -> f64 {
        self
    }
}

impl AudioSample for i16 {
    const FULL_SCALE: f64 = 32768.0;
}

impl AudioSample for i32 {
    const FULL_SCALE: f64 = 2_147_483_648.0;
}
