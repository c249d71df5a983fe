//! Owned complex FFT.
//!
//! Power-of-two lengths use an iterative radix-2 Cooley-Tukey transform.
//! Every other length goes through Bluestein's chirp-z algorithm, which
//! re-expresses the DFT as a circular convolution evaluated with a radix-2
//! transform of the next power of two at or above `2n - 1`.
//!
//! Numeric contract:
//! - `forward` is unnormalized: `X[k] = sum_n x[n] * exp(-2*pi*i*n*k / N)`.
//! - `inverse` is scaled by `1 / N`, so `inverse(forward(x)) == x`.
//! - Twiddle factors are evaluated directly from their angle rather than by
//!   recurrence, keeping relative error near 1e-12 for the sizes used in
//!   audio analysis.

use crate::{AudioFeatureError, AudioFeatureResult};
use num_complex::Complex;
use std::f64::consts::PI;

/// A reusable transform plan for one length.
///
/// Plans hold only precomputed tables, so a single plan can be shared across
/// threads and applied to many buffers.
#[derive(Debug, Clone)]
pub struct FftPlan {
    len: usize,
    kind: PlanKind,
}

#[derive(Debug, Clone)]
enum PlanKind {
    Radix2 {
        twiddles: Vec<Complex<f64>>,
        bit_reverse: Vec<usize>,
    },
    Bluestein {
        inner: Box<FftPlan>,
        chirp: Vec<Complex<f64>>,
        kernel_spectrum: Vec<Complex<f64>>,
    },
}

impl FftPlan {
    /// Plans a transform of `len` points.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::InvalidConfig`] if `len` is zero.
    pub fn new(len: usize) -> AudioFeatureResult<Self> {
        if len == 0 {
            return Err(AudioFeatureError::invalid_config(
                "fft_len",
                "must be greater than 0",
            ));
        }
        if len.is_power_of_two() {
            Ok(Self::radix2(len))
        } else {
            Ok(Self::bluestein(len))
        }
    }

    fn radix2(len: usize) -> Self {
        let twiddles = (0..len / 2)
            .map(|k| Complex::from_polar(1.0, -2.0 * PI * k as f64 / len as f64))
            .collect();

        let bits = len.trailing_zeros();
        let bit_reverse = (0..len)
            .map(|i| {
                if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();

        Self {
            len,
            kind: PlanKind::Radix2 {
                twiddles,
                bit_reverse,
            },
        }
    }

    fn bluestein(len: usize) -> Self {
        let conv_len = (2 * len - 1).next_power_of_two();
        let inner = Self::radix2(conv_len);

        // k^2 is reduced modulo 2n before scaling so the angle stays small
        let two_n = 2 * len as u128;
        let chirp: Vec<Complex<f64>> = (0..len)
            .map(|k| {
                let k2 = (k as u128 * k as u128) % two_n;
                Complex::from_polar(1.0, -PI * k2 as f64 / len as f64)
            })
            .collect();

        let mut kernel = vec![Complex::new(0.0, 0.0); conv_len];
        kernel[0] = chirp[0].conj();
        for k in 1..len {
            let c = chirp[k].conj();
            kernel[k] = c;
            kernel[conv_len - k] = c;
        }
        inner.radix2_in_place(&mut kernel);

        Self {
            len,
            kind: PlanKind::Bluestein {
                inner: Box::new(inner),
                chirp,
                kernel_spectrum: kernel,
            },
        }
    }

    /// Transform length.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Always false; plans are never empty.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Number of non-negative frequency bins for a real input of this length.
    pub const fn n_bins(&self) -> usize {
        self.len / 2 + 1
    }

    /// In-place forward transform.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::DimensionMismatch`] if `buffer` is not `len()` long.
    pub fn forward(&self, buffer: &mut [Complex<f64>]) -> AudioFeatureResult<()> {
        self.check_len(buffer.len())?;
        match &self.kind {
            PlanKind::Radix2 { .. } => self.radix2_in_place(buffer),
            PlanKind::Bluestein {
                inner,
                chirp,
                kernel_spectrum,
            } => {
                let m = inner.len;
                let mut work = vec![Complex::new(0.0, 0.0); m];
                for ((w, &x), &c) in work.iter_mut().zip(buffer.iter()).zip(chirp.iter()) {
                    *w = x * c;
                }
                inner.radix2_in_place(&mut work);
                for (w, &k) in work.iter_mut().zip(kernel_spectrum.iter()) {
                    *w *= k;
                }
                inner.radix2_inverse_in_place(&mut work);
                for ((out, &w), &c) in buffer.iter_mut().zip(work.iter()).zip(chirp.iter()) {
                    *out = w * c;
                }
            }
        }
        Ok(())
    }

    /// In-place inverse transform, scaled by `1 / len()`.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::DimensionMismatch`] if `buffer` is not `len()` long.
    pub fn inverse(&self, buffer: &mut [Complex<f64>]) -> AudioFeatureResult<()> {
        self.check_len(buffer.len())?;
        buffer.iter_mut().for_each(|c| *c = c.conj());
        self.forward(buffer)?;
        let scale = 1.0 / self.len as f64;
        buffer.iter_mut().for_each(|c| *c = c.conj() * scale);
        Ok(())
    }

    /// Forward transform of a real signal, keeping the `len() / 2 + 1`
    /// non-negative frequency bins.
    ///
    /// # Errors
    /// Returns [`AudioFeatureError::DimensionMismatch`] if `input` is not `len()` long.
    pub fn real_forward(&self, input: &[f64]) -> AudioFeatureResult<Vec<Complex<f64>>> {
        self.check_len(input.len())?;
        let mut buffer: Vec<Complex<f64>> = input.iter().map(|&x| Complex::new(x, 0.0)).collect();
        self.forward(&mut buffer)?;
        buffer.truncate(self.n_bins());
        Ok(buffer)
    }

    fn check_len(&self, actual: usize) -> AudioFeatureResult<()> {
        if actual != self.len {
            return Err(AudioFeatureError::DimensionMismatch(format!(
                "FFT plan expects {} points, got {}",
                self.len, actual
            )));
        }
        Ok(())
    }

    fn radix2_in_place(&self, buffer: &mut [Complex<f64>]) {
        let PlanKind::Radix2 {
            twiddles,
            bit_reverse,
        } = &self.kind
        else {
            return;
        };
        let n = self.len;

        for (i, &j) in bit_reverse.iter().enumerate() {
            if i < j {
                buffer.swap(i, j);
            }
        }

        let mut size = 2;
        while size <= n {
            let half = size / 2;
            let stride = n / size;
            for start in (0..n).step_by(size) {
                for k in 0..half {
                    let w = twiddles[k * stride];
                    let a = buffer[start + k];
                    let b = buffer[start + k + half] * w;
                    buffer[start + k] = a + b;
                    buffer[start + k + half] = a - b;
                }
            }
            size *= 2;
        }
    }

    fn radix2_inverse_in_place(&self, buffer: &mut [Complex<f64>]) {
        buffer.iter_mut().for_each(|c| *c = c.conj());
        self.radix2_in_place(buffer);
        let scale = 1.0 / self.len as f64;
        buffer.iter_mut().for_each(|c| *c = c.conj() * scale);
    }
}
