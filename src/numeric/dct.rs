//! Orthonormal DCT-II and its inverse.
//!
//! `D[k, n] = s_k * cos(pi * k * (2n + 1) / (2N))` with `s_0 = sqrt(1/N)` and
//! `s_k = sqrt(2/N)` otherwise. The full square matrix is orthogonal, so the
//! inverse (an orthonormal DCT-III) is its transpose.

use super::linalg;
use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::{Array1, Array2, ArrayView1};
use std::f64::consts::PI;

/// Builds the first `n_out` rows of the `n_in`-point orthonormal DCT-II matrix.
///
/// # Errors
/// Returns [`AudioFeatureError::InvalidConfig`] if either size is zero or
/// `n_out > n_in`.
pub fn dct_ii_matrix(n_out: usize, n_in: usize) -> AudioFeatureResult<Array2<f64>> {
    if n_out == 0 || n_in == 0 {
        return Err(AudioFeatureError::invalid_config(
            "dct_size",
            "input and output sizes must be greater than 0",
        ));
    }
    if n_out > n_in {
        return Err(AudioFeatureError::invalid_config(
            "dct_size",
            format!("cannot keep {n_out} coefficients of a {n_in}-point transform"),
        ));
    }

    let n = n_in as f64;
    let dc_scale = (1.0 / n).sqrt();
    let ac_scale = (2.0 / n).sqrt();

    Ok(Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { dc_scale } else { ac_scale };
        scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()
    }))
}

/// First `n_out` orthonormal DCT-II coefficients of `input`.
pub fn dct_ii(input: ArrayView1<'_, f64>, n_out: usize) -> AudioFeatureResult<Array1<f64>> {
    let basis = dct_ii_matrix(n_out, input.len())?;
    linalg::matvec(basis.view(), input)
}

/// Reconstructs an `n_out`-point signal from (possibly truncated) orthonormal
/// DCT-II coefficients. Missing high-order coefficients are taken as zero.
pub fn dct_iii(coefficients: ArrayView1<'_, f64>, n_out: usize) -> AudioFeatureResult<Array1<f64>> {
    let basis = dct_ii_matrix(coefficients.len(), n_out)?;
    linalg::matvec(basis.t(), coefficients)
}
