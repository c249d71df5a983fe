//! Dense matrix products with a fixed accumulation order.
//!
//! Each output element is accumulated in `f64` over the shared dimension in
//! ascending index order, so results do not depend on the caller's thread
//! count or on BLAS availability. Exact zeros in the left operand are skipped,
//! which makes applying a (mostly sparse) filterbank cheap.

use crate::{AudioFeatureError, AudioFeatureResult};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// `matrix · vector`.
///
/// # Errors
/// Returns [`AudioFeatureError::DimensionMismatch`] if the inner dimensions differ.
pub fn matvec(
    matrix: ArrayView2<'_, f64>,
    vector: ArrayView1<'_, f64>,
) -> AudioFeatureResult<Array1<f64>> {
    let (rows, cols) = matrix.dim();
    if cols != vector.len() {
        return Err(AudioFeatureError::DimensionMismatch(format!(
            "matrix has {cols} columns but vector has {} elements",
            vector.len()
        )));
    }

    let mut out = Array1::zeros(rows);
    for (o, row) in out.iter_mut().zip(matrix.rows()) {
        let mut acc = 0.0;
        for (&a, &x) in row.iter().zip(vector.iter()) {
            acc += a * x;
        }
        *o = acc;
    }
    Ok(out)
}

/// `lhs · rhs`.
///
/// # Errors
/// Returns [`AudioFeatureError::DimensionMismatch`] if the inner dimensions differ.
pub fn matmul(lhs: ArrayView2<'_, f64>, rhs: ArrayView2<'_, f64>) -> AudioFeatureResult<Array2<f64>> {
    let (rows, inner) = lhs.dim();
    let (rhs_rows, cols) = rhs.dim();
    if inner != rhs_rows {
        return Err(AudioFeatureError::DimensionMismatch(format!(
            "cannot multiply ({rows}, {inner}) by ({rhs_rows}, {cols})"
        )));
    }

    let mut out = Array2::zeros((rows, cols));
    for (mut out_row, lhs_row) in out.rows_mut().into_iter().zip(lhs.rows()) {
        for (k, &weight) in lhs_row.iter().enumerate() {
            if weight != 0.0 {
                out_row.scaled_add(weight, &rhs.row(k));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_matvec() {
        let m = array![[1.0, 2.0, 0.0], [0.0, -1.0, 3.0]];
        let v = array![1.0, 1.0, 2.0];
        assert_eq!(matvec(m.view(), v.view()).unwrap(), array![3.0, 5.0]);
        assert!(matvec(m.view(), array![1.0].view()).is_err());
    }

    #[test]
    fn test_matmul_matches_ndarray_dot() {
        let a = array![[0.5, 0.0, 1.5], [2.0, -1.0, 0.0]];
        let b = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let ours = matmul(a.view(), b.view()).unwrap();
        let reference = a.dot(&b);
        for (x, y) in ours.iter().zip(reference.iter()) {
            assert!((x - y).abs() < 1e-12);
        }
        assert!(matches!(
            matmul(b.view(), b.view()),
            Err(AudioFeatureError::DimensionMismatch(_))
        ));
    }
}
