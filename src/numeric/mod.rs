//! Owned numeric leaf routines: FFT, DCT and dense products.
//!
//! These replace an external scientific-computing backend with routines whose
//! precision and normalization are fixed by this crate.

pub mod dct;
pub mod fft;
pub mod linalg;

pub use dct::{dct_ii, dct_ii_matrix, dct_iii};
pub use fft::FftPlan;
pub use linalg::{matmul, matvec};
