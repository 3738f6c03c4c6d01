//! Numerical fitting used by the curve-based order detectors.
//!
//! - [`least_squares`] - Dense linear least squares via SVD
//! - [`loess`] - Locally weighted linear regression with robustness iterations

pub mod least_squares;
pub mod loess;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FitError {
    #[error("Input lengths differ: {x} abscissae vs {y} ordinates")]
    LengthMismatch { x: usize, y: usize },

    #[error("Cannot fit an empty data set")]
    Empty,

    #[error("System is underdetermined: {rows} observations for {cols} unknowns")]
    Underdetermined { rows: usize, cols: usize },

    #[error("Abscissae must be strictly increasing (violated at index {0})")]
    UnsortedAbscissa(usize),

    #[error("Bandwidth {bandwidth} covers fewer than two of {points} points")]
    BandwidthTooSmall { bandwidth: f64, points: usize },

    #[error("Bandwidth must lie in (0, 1], got {0}")]
    InvalidBandwidth(f64),

    #[error("Singular system: {0}")]
    Singular(&'static str),

    #[error("Input contains non-finite values")]
    NonFinite,
}
