use super::{ConsensusDecider, GroupOrderHistogram};
use crate::core::io::matrix::read_matrix;
use crate::engine::error::EngineError;
use nalgebra::{DMatrix, DVector};
use std::path::Path;

/// Square correction matrix over orders `1..=max_order`, applied to the raw histogram vector.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionMatrix {
    matrix: DMatrix<f64>,
}

impl CorrectionMatrix {
    pub fn from_matrix(matrix: DMatrix<f64>) -> Result<Self, EngineError> {
        let (rows, cols) = matrix.shape();
        if rows == 0 || rows != cols {
            return Err(EngineError::InvalidModel {
                reason: format!("correction matrix must be square and non-empty, got {rows}x{cols}"),
            });
        }
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidModel {
                reason: "correction matrix contains non-finite entries".to_string(),
            });
        }
        Ok(Self { matrix })
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        Self::from_matrix(read_matrix(path)?)
    }

    pub fn max_order(&self) -> u32 {
        self.matrix.nrows() as u32
    }

    /// `M · h` for the histogram vector `h` (index 0 = order 1), truncated or zero-padded to the
    /// matrix size.
    pub fn correct(&self, histogram: &GroupOrderHistogram) -> DVector<f64> {
        let size = self.matrix.nrows();
        let counts = histogram.as_vector();
        let raw = DVector::from_fn(size, |i, _| counts.get(i).copied().unwrap_or(0.0));
        &self.matrix * raw
    }
}

/// Multiplies the histogram by a correction matrix and takes the arg-max.
#[derive(Debug, Clone, Copy)]
pub struct ErrorMatrixDecider<'a> {
    correction: &'a CorrectionMatrix,
}

impl<'a> ErrorMatrixDecider<'a> {
    pub fn new(correction: &'a CorrectionMatrix) -> Self {
        Self { correction }
    }
}

impl ConsensusDecider for ErrorMatrixDecider<'_> {
    fn name(&self) -> &'static str {
        "error-matrix"
    }

    fn decide(&self, histogram: &GroupOrderHistogram) -> u32 {
        let corrected = self.correction.correct(histogram);
        let (index, value) = corrected
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, v)| {
                if v > best.1 { (i, v) } else { best }
            });
        if index == 0 || value <= 0.0 {
            1
        } else {
            index as u32 + 1
        }
    }
}
