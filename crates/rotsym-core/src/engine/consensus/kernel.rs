use super::{ConsensusDecider, GroupOrderHistogram};
use crate::core::io::matrix::read_matrix;
use crate::engine::error::EngineError;
use nalgebra::DMatrix;
use std::path::Path;

const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Row-stochastic confusion kernel over orders `2..=max_order`.
///
/// Entry `(i - 2, j - 2)` is the probability that a structure of true order `i` is observed as
/// order `j` after one divisor step.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionModel {
    matrix: DMatrix<f64>,
}

impl ConfusionModel {
    pub fn from_matrix(matrix: DMatrix<f64>) -> Result<Self, EngineError> {
        let (rows, cols) = matrix.shape();
        if rows == 0 || rows != cols {
            return Err(EngineError::InvalidModel {
                reason: format!("confusion kernel must be square and non-empty, got {rows}x{cols}"),
            });
        }
        if matrix.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(EngineError::InvalidModel {
                reason: "confusion kernel entries must be finite and non-negative".to_string(),
            });
        }
        for (i, row) in matrix.row_iter().enumerate() {
            let sum = row.sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(EngineError::InvalidModel {
                    reason: format!(
                        "confusion kernel row for order {} sums to {}, expected 1",
                        i + 2,
                        sum
                    ),
                });
            }
        }
        Ok(Self { matrix })
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        Self::from_matrix(read_matrix(path)?)
    }

    pub fn identity(max_order: u32) -> Self {
        let size = max_order.max(2) as usize - 1;
        Self {
            matrix: DMatrix::identity(size, size),
        }
    }

    pub fn max_order(&self) -> u32 {
        self.matrix.nrows() as u32 + 1
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

/// Corrects the bias of detectors toward sub-multiples of the true order.
///
/// Each observed order `j` spreads its count over every multiple `i` of `j`, weighted by the
/// `(i / j - 1)`-step composition of the kernel. Whatever mass does not flow upward stays at `j`.
/// The order with the largest accumulated flow wins.
#[derive(Debug, Clone)]
pub struct ErrorKernelDecider<'a> {
    model: &'a ConfusionModel,
    powers: Vec<DMatrix<f64>>,
}

impl<'a> ErrorKernelDecider<'a> {
    pub fn new(model: &'a ConfusionModel) -> Self {
        let max_steps = (model.max_order() / 2) as usize;
        let size = model.matrix.nrows();
        let mut powers = Vec::with_capacity(max_steps + 1);
        powers.push(DMatrix::identity(size, size));
        for m in 1..=max_steps {
            let next = &powers[m - 1] * &model.matrix;
            powers.push(next);
        }
        Self { model, powers }
    }

    fn step_weight(&self, true_order: u32, observed: u32) -> f64 {
        let steps = (true_order / observed - 1) as usize;
        self.powers
            .get(steps)
            .map_or(0.0, |k| k[(true_order as usize - 2, observed as usize - 2)])
    }
}

impl ConsensusDecider for ErrorKernelDecider<'_> {
    fn name(&self) -> &'static str {
        "error-kernel"
    }

    fn decide(&self, histogram: &GroupOrderHistogram) -> u32 {
        let max_order = self.model.max_order();
        let mut flows = vec![0.0; max_order as usize + 1];

        for observed in 2..=max_order {
            let count = histogram.count(observed) as f64;
            if count == 0.0 {
                continue;
            }
            let mut outflow = 0.0;
            for true_order in (2 * observed..=max_order).step_by(observed as usize) {
                let weight = self.step_weight(true_order, observed);
                flows[true_order as usize] += count * weight;
                outflow += weight;
            }
            flows[observed as usize] += count * (1.0 - outflow).max(0.0);
        }

        let mut best_order = 1;
        let mut best_flow = 0.0;
        for order in 2..=max_order {
            if flows[order as usize] > best_flow {
                best_order = order;
                best_flow = flows[order as usize];
            }
        }
        best_order
    }
}
