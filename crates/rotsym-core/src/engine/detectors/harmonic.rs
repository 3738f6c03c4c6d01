use super::sampling::{SimilarityCurve, require_geometry, sample_rotations};
use super::{DetectorKind, OrderDetector};
use crate::core::fitting::least_squares::fit_linear;
use crate::core::models::alignment::SelfAlignment;
use crate::core::models::order::{Diagnostics, OrderEstimate};
use crate::core::utils::geometry::wrap_angle;
use crate::engine::config::DetectorConfig;
use crate::engine::error::EngineError;
use nalgebra::{DMatrix, DVector, Point3};
use std::f64::consts::PI;
use tracing::{debug, instrument};

/// Coefficients at or below this are treated as absent.
const MIN_COEFFICIENT: f64 = 1e-9;

/// Periodic basis function evaluated at `order * angle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisFunction {
    Cosine,
    /// Triangle wave with the same period and range as the cosine, peaking at multiples of `2π`.
    Cusp,
}

impl BasisFunction {
    #[inline]
    pub fn evaluate(&self, order: u32, angle: f64) -> f64 {
        let phase = order as f64 * angle;
        match self {
            BasisFunction::Cosine => phase.cos(),
            BasisFunction::Cusp => 1.0 - 2.0 * wrap_angle(phase).abs() / PI,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStrategy {
    /// One joint fit with a coefficient per order `1..=max_order`, optionally with a constant term.
    Series { intercept: bool },
    /// Separate `a + b·f(kθ)` fits per order, keeping the largest amplitude `b`.
    ByAmplitude,
    /// Separate `a + b·f(kθ)` fits per order, keeping the smallest residual error.
    ByError,
}

/// Fits periodic bases to the rotational similarity curve and reads the order off the
/// dominant frequency.
#[derive(Debug, Clone)]
pub struct HarmonicDetector {
    kind: DetectorKind,
    basis: BasisFunction,
    strategy: FitStrategy,
    max_order: u32,
    step_degrees: f64,
    d0: f64,
}

impl HarmonicDetector {
    pub fn new(
        kind: DetectorKind,
        basis: BasisFunction,
        strategy: FitStrategy,
        config: &DetectorConfig,
    ) -> Self {
        Self {
            kind,
            basis,
            strategy,
            max_order: config.max_order,
            step_degrees: config.angle_step_degrees,
            d0: config.similarity_d0,
        }
    }

    /// Determines the order from an already sampled curve.
    pub fn order_from_curve(&self, curve: &SimilarityCurve) -> Result<OrderEstimate, EngineError> {
        match self.strategy {
            FitStrategy::Series { intercept } => self.fit_series(curve, intercept),
            FitStrategy::ByAmplitude | FitStrategy::ByError => self.fit_single(curve),
        }
    }

    fn fit_series(
        &self,
        curve: &SimilarityCurve,
        intercept: bool,
    ) -> Result<OrderEstimate, EngineError> {
        let offset = usize::from(intercept);
        let cols = self.max_order as usize + offset;
        let design = DMatrix::from_fn(curve.len(), cols, |r, c| {
            if c < offset {
                1.0
            } else {
                self.basis.evaluate((c - offset + 1) as u32, curve.angles[r])
            }
        });
        let observations = DVector::from_column_slice(&curve.values);
        let fit = fit_linear(&design, &observations)
            .map_err(|e| EngineError::detection(self.kind.name(), e))?;

        let coefficients: Vec<f64> = fit.coefficients.iter().skip(offset).copied().collect();
        let (best_index, best_value) = arg_max(&coefficients);
        let order = if best_index == 0 || best_value <= MIN_COEFFICIENT {
            1
        } else {
            best_index as u32 + 1
        };

        debug!(detector = self.kind.name(), order, "Series fit finished");
        Ok(OrderEstimate::new(order).with_diagnostics(Diagnostics::Coefficients(coefficients)))
    }

    fn fit_single(&self, curve: &SimilarityCurve) -> Result<OrderEstimate, EngineError> {
        let observations = DVector::from_column_slice(&curve.values);
        let mut amplitudes = Vec::with_capacity(self.max_order as usize);
        let mut errors = Vec::with_capacity(self.max_order as usize);

        for order in 1..=self.max_order {
            let design = DMatrix::from_fn(curve.len(), 2, |r, c| {
                if c == 0 {
                    1.0
                } else {
                    self.basis.evaluate(order, curve.angles[r])
                }
            });
            let fit = fit_linear(&design, &observations)
                .map_err(|e| EngineError::detection(self.kind.name(), e))?;
            amplitudes.push(fit.coefficients[1]);
            errors.push(fit.sse);
        }

        let (order, diagnostics) = match self.strategy {
            FitStrategy::ByError => {
                let best = errors
                    .iter()
                    .zip(&amplitudes)
                    .enumerate()
                    .filter(|(_, (_, amplitude))| **amplitude > MIN_COEFFICIENT)
                    .min_by(|(_, (a, _)), (_, (b, _))| a.total_cmp(b))
                    .map(|(index, _)| index);
                (best.map_or(1, |i| i as u32 + 1), Diagnostics::FitErrors(errors))
            }
            _ => {
                let (index, amplitude) = arg_max(&amplitudes);
                let order = if amplitude > MIN_COEFFICIENT {
                    index as u32 + 1
                } else {
                    1
                };
                (order, Diagnostics::Coefficients(amplitudes))
            }
        };

        debug!(detector = self.kind.name(), order, "Single-harmonic fit finished");
        Ok(OrderEstimate::new(order).with_diagnostics(diagnostics))
    }
}

impl OrderDetector for HarmonicDetector {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    #[instrument(skip_all, name = "harmonic_detector", fields(detector = self.kind.name()))]
    fn detect(
        &self,
        alignment: &SelfAlignment,
        coords: &[Point3<f64>],
    ) -> Result<OrderEstimate, EngineError> {
        let geometry = require_geometry(alignment)?;
        let curve = sample_rotations(
            coords,
            geometry,
            self.step_degrees,
            self.d0,
            self.kind.name(),
        )?;
        self.order_from_curve(&curve)
    }
}

/// Index and value of the largest entry; the first one wins ties.
fn arg_max(values: &[f64]) -> (usize, f64) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, v)| {
            if v > best.1 { (i, v) } else { best }
        })
}
