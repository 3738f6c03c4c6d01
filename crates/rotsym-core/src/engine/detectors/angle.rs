use super::OrderDetector;
use super::sampling::require_geometry;
use crate::core::models::alignment::SelfAlignment;
use crate::core::models::order::{Diagnostics, OrderEstimate};
use crate::engine::config::DetectorConfig;
use crate::engine::error::EngineError;
use nalgebra::Point3;
use std::f64::consts::TAU;

/// A candidate must beat the running best by more than this to replace it.
const IMPROVEMENT_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleMetric {
    /// Deviation measured in radians.
    Radians,
    /// Deviation measured as a fraction of the candidate's period.
    Normalized,
}

/// Triangle-wave distance of `angle` from the nearest multiple of `2π / order`.
///
/// Returned in units of one period; the value lies in `[0, 0.5]`.
#[inline]
fn periodic_deviation(angle: f64, order: u32) -> f64 {
    let periods = angle * order as f64 / TAU;
    ((periods - 0.5).abs() % 1.0 - 0.5).abs()
}

/// Picks the order whose ideal angle `2π / k` best explains the measured rotation `theta`.
///
/// Candidates run from 2 to `max_order`; a candidate is accepted only if its deviation is below
/// `threshold` (in the unit implied by `metric`). Returns 1 when no candidate qualifies, together
/// with the winning deviation.
pub fn guess_order(
    theta: f64,
    threshold: f64,
    max_order: u32,
    metric: AngleMetric,
) -> Result<(u32, f64), EngineError> {
    if !theta.is_finite() {
        return Err(EngineError::geometry(format!(
            "rotation angle {} is not finite",
            theta
        )));
    }
    let theta = theta.abs();

    let mut best_order = 1;
    let mut best_delta = threshold;
    for order in 2..=max_order {
        let mut delta = periodic_deviation(theta, order);
        if metric == AngleMetric::Radians {
            delta *= TAU / order as f64;
        }
        if delta < best_delta - IMPROVEMENT_EPSILON {
            best_order = order;
            best_delta = delta;
        }
    }
    Ok((best_order, best_delta))
}

#[derive(Debug, Clone)]
pub struct AngleDetector {
    metric: AngleMetric,
    threshold: f64,
    max_order: u32,
}

impl AngleDetector {
    pub fn new(metric: AngleMetric, config: &DetectorConfig) -> Self {
        let threshold = match metric {
            AngleMetric::Radians => config.angle_threshold,
            AngleMetric::Normalized => config.normalized_angle_threshold,
        };
        Self {
            metric,
            threshold,
            max_order: config.max_order,
        }
    }
}

impl OrderDetector for AngleDetector {
    fn name(&self) -> &'static str {
        match self.metric {
            AngleMetric::Radians => "angle",
            AngleMetric::Normalized => "angle-normalized",
        }
    }

    fn detect(
        &self,
        alignment: &SelfAlignment,
        _coords: &[Point3<f64>],
    ) -> Result<OrderEstimate, EngineError> {
        let geometry = require_geometry(alignment)?;
        let (order, deviation) =
            guess_order(geometry.angle, self.threshold, self.max_order, self.metric)?;
        let diagnostics = if order > 1 {
            Diagnostics::AngleDeviation(deviation)
        } else {
            Diagnostics::None
        };
        Ok(OrderEstimate::new(order).with_diagnostics(diagnostics))
    }
}
