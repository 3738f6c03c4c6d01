use super::OrderDetector;
use super::sampling::{SimilarityCurve, require_geometry, sample_rotations};
use crate::core::fitting::loess::Loess;
use crate::core::models::alignment::SelfAlignment;
use crate::core::models::order::{Diagnostics, OrderEstimate};
use crate::engine::config::{ConfigError, DetectorConfig};
use crate::engine::error::EngineError;
use itertools::Itertools;
use nalgebra::Point3;
use tracing::{debug, instrument};

/// Counts local maxima in a sequence.
///
/// A maximum is recorded each time a rising (or flat) run is followed by a decrease. A curve
/// that starts by falling counts its first sample as a maximum.
pub fn count_peaks(values: &[f64]) -> usize {
    let mut rising = true;
    let mut peaks = 0;
    for (previous, next) in values.iter().tuple_windows() {
        if next < previous {
            if rising {
                peaks += 1;
            }
            rising = false;
        } else {
            rising = true;
        }
    }
    peaks
}

/// Smooths the rotational similarity curve with LOESS and reports the number of maxima as the
/// order.
///
/// The count is reported as-is, including the known off-by-one on some odd-order curves.
#[derive(Debug, Clone)]
pub struct PeakCountingDetector {
    loess: Loess,
    step_degrees: f64,
    d0: f64,
}

impl PeakCountingDetector {
    pub const NAME: &'static str = "peak-counting";

    pub fn new(config: &DetectorConfig) -> Result<Self, EngineError> {
        let loess = Loess::new(config.loess_bandwidth, config.loess_robustness_iterations)
            .map_err(|_| ConfigError::OutOfRange {
                name: "loess_bandwidth",
                value: config.loess_bandwidth,
                expected: "in (0, 1]",
            })?;
        Ok(Self {
            loess,
            step_degrees: config.angle_step_degrees,
            d0: config.similarity_d0,
        })
    }

    pub fn order_from_curve(&self, curve: &SimilarityCurve) -> Result<OrderEstimate, EngineError> {
        let smoothed = self
            .loess
            .smooth(&curve.angles, &curve.values)
            .map_err(|e| EngineError::detection(Self::NAME, e))?;
        let peaks = count_peaks(&smoothed);
        debug!(peaks, "Counted maxima of smoothed similarity curve");
        Ok(OrderEstimate::new(peaks as u32).with_diagnostics(Diagnostics::PeakCount(peaks)))
    }
}

impl OrderDetector for PeakCountingDetector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[instrument(skip_all, name = "peak_counting_detector")]
    fn detect(
        &self,
        alignment: &SelfAlignment,
        coords: &[Point3<f64>],
    ) -> Result<OrderEstimate, EngineError> {
        let geometry = require_geometry(alignment)?;
        let curve = sample_rotations(coords, geometry, self.step_degrees, self.d0, Self::NAME)?;
        self.order_from_curve(&curve)
    }
}
