use super::OrderDetector;
use crate::core::models::alignment::{ResidueMapping, SelfAlignment};
use crate::core::models::order::{Diagnostics, OrderEstimate};
use crate::engine::config::DetectorConfig;
use crate::engine::error::EngineError;
use nalgebra::Point3;
use tracing::debug;

/// Treats the residue mapping as a permutation and finds the cycle length at which repeated
/// application brings residues back to where they started.
///
/// After `n` applications every residue has moved some signed distance from its start; the
/// metric is the root mean square of those distances. The order is the first `n > 1` at which
/// the metric falls below `min_metric_change` times the best metric seen so far.
#[derive(Debug, Clone)]
pub struct CycleDetector {
    max_order: u32,
    min_metric_change: f64,
}

impl CycleDetector {
    pub const NAME: &'static str = "cycle";

    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            max_order: config.max_order,
            min_metric_change: config.min_metric_change,
        }
    }

    /// Runs the cycle search on a bare mapping.
    pub fn order_of(&self, mapping: &ResidueMapping) -> Result<OrderEstimate, EngineError> {
        if mapping.is_empty() {
            return Err(EngineError::geometry("residue mapping is empty"));
        }

        // Residues aligned onto themselves carry no cycle information.
        let preimage: Vec<usize> = mapping
            .iter()
            .filter(|(from, to)| from != to)
            .map(|(&from, _)| from)
            .collect();
        if preimage.is_empty() {
            return Ok(OrderEstimate::no_symmetry().with_diagnostics(Diagnostics::CycleMetrics(
                Vec::new(),
            )));
        }

        let mut image: Vec<Option<usize>> = preimage.iter().copied().map(Some).collect();
        let mut metrics = Vec::with_capacity(self.max_order as usize);
        let mut best_order = 1;
        let mut best_metric = f64::INFINITY;
        let mut found = false;

        for n in 1..=self.max_order {
            let mut sum_sq = 0.0;
            let mut count = 0usize;
            for (slot, &start) in image.iter_mut().zip(&preimage) {
                *slot = slot.and_then(|residue| mapping.get(&residue).copied());
                if let Some(post) = *slot {
                    let delta = post as f64 - start as f64;
                    sum_sq += delta * delta;
                    count += 1;
                }
            }

            let metric = if count == 0 {
                f64::NAN
            } else {
                (sum_sq / count as f64).sqrt()
            };
            metrics.push(metric);

            if !found && metric < best_metric * self.min_metric_change {
                if best_metric.is_finite() {
                    found = true;
                }
                best_order = n;
                best_metric = metric;
            }
            if found {
                break;
            }
        }

        let order = if found { best_order } else { 1 };
        debug!(order, cycles = metrics.len(), "Cycle search finished");
        Ok(OrderEstimate::new(order).with_diagnostics(Diagnostics::CycleMetrics(metrics)))
    }
}

impl OrderDetector for CycleDetector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn detect(
        &self,
        alignment: &SelfAlignment,
        _coords: &[Point3<f64>],
    ) -> Result<OrderEstimate, EngineError> {
        self.order_of(&alignment.mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> CycleDetector {
        CycleDetector::new(&DetectorConfig::default())
    }

    fn shifted(len: usize, shift: usize) -> ResidueMapping {
        (0..len).map(|i| (i, (i + shift) % len)).collect()
    }

    #[test]
    fn identity_mapping_yields_order_one() {
        let mapping: ResidueMapping = (0..40).map(|i| (i, i)).collect();
        let estimate = detector().order_of(&mapping).unwrap();
        assert_eq!(estimate.order(), 1);
    }

    #[test]
    fn cyclic_shift_yields_number_of_repeats() {
        for repeats in 2..=8usize {
            let mapping = shifted(24 * repeats, 24);
            let estimate = detector().order_of(&mapping).unwrap();
            assert_eq!(estimate.order(), repeats as u32, "repeats = {}", repeats);
        }
    }

    #[test]
    fn fixed_points_do_not_count_toward_cycle_length() {
        let mut mapping = shifted(30, 10);
        for i in 30..40 {
            mapping.insert(i, i);
        }
        assert_eq!(detector().order_of(&mapping).unwrap().order(), 3);
    }

    #[test]
    fn partial_mapping_still_finds_order() {
        let mut mapping = shifted(60, 15);
        mapping.remove(&7);
        mapping.remove(&44);
        assert_eq!(detector().order_of(&mapping).unwrap().order(), 4);
    }

    #[test]
    fn order_above_maximum_yields_no_symmetry() {
        let config = DetectorConfig {
            max_order: 4,
            ..DetectorConfig::default()
        };
        let mapping = shifted(60, 10);
        let estimate = CycleDetector::new(&config).order_of(&mapping).unwrap();
        assert_eq!(estimate.order(), 1);
        assert!(matches!(
            estimate.diagnostics,
            Diagnostics::CycleMetrics(ref m) if m.len() == 4
        ));
    }

    #[test]
    fn empty_mapping_is_geometry_undefined() {
        let result = detector().order_of(&ResidueMapping::new());
        assert!(matches!(result, Err(EngineError::GeometryUndefined { .. })));
    }

    #[test]
    fn detect_reads_mapping_from_alignment() {
        let alignment = SelfAlignment::new(shifted(20, 10), vec![], vec![]);
        let estimate = detector().detect(&alignment, &[]).unwrap();
        assert_eq!(estimate.order(), 2);
        assert_eq!(estimate.label().to_string(), "C2");
    }
}
