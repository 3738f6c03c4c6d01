use super::OrderDetector;
use crate::core::models::alignment::{ResidueMapping, SelfAlignment};
use crate::core::models::case::BenchmarkCase;
use crate::core::models::order::{Diagnostics, OrderEstimate};
use crate::engine::config::DetectorConfig;
use crate::engine::error::EngineError;
use nalgebra::Point3;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

pub type AlignmentEngineError = Box<dyn Error + Send + Sync>;

/// The external structural aligner, re-run with previously found alignments excluded.
pub trait AlignmentEngine: Send + Sync {
    /// Produces one more self-alignment of `structure` that differs from everything in `found`,
    /// or `None` when no further alignment exists within `max_order`.
    fn realign(
        &self,
        structure: &SelfAlignment,
        max_order: u32,
        found: &[ResidueMapping],
    ) -> Result<Option<SelfAlignment>, AlignmentEngineError>;
}

/// Replays self-alignments recorded from a previous run of the aligner.
#[derive(Debug, Clone, Default)]
pub struct RecordedAlignmentEngine {
    recorded: Vec<ResidueMapping>,
}

impl RecordedAlignmentEngine {
    pub fn new(recorded: Vec<ResidueMapping>) -> Self {
        Self { recorded }
    }

    /// The case's primary mapping followed by its recorded alternatives.
    pub fn from_case(case: &BenchmarkCase) -> Self {
        let recorded = std::iter::once(case.alignment.mapping.clone())
            .chain(case.alternatives.iter().cloned())
            .collect();
        Self { recorded }
    }
}

impl AlignmentEngine for RecordedAlignmentEngine {
    fn realign(
        &self,
        structure: &SelfAlignment,
        _max_order: u32,
        found: &[ResidueMapping],
    ) -> Result<Option<SelfAlignment>, AlignmentEngineError> {
        Ok(self
            .recorded
            .iter()
            .find(|mapping| !found.contains(mapping))
            .map(|mapping| {
                SelfAlignment::new(
                    mapping.clone(),
                    structure.coords_a.clone(),
                    structure.coords_b.clone(),
                )
            }))
    }
}

/// Re-runs the aligner until it stops producing new repeat alignments and reports the number
/// of distinct alignments plus one.
#[derive(Clone)]
pub struct IterativeRealignmentDetector {
    engine: Arc<dyn AlignmentEngine>,
    max_order: u32,
}

impl IterativeRealignmentDetector {
    pub const NAME: &'static str = "iterative-realignment";

    pub fn new(engine: Arc<dyn AlignmentEngine>, config: &DetectorConfig) -> Self {
        Self {
            engine,
            max_order: config.max_order,
        }
    }
}

impl OrderDetector for IterativeRealignmentDetector {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    #[instrument(skip_all, name = "iterative_realignment_detector")]
    fn detect(
        &self,
        alignment: &SelfAlignment,
        _coords: &[Point3<f64>],
    ) -> Result<OrderEstimate, EngineError> {
        let mut found: Vec<ResidueMapping> = Vec::new();

        for round in 1..self.max_order {
            let next = self
                .engine
                .realign(alignment, self.max_order, &found)
                .map_err(|e| EngineError::detection(Self::NAME, e))?;

            let Some(next) = next else {
                trace!(round, "Aligner found no further alignment");
                break;
            };
            if next.is_empty() || next.is_identity() || found.contains(&next.mapping) {
                trace!(round, "Aligner returned a trivial or repeated alignment");
                break;
            }
            found.push(next.mapping);
        }

        debug!(distinct = found.len(), "Re-alignment finished");
        Ok(OrderEstimate::new(found.len() as u32 + 1)
            .with_diagnostics(Diagnostics::Realignments(found.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn shifted(len: usize, shift: usize) -> ResidueMapping {
        (0..len).map(|i| (i, (i + shift) % len)).collect()
    }

    fn structure() -> SelfAlignment {
        SelfAlignment::new(shifted(40, 10), vec![], vec![])
    }

    fn detector(engine: impl AlignmentEngine + 'static) -> IterativeRealignmentDetector {
        IterativeRealignmentDetector::new(Arc::new(engine), &DetectorConfig::default())
    }

    #[test]
    fn counts_distinct_alignments_plus_one() {
        let engine = RecordedAlignmentEngine::new(vec![
            shifted(40, 10),
            shifted(40, 20),
            shifted(40, 30),
        ]);
        let estimate = detector(engine).detect(&structure(), &[]).unwrap();
        assert_eq!(estimate.order(), 4);
        assert_eq!(estimate.diagnostics, Diagnostics::Realignments(3));
    }

    #[test]
    fn engine_without_alignments_yields_no_symmetry() {
        let estimate = detector(RecordedAlignmentEngine::default())
            .detect(&structure(), &[])
            .unwrap();
        assert_eq!(estimate.order(), 1);
    }

    #[test]
    fn stops_at_identity_alignment() {
        let identity: ResidueMapping = (0..40).map(|i| (i, i)).collect();
        let engine =
            RecordedAlignmentEngine::new(vec![shifted(40, 20), identity, shifted(40, 10)]);
        assert_eq!(detector(engine).detect(&structure(), &[]).unwrap().order(), 2);
    }

    struct CountingEngine {
        calls: Mutex<u32>,
    }

    impl AlignmentEngine for CountingEngine {
        fn realign(
            &self,
            structure: &SelfAlignment,
            _max_order: u32,
            _found: &[ResidueMapping],
        ) -> Result<Option<SelfAlignment>, AlignmentEngineError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            let mapping = shifted(100, *calls as usize);
            Ok(Some(SelfAlignment::new(
                mapping,
                structure.coords_a.clone(),
                structure.coords_b.clone(),
            )))
        }
    }

    #[test]
    fn never_reports_more_than_max_order() {
        let engine = CountingEngine {
            calls: Mutex::new(0),
        };
        let estimate = detector(engine).detect(&structure(), &[]).unwrap();
        assert_eq!(estimate.order(), 8);
    }

    struct FailingEngine;

    impl AlignmentEngine for FailingEngine {
        fn realign(
            &self,
            _structure: &SelfAlignment,
            _max_order: u32,
            _found: &[ResidueMapping],
        ) -> Result<Option<SelfAlignment>, AlignmentEngineError> {
            Err("aligner crashed".into())
        }
    }

    #[test]
    fn engine_failure_is_detection_failure() {
        let result = detector(FailingEngine).detect(&structure(), &[]);
        assert!(matches!(
            result,
            Err(EngineError::DetectionFailed {
                detector: "iterative-realignment",
                ..
            })
        ));
    }

    #[test]
    fn from_case_replays_primary_then_alternatives() {
        let case = BenchmarkCase::new("x", structure()).with_alternatives(vec![shifted(40, 20)]);
        let engine = RecordedAlignmentEngine::from_case(&case);

        let first = engine.realign(&case.alignment, 8, &[]).unwrap().unwrap();
        assert_eq!(first.mapping, shifted(40, 10));
        let second = engine
            .realign(&case.alignment, 8, &[first.mapping])
            .unwrap()
            .unwrap();
        assert_eq!(second.mapping, shifted(40, 20));
    }
}
