use crate::core::models::case::BenchmarkCase;
use crate::core::models::order::OrderEstimate;
use crate::engine::config::DetectorConfig;
use crate::engine::detectors::{
    AlignmentEngine, DetectorKind, OrderDetector, RecordedAlignmentEngine,
};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One detector's estimate for one structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub case_id: String,
    pub detector: DetectorKind,
    pub estimate: OrderEstimate,
    pub expected: Option<u32>,
    pub group: Option<String>,
}

impl Prediction {
    #[inline]
    pub fn order(&self) -> u32 {
        self.estimate.order()
    }

    /// `None` when the structure has no expected order.
    pub fn is_correct(&self) -> Option<bool> {
        self.expected.map(|expected| expected == self.order())
    }
}

/// A detector that could not produce an estimate for a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub case_id: String,
    pub detector: DetectorKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionReport {
    pub predictions: Vec<Prediction>,
    pub failures: Vec<Failure>,
}

/// The set of detectors applied to every structure.
///
/// Detectors needing an alignment engine fall back to replaying each case's recorded
/// alignments when no engine was supplied; those are built per case.
pub struct DetectorPanel {
    detectors: Vec<(DetectorKind, Option<Box<dyn OrderDetector>>)>,
    config: DetectorConfig,
}

impl DetectorPanel {
    pub fn new(
        kinds: &[DetectorKind],
        config: &DetectorConfig,
        engine: Option<Arc<dyn AlignmentEngine>>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let detectors = kinds
            .iter()
            .map(|&kind| {
                if kind.requires_engine() && engine.is_none() {
                    Ok((kind, None))
                } else {
                    kind.build(config, engine.clone()).map(|d| (kind, Some(d)))
                }
            })
            .collect::<Result<Vec<_>, EngineError>>()?;
        Ok(Self {
            detectors,
            config: config.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Runs every detector on `case`, in panel order.
    pub fn detect(&self, case: &BenchmarkCase) -> Vec<Result<Prediction, Failure>> {
        self.detectors
            .iter()
            .map(|(kind, detector)| match detector {
                Some(detector) => self.outcome(case, *kind, detector.as_ref()),
                None => {
                    let engine: Arc<dyn AlignmentEngine> =
                        Arc::new(RecordedAlignmentEngine::from_case(case));
                    match kind.build(&self.config, Some(engine)) {
                        Ok(detector) => self.outcome(case, *kind, detector.as_ref()),
                        Err(e) => Err(failure(case, *kind, &e)),
                    }
                }
            })
            .collect()
    }

    fn outcome(
        &self,
        case: &BenchmarkCase,
        kind: DetectorKind,
        detector: &dyn OrderDetector,
    ) -> Result<Prediction, Failure> {
        detector
            .detect(&case.alignment, &case.alignment.coords_a)
            .map(|estimate| Prediction {
                case_id: case.id.clone(),
                detector: kind,
                estimate,
                expected: case.expected_order,
                group: case.group.clone(),
            })
            .map_err(|e| failure(case, kind, &e))
    }
}

fn failure(case: &BenchmarkCase, kind: DetectorKind, error: &EngineError) -> Failure {
    warn!(
        case = %case.id,
        detector = %kind,
        error = %error,
        "Detector failed; skipping structure"
    );
    Failure {
        case_id: case.id.clone(),
        detector: kind,
        reason: error.to_string(),
    }
}

/// Runs `kinds` over every case.
///
/// Failures are recorded and logged but never abort the run. Predictions keep the case order
/// of the input, then the order of `kinds`.
#[instrument(skip_all, name = "detection_workflow", fields(cases = cases.len()))]
pub fn run(
    cases: &[BenchmarkCase],
    kinds: &[DetectorKind],
    config: &DetectorConfig,
    engine: Option<Arc<dyn AlignmentEngine>>,
    reporter: &ProgressReporter,
) -> Result<DetectionReport, EngineError> {
    let panel = DetectorPanel::new(kinds, config, engine)?;
    info!(
        detectors = panel.len(),
        cases = cases.len(),
        "Starting order detection"
    );

    reporter.report(Progress::PhaseStart { name: "Detection" });
    reporter.report(Progress::TaskStart {
        total_steps: cases.len() as u64,
    });

    let detect_case = |case: &BenchmarkCase| {
        let outcomes = panel.detect(case);
        for failure in outcomes.iter().filter_map(|o| o.as_ref().err()) {
            reporter.report(Progress::StructureSkipped {
                case_id: failure.case_id.clone(),
                detector: failure.detector,
            });
        }
        reporter.report(Progress::TaskIncrement);
        outcomes
    };

    #[cfg(not(feature = "parallel"))]
    let iterator = cases.iter();
    #[cfg(feature = "parallel")]
    let iterator = cases.par_iter();

    let per_case: Vec<Vec<Result<Prediction, Failure>>> = iterator.map(detect_case).collect();

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let mut report = DetectionReport::default();
    for outcome in per_case.into_iter().flatten() {
        match outcome {
            Ok(prediction) => report.predictions.push(prediction),
            Err(failure) => report.failures.push(failure),
        }
    }

    info!(
        predictions = report.predictions.len(),
        failures = report.failures.len(),
        "Order detection finished"
    );
    Ok(report)
}
