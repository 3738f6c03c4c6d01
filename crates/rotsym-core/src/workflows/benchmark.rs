use super::consensus::{GroupConsensus, GroupHistograms};
use super::detect::{self, DetectionReport, Failure, Prediction};
use crate::core::models::case::BenchmarkCase;
use crate::engine::config::BenchmarkConfig;
use crate::engine::context::DecisionContext;
use crate::engine::detectors::{AlignmentEngine, DetectorKind};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use nalgebra::DMatrix;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Accuracy and prediction tally for one detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorScore {
    pub detector: DetectorKind,
    /// Estimates produced, with or without an expected order.
    pub predictions: usize,
    /// Estimates for structures that carry an expected order.
    pub evaluated: usize,
    pub correct: usize,
    pub failures: usize,
    tally: BTreeMap<(u32, u32), u64>,
}

impl DetectorScore {
    fn new(detector: DetectorKind) -> Self {
        Self {
            detector,
            predictions: 0,
            evaluated: 0,
            correct: 0,
            failures: 0,
            tally: BTreeMap::new(),
        }
    }

    fn record(&mut self, prediction: &Prediction) {
        self.predictions += 1;
        if let Some(expected) = prediction.expected {
            self.evaluated += 1;
            if expected == prediction.order() {
                self.correct += 1;
            }
            *self.tally.entry((expected, prediction.order())).or_insert(0) += 1;
        }
    }

    /// Fraction of evaluated structures predicted correctly; `None` if nothing was evaluated.
    pub fn accuracy(&self) -> Option<f64> {
        (self.evaluated > 0).then(|| self.correct as f64 / self.evaluated as f64)
    }

    /// Number of structures of true order `expected` reported as `observed`.
    pub fn tally(&self, expected: u32, observed: u32) -> u64 {
        self.tally.get(&(expected, observed)).copied().unwrap_or(0)
    }

    /// Empirical row-stochastic confusion matrix over orders `2..=max_order`.
    ///
    /// Row `i - 2` holds the observed-order frequencies for structures of true order `i`. Outcomes
    /// outside the order range are left out; rows with no data fall back to the identity row, so
    /// the result always loads as a confusion kernel.
    pub fn confusion_matrix(&self, max_order: u32) -> DMatrix<f64> {
        let size = max_order.max(2) as usize - 1;
        let mut matrix = DMatrix::zeros(size, size);
        let in_range = |order: u32| (2..=max_order).contains(&order);

        for (&(expected, observed), &count) in &self.tally {
            if in_range(expected) && in_range(observed) {
                matrix[(expected as usize - 2, observed as usize - 2)] += count as f64;
            }
        }

        for (i, mut row) in matrix.row_iter_mut().enumerate() {
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            } else {
                row[i] = 1.0;
            }
        }
        matrix
    }
}

/// Everything produced by one benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub predictions: Vec<Prediction>,
    pub failures: Vec<Failure>,
    /// One entry per configured detector in configuration order, followed by the consensus
    /// detector if it was not configured.
    pub scores: Vec<DetectorScore>,
    /// Per-group order histograms of the consensus detector's estimates.
    pub histograms: GroupHistograms,
    /// Consensus decided from `histograms`.
    pub consensus: Vec<GroupConsensus>,
}

impl BenchmarkReport {
    pub fn score(&self, detector: DetectorKind) -> Option<&DetectorScore> {
        self.scores.iter().find(|s| s.detector == detector)
    }
}

/// Runs the configured detectors over `cases`, scores them against the expected orders and
/// decides a consensus order per group.
///
/// Cases whose detectors fail are logged and skipped. When `engine` is `None` the iterative
/// re-alignment detector replays the alignments recorded in each case.
#[instrument(skip_all, name = "benchmark_workflow")]
pub fn run(
    cases: &[BenchmarkCase],
    config: &BenchmarkConfig,
    context: &DecisionContext,
    engine: Option<Arc<dyn AlignmentEngine>>,
    reporter: &ProgressReporter,
) -> Result<BenchmarkReport, EngineError> {
    info!(
        cases = cases.len(),
        detectors = config.detectors.len(),
        consensus = %config.consensus_detector,
        "Starting benchmark"
    );

    let mut kinds = config.detectors.clone();
    if !kinds.contains(&config.consensus_detector) {
        kinds.push(config.consensus_detector);
    }
    let detection = detect::run(cases, &kinds, &config.detector, engine, reporter)?;

    let (scores, histograms) = reporter.phase("Scoring", || {
        score_predictions(&detection, &kinds, config, context)
    });
    let consensus = reporter.phase("Consensus", || histograms.clone().decide(context));

    for score in &scores {
        match score.accuracy() {
            Some(accuracy) => info!(
                detector = %score.detector,
                evaluated = score.evaluated,
                failures = score.failures,
                "Accuracy {:.3}",
                accuracy
            ),
            None => info!(
                detector = %score.detector,
                failures = score.failures,
                "No expected orders to score against"
            ),
        }
    }
    info!(groups = consensus.len(), "Benchmark finished");

    Ok(BenchmarkReport {
        predictions: detection.predictions,
        failures: detection.failures,
        scores,
        histograms,
        consensus,
    })
}

/// Tallies every prediction against its detector and fills the group histograms from the
/// consensus detector's predictions.
fn score_predictions(
    detection: &DetectionReport,
    kinds: &[DetectorKind],
    config: &BenchmarkConfig,
    context: &DecisionContext,
) -> (Vec<DetectorScore>, GroupHistograms) {
    let mut scores: Vec<DetectorScore> = kinds
        .iter()
        .map(|&kind| DetectorScore::new(kind))
        .collect();
    let mut histograms = GroupHistograms::new(config.detector.max_order);
    let mut ungrouped = 0usize;

    for prediction in &detection.predictions {
        if let Some(score) = scores.iter_mut().find(|s| s.detector == prediction.detector) {
            score.record(prediction);
        }
        if prediction.detector != config.consensus_detector {
            continue;
        }
        match context.group_of(&prediction.case_id, prediction.group.as_deref()) {
            Some(group) => {
                histograms.add(group, prediction.order());
            }
            None => ungrouped += 1,
        }
    }
    for failure in &detection.failures {
        if let Some(score) = scores.iter_mut().find(|s| s.detector == failure.detector) {
            score.failures += 1;
        }
    }
    if ungrouped > 0 {
        debug!(ungrouped, "Structures without a group were left out of consensus");
    }
    (scores, histograms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::taxonomy::TaxonomyIndex;
    use crate::core::models::alignment::{ResidueMapping, RotationGeometry, SelfAlignment};
    use crate::core::models::order::OrderEstimate;
    use crate::engine::config::BenchmarkConfigBuilder;
    use crate::engine::consensus::ConfusionModel;
    use nalgebra::{Point3, Vector3};
    use std::f64::consts::TAU;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn shifted(len: usize, shift: usize) -> ResidueMapping {
        (0..len).map(|i| (i, (i + shift) % len)).collect()
    }

    fn case(id: &str, order: usize, expected: u32, group: &str) -> BenchmarkCase {
        let len = 12 * order;
        let angle = TAU / order as f64;
        let alignment = SelfAlignment::new(shifted(len, 12), vec![], vec![]).with_geometry(
            RotationGeometry::new(Vector3::z(), Point3::origin(), angle).unwrap(),
        );
        BenchmarkCase::new(id, alignment)
            .with_expected_order(expected)
            .with_group(group)
    }

    fn prediction(detector: DetectorKind, order: u32, expected: Option<u32>) -> Prediction {
        Prediction {
            case_id: "x".to_string(),
            detector,
            estimate: OrderEstimate::new(order),
            expected,
            group: None,
        }
    }

    #[test]
    fn run_scores_detectors_and_decides_group_consensus() {
        let cases = vec![
            case("a1", 3, 3, "alpha"),
            case("a2", 3, 3, "alpha"),
            case("a3", 6, 3, "alpha"),
            case("b1", 5, 5, "beta"),
        ];
        let config = BenchmarkConfigBuilder::new()
            .detectors(vec![DetectorKind::Cycle, DetectorKind::Angle])
            .build()
            .unwrap();

        let report = run(
            &cases,
            &config,
            &DecisionContext::new(),
            None,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.predictions.len(), 8);

        let cycle = report.score(DetectorKind::Cycle).unwrap();
        assert_eq!(cycle.evaluated, 4);
        assert_eq!(cycle.correct, 3);
        assert!(f64_approx_equal(cycle.accuracy().unwrap(), 0.75));
        assert_eq!(cycle.tally(3, 6), 1);

        assert_eq!(report.histograms.get("alpha").unwrap().count(6), 1);
        assert_eq!(report.consensus.len(), 2);
        assert_eq!(report.consensus[0].group, "alpha");
        assert_eq!(report.consensus[0].structures, 3);
        assert_eq!(report.consensus[0].mode, 3);
        assert_eq!(report.consensus[0].kernel, None);
        assert_eq!(report.consensus[1].group, "beta");
        assert_eq!(report.consensus[1].mode, 5);
    }

    #[test]
    fn run_skips_failed_cases_and_counts_failures() {
        let mut broken = case("broken", 4, 4, "alpha");
        broken.alignment.geometry = None;
        let cases = vec![broken, case("ok", 4, 4, "alpha")];
        let config = BenchmarkConfigBuilder::new()
            .detectors(vec![DetectorKind::Angle])
            .consensus_detector(DetectorKind::Angle)
            .build()
            .unwrap();

        let report = run(
            &cases,
            &config,
            &DecisionContext::new(),
            None,
            &ProgressReporter::new(),
        )
        .unwrap();

        let angle = report.score(DetectorKind::Angle).unwrap();
        assert_eq!(angle.failures, 1);
        assert_eq!(angle.evaluated, 1);
        assert_eq!(angle.correct, 1);
        assert_eq!(report.consensus[0].structures, 1);
    }

    #[test]
    fn run_uses_taxonomy_groups_and_loaded_kernel() {
        let cases = vec![case("a1", 2, 4, "own"), case("a2", 2, 4, "own")];
        let mut taxonomy = TaxonomyIndex::new();
        taxonomy.insert("a1", "family");
        taxonomy.insert("a2", "family");
        let mut kernel = DMatrix::identity(7, 7);
        kernel[(2, 2)] = 0.1;
        kernel[(2, 0)] = 0.9;
        let context = DecisionContext::new()
            .with_taxonomy(taxonomy)
            .with_kernel(ConfusionModel::from_matrix(kernel).unwrap());
        let config = BenchmarkConfigBuilder::new()
            .detectors(vec![DetectorKind::Cycle])
            .build()
            .unwrap();

        let report = run(&cases, &config, &context, None, &ProgressReporter::new()).unwrap();

        assert_eq!(report.consensus.len(), 1);
        assert_eq!(report.consensus[0].group, "family");
        assert_eq!(report.consensus[0].mode, 2);
        assert_eq!(report.consensus[0].kernel, Some(4));
    }

    #[test]
    fn run_adds_consensus_detector_when_not_configured() {
        let cases = vec![case("a1", 4, 4, "alpha")];
        let config = BenchmarkConfigBuilder::new()
            .detectors(vec![DetectorKind::Angle])
            .consensus_detector(DetectorKind::Cycle)
            .build()
            .unwrap();

        let report = run(
            &cases,
            &config,
            &DecisionContext::new(),
            None,
            &ProgressReporter::new(),
        )
        .unwrap();

        let detectors: Vec<_> = report.scores.iter().map(|s| s.detector).collect();
        assert_eq!(detectors, vec![DetectorKind::Angle, DetectorKind::Cycle]);
        assert_eq!(report.consensus[0].mode, 4);
    }

    #[test]
    fn confusion_matrix_is_row_stochastic_with_identity_fallback() {
        let mut score = DetectorScore::new(DetectorKind::Cycle);
        for p in [
            prediction(DetectorKind::Cycle, 2, Some(4)),
            prediction(DetectorKind::Cycle, 4, Some(4)),
            prediction(DetectorKind::Cycle, 4, Some(4)),
            prediction(DetectorKind::Cycle, 2, Some(4)),
            prediction(DetectorKind::Cycle, 1, Some(3)),
            prediction(DetectorKind::Cycle, 5, None),
        ] {
            score.record(&p);
        }

        let matrix = score.confusion_matrix(8);

        assert_eq!(matrix.shape(), (7, 7));
        assert!(f64_approx_equal(matrix[(2, 0)], 0.5));
        assert!(f64_approx_equal(matrix[(2, 2)], 0.5));
        // True order 3 only ever came back as 1, which lies outside the kernel.
        assert!(f64_approx_equal(matrix[(1, 1)], 1.0));
        for row in matrix.row_iter() {
            assert!(f64_approx_equal(row.sum(), 1.0));
        }
        assert!(ConfusionModel::from_matrix(matrix).is_ok());
        assert_eq!(score.predictions, 6);
        assert_eq!(score.evaluated, 5);
    }

    #[test]
    fn accuracy_is_none_without_expected_orders() {
        let mut score = DetectorScore::new(DetectorKind::Angle);
        score.record(&prediction(DetectorKind::Angle, 3, None));
        assert_eq!(score.accuracy(), None);
    }
}
