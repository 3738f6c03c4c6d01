use super::detectors::DetectorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Parameter '{name}' is out of range: {value} ({expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },
}

pub const DEFAULT_MAX_ORDER: u32 = 8;
pub const MAX_SUPPORTED_ORDER: u32 = 64;
pub const DEFAULT_ANGLE_THRESHOLD_DEGREES: f64 = 1.0;
pub const DEFAULT_NORMALIZED_ANGLE_THRESHOLD: f64 = 0.05;
pub const DEFAULT_MIN_METRIC_CHANGE: f64 = 0.4;
pub const DEFAULT_ANGLE_STEP_DEGREES: f64 = 1.0;
pub const DEFAULT_SIMILARITY_D0: f64 = 3.8;
pub const DEFAULT_LOESS_BANDWIDTH: f64 = 0.1;
pub const DEFAULT_LOESS_ROBUSTNESS_ITERATIONS: usize = 0;

/// Tunables shared by every order detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Largest order any detector will report.
    pub max_order: u32,
    /// Acceptance threshold of the raw-radian angle detector, in radians.
    pub angle_threshold: f64,
    /// Acceptance threshold of the normalized angle detector, as a fraction of a period.
    pub normalized_angle_threshold: f64,
    /// Fractional drop the cycle metric must make to accept a longer cycle.
    pub min_metric_change: f64,
    /// Sampling increment of the similarity curve, in degrees.
    pub angle_step_degrees: f64,
    /// Distance scale of the similarity function, in Ångström.
    pub similarity_d0: f64,
    pub loess_bandwidth: f64,
    /// Bisquare passes after the first LOESS fit. Off by default: on a clean curve the narrow
    /// symmetry peaks are the largest residuals and get down-weighted into split maxima.
    pub loess_robustness_iterations: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_order: DEFAULT_MAX_ORDER,
            angle_threshold: DEFAULT_ANGLE_THRESHOLD_DEGREES.to_radians(),
            normalized_angle_threshold: DEFAULT_NORMALIZED_ANGLE_THRESHOLD,
            min_metric_change: DEFAULT_MIN_METRIC_CHANGE,
            angle_step_degrees: DEFAULT_ANGLE_STEP_DEGREES,
            similarity_d0: DEFAULT_SIMILARITY_D0,
            loess_bandwidth: DEFAULT_LOESS_BANDWIDTH,
            loess_robustness_iterations: DEFAULT_LOESS_ROBUSTNESS_ITERATIONS,
        }
    }
}

/// Builds a validated [`DetectorConfig`]; unset parameters take their defaults.
#[derive(Default)]
pub struct DetectorConfigBuilder {
    max_order: Option<u32>,
    angle_threshold: Option<f64>,
    normalized_angle_threshold: Option<f64>,
    min_metric_change: Option<f64>,
    angle_step_degrees: Option<f64>,
    similarity_d0: Option<f64>,
    loess_bandwidth: Option<f64>,
    loess_robustness_iterations: Option<usize>,
}

impl DetectorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_order(mut self, order: u32) -> Self {
        self.max_order = Some(order);
        self
    }
    pub fn angle_threshold(mut self, radians: f64) -> Self {
        self.angle_threshold = Some(radians);
        self
    }
    pub fn angle_threshold_degrees(self, degrees: f64) -> Self {
        self.angle_threshold(degrees.to_radians())
    }
    pub fn normalized_angle_threshold(mut self, fraction: f64) -> Self {
        self.normalized_angle_threshold = Some(fraction);
        self
    }
    pub fn min_metric_change(mut self, change: f64) -> Self {
        self.min_metric_change = Some(change);
        self
    }
    pub fn angle_step_degrees(mut self, step: f64) -> Self {
        self.angle_step_degrees = Some(step);
        self
    }
    pub fn similarity_d0(mut self, d0: f64) -> Self {
        self.similarity_d0 = Some(d0);
        self
    }
    pub fn loess_bandwidth(mut self, bandwidth: f64) -> Self {
        self.loess_bandwidth = Some(bandwidth);
        self
    }
    pub fn loess_robustness_iterations(mut self, iterations: usize) -> Self {
        self.loess_robustness_iterations = Some(iterations);
        self
    }

    pub fn build(self) -> Result<DetectorConfig, ConfigError> {
        let defaults = DetectorConfig::default();
        let config = DetectorConfig {
            max_order: self.max_order.unwrap_or(defaults.max_order),
            angle_threshold: self.angle_threshold.unwrap_or(defaults.angle_threshold),
            normalized_angle_threshold: self
                .normalized_angle_threshold
                .unwrap_or(defaults.normalized_angle_threshold),
            min_metric_change: self.min_metric_change.unwrap_or(defaults.min_metric_change),
            angle_step_degrees: self
                .angle_step_degrees
                .unwrap_or(defaults.angle_step_degrees),
            similarity_d0: self.similarity_d0.unwrap_or(defaults.similarity_d0),
            loess_bandwidth: self.loess_bandwidth.unwrap_or(defaults.loess_bandwidth),
            loess_robustness_iterations: self
                .loess_robustness_iterations
                .unwrap_or(defaults.loess_robustness_iterations),
        };
        config.validate()?;
        Ok(config)
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(
            "max_order",
            self.max_order as f64,
            (2..=MAX_SUPPORTED_ORDER).contains(&self.max_order),
            "in [2, 64]",
        )?;
        check(
            "angle_threshold",
            self.angle_threshold,
            self.angle_threshold > 0.0 && self.angle_threshold <= std::f64::consts::PI,
            "in (0, pi] radians",
        )?;
        check(
            "normalized_angle_threshold",
            self.normalized_angle_threshold,
            self.normalized_angle_threshold > 0.0 && self.normalized_angle_threshold <= 0.5,
            "in (0, 0.5]",
        )?;
        check(
            "min_metric_change",
            self.min_metric_change,
            self.min_metric_change > 0.0 && self.min_metric_change <= 1.0,
            "in (0, 1]",
        )?;
        check(
            "angle_step_degrees",
            self.angle_step_degrees,
            self.angle_step_degrees > 0.0 && self.angle_step_degrees <= 90.0,
            "in (0, 90] degrees",
        )?;
        check(
            "similarity_d0",
            self.similarity_d0,
            self.similarity_d0 > 0.0 && self.similarity_d0.is_finite(),
            "positive",
        )?;
        check(
            "loess_bandwidth",
            self.loess_bandwidth,
            self.loess_bandwidth > 0.0 && self.loess_bandwidth <= 1.0,
            "in (0, 1]",
        )
    }
}

fn check(
    name: &'static str,
    value: f64,
    ok: bool,
    expected: &'static str,
) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            expected,
        })
    }
}

/// Inputs of a benchmark run.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkConfig {
    pub detectors: Vec<DetectorKind>,
    /// Detector whose estimates feed the per-group histograms.
    pub consensus_detector: DetectorKind,
    pub detector: DetectorConfig,
    pub kernel_path: Option<PathBuf>,
    pub correction_path: Option<PathBuf>,
    pub taxonomy_path: Option<PathBuf>,
}

#[derive(Default)]
pub struct BenchmarkConfigBuilder {
    detectors: Option<Vec<DetectorKind>>,
    consensus_detector: Option<DetectorKind>,
    detector: Option<DetectorConfig>,
    kernel_path: Option<PathBuf>,
    correction_path: Option<PathBuf>,
    taxonomy_path: Option<PathBuf>,
}

impl BenchmarkConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detectors(mut self, detectors: Vec<DetectorKind>) -> Self {
        self.detectors = Some(detectors);
        self
    }
    pub fn consensus_detector(mut self, kind: DetectorKind) -> Self {
        self.consensus_detector = Some(kind);
        self
    }
    pub fn detector_config(mut self, config: DetectorConfig) -> Self {
        self.detector = Some(config);
        self
    }
    pub fn kernel_path(mut self, path: PathBuf) -> Self {
        self.kernel_path = Some(path);
        self
    }
    pub fn correction_path(mut self, path: PathBuf) -> Self {
        self.correction_path = Some(path);
        self
    }
    pub fn taxonomy_path(mut self, path: PathBuf) -> Self {
        self.taxonomy_path = Some(path);
        self
    }

    pub fn build(self) -> Result<BenchmarkConfig, ConfigError> {
        let detectors = self
            .detectors
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::MissingParameter("detectors"))?;
        let detector = self.detector.unwrap_or_default();
        detector.validate()?;
        Ok(BenchmarkConfig {
            detectors,
            consensus_detector: self.consensus_detector.unwrap_or(DetectorKind::Cycle),
            detector,
            kernel_path: self.kernel_path,
            correction_path: self.correction_path,
            taxonomy_path: self.taxonomy_path,
        })
    }
}
