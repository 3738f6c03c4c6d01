//! # Order Detectors
//!
//! Every strategy for turning a self-alignment into an integer symmetry order sits behind the
//! [`OrderDetector`] trait, so the benchmark harness can enumerate and compare them uniformly.
//!
//! - [`cycle`] - Follows residue orbits under repeated application of the mapping
//! - [`angle`] - Matches the measured rotation angle against `2π/k`
//! - [`harmonic`] - Fits cosine or cusp bases to the sampled similarity curve
//! - [`peaks`] - Counts maxima of the LOESS-smoothed similarity curve
//! - [`realign`] - Re-runs the external aligner and counts distinct repeat alignments
//!
//! Detectors hold no cross-call state. A return value of order 1 means "checked, no symmetry";
//! failures to compute are reported as [`EngineError`] instead.

pub mod angle;
pub mod cycle;
pub mod harmonic;
pub mod peaks;
pub mod realign;
mod sampling;

use super::config::{ConfigError, DetectorConfig};
use super::error::EngineError;
use crate::core::models::alignment::SelfAlignment;
use crate::core::models::order::OrderEstimate;
use nalgebra::Point3;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

pub use angle::{AngleDetector, AngleMetric, guess_order};
pub use cycle::CycleDetector;
pub use harmonic::{BasisFunction, FitStrategy, HarmonicDetector};
pub use peaks::PeakCountingDetector;
pub use realign::{
    AlignmentEngine, AlignmentEngineError, IterativeRealignmentDetector, RecordedAlignmentEngine,
};
pub use sampling::{SimilarityCurve, sample_rotations};

pub trait OrderDetector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Estimates the rotational order of `alignment`; `coords` are the structure's
    /// representative-atom coordinates used by the curve-sampling detectors.
    fn detect(
        &self,
        alignment: &SelfAlignment,
        coords: &[Point3<f64>],
    ) -> Result<OrderEstimate, EngineError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DetectorKind {
    Cycle,
    Angle,
    AngleNormalized,
    HarmonicFixed,
    HarmonicFloating,
    SingleHarmonicAmplitude,
    SingleHarmonicError,
    CuspFixed,
    CuspFloating,
    SingleCuspAmplitude,
    SingleCuspError,
    PeakCounting,
    IterativeRealignment,
}

static DETECTOR_NAMES: Map<&'static str, DetectorKind> = phf_map! {
    "cycle" => DetectorKind::Cycle,
    "angle" => DetectorKind::Angle,
    "angle-normalized" => DetectorKind::AngleNormalized,
    "harmonic-fixed" => DetectorKind::HarmonicFixed,
    "harmonic-floating" => DetectorKind::HarmonicFloating,
    "single-harmonic-amplitude" => DetectorKind::SingleHarmonicAmplitude,
    "single-harmonic-error" => DetectorKind::SingleHarmonicError,
    "cusp-fixed" => DetectorKind::CuspFixed,
    "cusp-floating" => DetectorKind::CuspFloating,
    "single-cusp-amplitude" => DetectorKind::SingleCuspAmplitude,
    "single-cusp-error" => DetectorKind::SingleCuspError,
    "peak-counting" => DetectorKind::PeakCounting,
    "iterative-realignment" => DetectorKind::IterativeRealignment,
};

impl DetectorKind {
    pub const ALL: [DetectorKind; 13] = [
        DetectorKind::Cycle,
        DetectorKind::Angle,
        DetectorKind::AngleNormalized,
        DetectorKind::HarmonicFixed,
        DetectorKind::HarmonicFloating,
        DetectorKind::SingleHarmonicAmplitude,
        DetectorKind::SingleHarmonicError,
        DetectorKind::CuspFixed,
        DetectorKind::CuspFloating,
        DetectorKind::SingleCuspAmplitude,
        DetectorKind::SingleCuspError,
        DetectorKind::PeakCounting,
        DetectorKind::IterativeRealignment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DetectorKind::Cycle => "cycle",
            DetectorKind::Angle => "angle",
            DetectorKind::AngleNormalized => "angle-normalized",
            DetectorKind::HarmonicFixed => "harmonic-fixed",
            DetectorKind::HarmonicFloating => "harmonic-floating",
            DetectorKind::SingleHarmonicAmplitude => "single-harmonic-amplitude",
            DetectorKind::SingleHarmonicError => "single-harmonic-error",
            DetectorKind::CuspFixed => "cusp-fixed",
            DetectorKind::CuspFloating => "cusp-floating",
            DetectorKind::SingleCuspAmplitude => "single-cusp-amplitude",
            DetectorKind::SingleCuspError => "single-cusp-error",
            DetectorKind::PeakCounting => "peak-counting",
            DetectorKind::IterativeRealignment => "iterative-realignment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        DETECTOR_NAMES.get(name.trim()).copied()
    }

    /// True for detectors that need an [`AlignmentEngine`] to run.
    pub fn requires_engine(&self) -> bool {
        matches!(self, DetectorKind::IterativeRealignment)
    }

    pub fn build(
        &self,
        config: &DetectorConfig,
        engine: Option<Arc<dyn AlignmentEngine>>,
    ) -> Result<Box<dyn OrderDetector>, EngineError> {
        use BasisFunction::{Cosine, Cusp};
        use FitStrategy::{ByAmplitude, ByError, Series};

        let harmonic = |basis, strategy| -> Box<dyn OrderDetector> {
            Box::new(HarmonicDetector::new(*self, basis, strategy, config))
        };

        let detector: Box<dyn OrderDetector> = match self {
            DetectorKind::Cycle => Box::new(CycleDetector::new(config)),
            DetectorKind::Angle => Box::new(AngleDetector::new(AngleMetric::Radians, config)),
            DetectorKind::AngleNormalized => {
                Box::new(AngleDetector::new(AngleMetric::Normalized, config))
            }
            DetectorKind::HarmonicFixed => harmonic(Cosine, Series { intercept: false }),
            DetectorKind::HarmonicFloating => harmonic(Cosine, Series { intercept: true }),
            DetectorKind::SingleHarmonicAmplitude => harmonic(Cosine, ByAmplitude),
            DetectorKind::SingleHarmonicError => harmonic(Cosine, ByError),
            DetectorKind::CuspFixed => harmonic(Cusp, Series { intercept: false }),
            DetectorKind::CuspFloating => harmonic(Cusp, Series { intercept: true }),
            DetectorKind::SingleCuspAmplitude => harmonic(Cusp, ByAmplitude),
            DetectorKind::SingleCuspError => harmonic(Cusp, ByError),
            DetectorKind::PeakCounting => Box::new(PeakCountingDetector::new(config)?),
            DetectorKind::IterativeRealignment => {
                let engine = engine.ok_or(ConfigError::MissingParameter("alignment_engine"))?;
                Box::new(IterativeRealignmentDetector::new(engine, config))
            }
        };
        Ok(detector)
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown detector '{0}'")]
pub struct UnknownDetector(pub String);

impl FromStr for DetectorKind {
    type Err = UnknownDetector;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownDetector(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_lookup_table() {
        for kind in DetectorKind::ALL {
            assert_eq!(DetectorKind::from_name(kind.name()), Some(kind));
            assert_eq!(kind.to_string().parse::<DetectorKind>(), Ok(kind));
        }
        assert_eq!(DETECTOR_NAMES.len(), DetectorKind::ALL.len());
    }

    #[test]
    fn from_name_rejects_unknown_names() {
        assert_eq!(DetectorKind::from_name("fourier"), None);
        assert!("fourier".parse::<DetectorKind>().is_err());
    }

    #[test]
    fn build_creates_every_detector_but_realignment_without_engine() {
        let config = DetectorConfig::default();
        for kind in DetectorKind::ALL {
            let built = kind.build(&config, None);
            if kind.requires_engine() {
                assert!(matches!(built, Err(EngineError::Config { .. })));
            } else {
                assert_eq!(built.unwrap().name(), kind.name());
            }
        }
    }

    #[test]
    fn build_creates_realignment_detector_with_engine() {
        let engine: Arc<dyn AlignmentEngine> = Arc::new(RecordedAlignmentEngine::new(vec![]));
        let detector = DetectorKind::IterativeRealignment
            .build(&DetectorConfig::default(), Some(engine))
            .unwrap();
        assert_eq!(detector.name(), "iterative-realignment");
    }
}
