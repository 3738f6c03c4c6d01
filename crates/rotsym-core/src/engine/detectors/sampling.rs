use crate::core::models::alignment::{RotationGeometry, SelfAlignment};
use crate::core::utils::geometry::{build_index, nearest_neighbour_similarity, rotate_about_axis};
use crate::engine::error::EngineError;
use nalgebra::Point3;
use tracing::{instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Fewer samples than this cannot resolve even a two-fold curve.
const MIN_SAMPLES: usize = 4;

/// Structural similarity as a function of rotation angle about the symmetry axis.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityCurve {
    /// Sample angles in radians, strictly increasing over `[0, 2π)`.
    pub angles: Vec<f64>,
    pub values: Vec<f64>,
}

impl SimilarityCurve {
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }
}

pub(crate) fn require_geometry(alignment: &SelfAlignment) -> Result<&RotationGeometry, EngineError> {
    alignment
        .geometry
        .as_ref()
        .ok_or_else(|| EngineError::geometry("self-alignment carries no rotation axis"))
}

/// Rotates `coords` about the axis in fixed increments and records the similarity of each
/// rotated copy to the original.
#[instrument(skip_all, name = "similarity_sweep", fields(points = coords.len(), step = step_degrees))]
pub fn sample_rotations(
    coords: &[Point3<f64>],
    geometry: &RotationGeometry,
    step_degrees: f64,
    d0: f64,
    detector: &'static str,
) -> Result<SimilarityCurve, EngineError> {
    if coords.is_empty() {
        return Err(EngineError::detection(
            detector,
            "no coordinates to sample the similarity curve",
        ));
    }
    if step_degrees.is_nan() || step_degrees <= 0.0 {
        return Err(EngineError::detection(
            detector,
            format!("invalid angular step of {} degrees", step_degrees),
        ));
    }

    let samples = (360.0 / step_degrees).floor() as usize;
    if samples < MIN_SAMPLES {
        return Err(EngineError::detection(
            detector,
            format!("angular step of {} degrees yields too few samples", step_degrees),
        ));
    }

    let step = step_degrees.to_radians();
    let angles: Vec<f64> = (0..samples).map(|i| i as f64 * step).collect();
    let index = build_index(coords);

    let similarity_at = |angle: &f64| {
        let moved = rotate_about_axis(coords, geometry, *angle);
        nearest_neighbour_similarity(&index, &moved, d0)
    };

    #[cfg(feature = "parallel")]
    let values: Vec<f64> = angles.par_iter().map(similarity_at).collect();
    #[cfg(not(feature = "parallel"))]
    let values: Vec<f64> = angles.iter().map(similarity_at).collect();

    trace!(samples, "Similarity curve sampled");
    Ok(SimilarityCurve { angles, values })
}
