use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Unit, UnitQuaternion, Vector3};
use std::collections::BTreeMap;

/// Residue-index correspondence produced by the self-alignment.
///
/// Keys are unique; values may repeat when the alignment is degenerate.
pub type ResidueMapping = BTreeMap<usize, usize>;

const AXIS_EPSILON: f64 = 1e-9;

/// Rotation geometry of a self-alignment's superposition.
///
/// Translation magnitudes are `None` when they could not be derived from the transform.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationGeometry {
    pub axis: Unit<Vector3<f64>>,
    pub origin: Point3<f64>,
    /// Rotation angle in radians.
    pub angle: f64,
    /// Translation component parallel to the axis.
    pub screw_translation: Option<f64>,
    /// Translation component perpendicular to the axis.
    pub orthogonal_translation: Option<f64>,
}

impl RotationGeometry {
    pub fn new(axis: Vector3<f64>, origin: Point3<f64>, angle: f64) -> Option<Self> {
        if axis.norm() < AXIS_EPSILON || !angle.is_finite() {
            return None;
        }
        Some(Self {
            axis: Unit::new_normalize(axis),
            origin,
            angle,
            screw_translation: None,
            orthogonal_translation: None,
        })
    }

    pub fn with_translations(mut self, screw: Option<f64>, orthogonal: Option<f64>) -> Self {
        self.screw_translation = screw;
        self.orthogonal_translation = orthogonal;
        self
    }

    /// Derives the geometry of a rigid 4×4 homogeneous transform.
    ///
    /// Returns `None` for the identity rotation, for which no axis exists.
    pub fn from_transform(transform: &Matrix4<f64>) -> Option<Self> {
        let rot: Matrix3<f64> = transform.fixed_view::<3, 3>(0, 0).into_owned();
        let translation: Vector3<f64> = transform.fixed_view::<3, 1>(0, 3).into_owned();

        let rotation = Rotation3::from_matrix(&rot);
        // Quaternion form keeps the axis defined for half turns.
        let (axis, angle) = UnitQuaternion::from_rotation_matrix(&rotation).axis_angle()?;

        let screw = axis.dot(&translation);
        let perpendicular = translation - axis.into_inner() * screw;

        // The origin is the point on the axis fixed by the rotation: (I - R) p = t_perp.
        let origin = (Matrix3::<f64>::identity() - rotation.matrix())
            .svd(true, true)
            .solve(&perpendicular, AXIS_EPSILON)
            .ok()
            .map(|p| p - axis.into_inner() * axis.dot(&p))
            .map(Point3::from)?;

        Some(Self {
            axis,
            origin,
            angle,
            screw_translation: Some(screw),
            orthogonal_translation: Some(perpendicular.norm()),
        })
    }

    /// Rotation about the axis by `angle` radians, as a 4×4 transform fixing the origin.
    pub fn to_transform(&self, angle: f64) -> Matrix4<f64> {
        let rotation = Rotation3::from_axis_angle(&self.axis, angle);
        let offset = self.origin.coords - rotation * self.origin.coords;
        let mut transform = rotation.to_homogeneous();
        transform.fixed_view_mut::<3, 1>(0, 3).copy_from(&offset);
        transform
    }
}

/// A structure aligned against a copy of itself.
///
/// Read-only input to every detector: produced by the external alignment engine and left
/// untouched for the duration of a detection call.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfAlignment {
    pub mapping: ResidueMapping,
    pub coords_a: Vec<Point3<f64>>,
    pub coords_b: Vec<Point3<f64>>,
    /// Similarity of the two superposed copies (TM-score or RMSD, as reported by the aligner).
    pub score: Option<f64>,
    pub geometry: Option<RotationGeometry>,
}

impl SelfAlignment {
    pub fn new(
        mapping: ResidueMapping,
        coords_a: Vec<Point3<f64>>,
        coords_b: Vec<Point3<f64>>,
    ) -> Self {
        Self {
            mapping,
            coords_a,
            coords_b,
            score: None,
            geometry: None,
        }
    }

    pub fn with_geometry(mut self, geometry: RotationGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// True if every residue is aligned onto itself.
    pub fn is_identity(&self) -> bool {
        self.mapping.iter().all(|(k, v)| k == v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn new_rejects_zero_length_axis() {
        assert!(RotationGeometry::new(Vector3::zeros(), Point3::origin(), 1.0).is_none());
    }

    #[test]
    fn new_normalizes_axis() {
        let geometry =
            RotationGeometry::new(Vector3::new(0.0, 0.0, 5.0), Point3::origin(), PI).unwrap();
        assert!(f64_approx_equal(geometry.axis.z, 1.0));
    }

    #[test]
    fn from_transform_returns_none_for_identity() {
        assert!(RotationGeometry::from_transform(&Matrix4::identity()).is_none());
    }

    #[test]
    fn from_transform_recovers_angle_axis_and_screw() {
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        let mut transform = rotation.to_homogeneous();
        transform[(2, 3)] = 1.5;

        let geometry = RotationGeometry::from_transform(&transform).unwrap();

        assert!(f64_approx_equal(geometry.angle, FRAC_PI_2));
        assert!(f64_approx_equal(geometry.axis.z.abs(), 1.0));
        assert!(f64_approx_equal(geometry.screw_translation.unwrap().abs(), 1.5));
        assert!(f64_approx_equal(geometry.orthogonal_translation.unwrap(), 0.0));
    }

    #[test]
    fn from_transform_handles_half_turn() {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), PI);
        let geometry = RotationGeometry::from_transform(&rotation.to_homogeneous()).unwrap();

        assert!(f64_approx_equal(geometry.angle, PI));
        assert!(f64_approx_equal(geometry.axis.y.abs(), 1.0));
    }

    #[test]
    fn from_transform_locates_origin_of_offset_axis() {
        let geometry =
            RotationGeometry::new(Vector3::z(), Point3::new(2.0, -1.0, 0.0), FRAC_PI_2).unwrap();
        let transform = geometry.to_transform(FRAC_PI_2);

        let recovered = RotationGeometry::from_transform(&transform).unwrap();

        assert!(f64_approx_equal(recovered.origin.x, 2.0));
        assert!(f64_approx_equal(recovered.origin.y, -1.0));
        assert!(f64_approx_equal(recovered.screw_translation.unwrap(), 0.0));
    }

    #[test]
    fn to_transform_keeps_origin_fixed() {
        let origin = Point3::new(1.0, 2.0, 3.0);
        let geometry = RotationGeometry::new(Vector3::x(), origin, 1.0).unwrap();
        let moved = geometry.to_transform(0.7).transform_point(&origin);
        assert!(f64_approx_equal((moved - origin).norm(), 0.0));
    }

    #[test]
    fn is_identity_detects_self_mapping() {
        let mapping: ResidueMapping = (0..5).map(|i| (i, i)).collect();
        let alignment = SelfAlignment::new(mapping, vec![], vec![]);
        assert!(alignment.is_identity());

        let shifted: ResidueMapping = (0..5).map(|i| (i, i + 1)).collect();
        assert!(!SelfAlignment::new(shifted, vec![], vec![]).is_identity());
    }
}
