use crate::core::models::alignment::RotationGeometry;
use kiddo::{ImmutableKdTree, SquaredEuclidean};
use nalgebra::{Point3, Rotation3};

/// Rotates `points` about the geometry's axis (through its origin) by `angle` radians.
///
/// Any screw translation is ignored: the result is a pure rotation.
pub fn rotate_about_axis(
    points: &[Point3<f64>],
    geometry: &RotationGeometry,
    angle: f64,
) -> Vec<Point3<f64>> {
    let rotation = Rotation3::from_axis_angle(&geometry.axis, angle);
    points
        .iter()
        .map(|p| geometry.origin + rotation * (p - geometry.origin))
        .collect()
}

/// Builds a nearest-neighbour index over reference coordinates.
///
/// Coplanar sets and shared axis values are fine. Exact duplicates are collapsed first; they
/// cannot change a nearest-neighbour distance.
pub fn build_index(points: &[Point3<f64>]) -> ImmutableKdTree<f64, 3> {
    let mut positions: Vec<[f64; 3]> = points.iter().map(|p| [p.x, p.y, p.z]).collect();
    positions.sort_by(|a, b| {
        a[0].total_cmp(&b[0])
            .then(a[1].total_cmp(&b[1]))
            .then(a[2].total_cmp(&b[2]))
    });
    positions.dedup();
    ImmutableKdTree::new_from_slice(&positions)
}

/// TM-style similarity between a moved copy and the indexed reference.
///
/// Each moved point contributes `1 / (1 + (d / d0)^2)` where `d` is the distance to its nearest
/// reference point, so identical sets score 1 and the score decays towards 0 as they separate.
pub fn nearest_neighbour_similarity(
    reference: &ImmutableKdTree<f64, 3>,
    moved: &[Point3<f64>],
    d0: f64,
) -> f64 {
    if moved.is_empty() {
        return 0.0;
    }
    let d0_sq = d0 * d0;
    let total: f64 = moved
        .iter()
        .map(|p| {
            let nearest = reference.nearest_one::<SquaredEuclidean>(&[p.x, p.y, p.z]);
            1.0 / (1.0 + nearest.distance / d0_sq)
        })
        .sum();
    total / moved.len() as f64
}

/// Wraps an angle into `[-pi, pi]`.
#[inline]
pub fn wrap_angle(angle: f64) -> f64 {
    let two_pi = std::f64::consts::TAU;
    let wrapped = angle.rem_euclid(two_pi);
    if wrapped > std::f64::consts::PI {
        wrapped - two_pi
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn square() -> Vec<Point3<f64>> {
        vec![
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(0.0, 5.0, 0.0),
            Point3::new(-5.0, 0.0, 0.0),
            Point3::new(0.0, -5.0, 0.0),
        ]
    }

    #[test]
    fn rotate_about_axis_moves_points_around_origin() {
        let geometry = RotationGeometry::new(Vector3::z(), Point3::origin(), FRAC_PI_2).unwrap();
        let rotated = rotate_about_axis(&[Point3::new(1.0, 0.0, 0.0)], &geometry, FRAC_PI_2);
        assert!(f64_approx_equal(rotated[0].x, 0.0));
        assert!(f64_approx_equal(rotated[0].y, 1.0));
    }

    #[test]
    fn rotate_about_axis_respects_offset_origin() {
        let geometry =
            RotationGeometry::new(Vector3::z(), Point3::new(1.0, 0.0, 0.0), PI).unwrap();
        let rotated = rotate_about_axis(&[Point3::new(2.0, 0.0, 0.0)], &geometry, PI);
        assert!(f64_approx_equal(rotated[0].x, 0.0));
        assert!(f64_approx_equal(rotated[0].y, 0.0));
    }

    #[test]
    fn similarity_is_one_for_identical_sets() {
        let points = square();
        let index = build_index(&points);
        assert!(f64_approx_equal(
            nearest_neighbour_similarity(&index, &points, 3.8),
            1.0
        ));
    }

    #[test]
    fn similarity_is_one_after_symmetric_rotation_and_lower_otherwise() {
        let points = square();
        let index = build_index(&points);
        let geometry = RotationGeometry::new(Vector3::z(), Point3::origin(), FRAC_PI_2).unwrap();

        let symmetric = rotate_about_axis(&points, &geometry, FRAC_PI_2);
        let skewed = rotate_about_axis(&points, &geometry, PI / 4.0);

        assert!(f64_approx_equal(
            nearest_neighbour_similarity(&index, &symmetric, 3.8),
            1.0
        ));
        assert!(nearest_neighbour_similarity(&index, &skewed, 3.8) < 0.9);
    }

    #[test]
    fn similarity_of_empty_set_is_zero() {
        let index = build_index(&square());
        assert_eq!(nearest_neighbour_similarity(&index, &[], 3.8), 0.0);
    }

    #[test]
    fn index_accepts_large_coplanar_ring() {
        let ring: Vec<Point3<f64>> = (0..200)
            .map(|i| {
                let a = i as f64 * TAU / 200.0;
                Point3::new(20.0 * a.cos(), 20.0 * a.sin(), 0.0)
            })
            .collect();
        let index = build_index(&ring);
        assert!(f64_approx_equal(
            nearest_neighbour_similarity(&index, &ring, 3.8),
            1.0
        ));
    }

    #[test]
    fn index_accepts_repeated_points() {
        let repeated = vec![Point3::new(1.0, 2.0, 3.0); 100];
        let index = build_index(&repeated);
        assert!(f64_approx_equal(
            nearest_neighbour_similarity(&index, &repeated, 3.8),
            1.0
        ));
        let shifted = [Point3::new(1.0, 2.0, 6.8)];
        assert!(f64_approx_equal(
            nearest_neighbour_similarity(&index, &shifted, 3.8),
            0.5
        ));
    }

    #[test]
    fn wrap_angle_maps_into_symmetric_range() {
        assert!(f64_approx_equal(wrap_angle(3.0 * PI / 2.0), -FRAC_PI_2));
        assert!(f64_approx_equal(wrap_angle(-FRAC_PI_2), -FRAC_PI_2));
        assert!(f64_approx_equal(wrap_angle(0.25), 0.25));
    }
}
