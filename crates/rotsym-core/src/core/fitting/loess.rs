//! Locally weighted linear regression (LOESS) with bisquare robustness iterations.
//!
//! Each point is replaced by the value of a weighted linear fit over its nearest
//! `bandwidth * n` neighbours, weighted by a tricube kernel of the distance. Robustness
//! iterations then down-weight points with large residuals, so isolated outliers do not drag
//! the smoothed curve.

use super::FitError;

const ACCURACY: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loess {
    bandwidth: f64,
    robustness_iterations: usize,
}

impl Loess {
    pub fn new(bandwidth: f64, robustness_iterations: usize) -> Result<Self, FitError> {
        if !(bandwidth > 0.0 && bandwidth <= 1.0) {
            return Err(FitError::InvalidBandwidth(bandwidth));
        }
        Ok(Self {
            bandwidth,
            robustness_iterations,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn robustness_iterations(&self) -> usize {
        self.robustness_iterations
    }

    /// Smooths `y` sampled at strictly increasing `x`.
    pub fn smooth(&self, x: &[f64], y: &[f64]) -> Result<Vec<f64>, FitError> {
        let n = x.len();
        if n != y.len() {
            return Err(FitError::LengthMismatch { x: n, y: y.len() });
        }
        if n == 0 {
            return Err(FitError::Empty);
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }
        if let Some(i) = (1..n).find(|&i| x[i] <= x[i - 1]) {
            return Err(FitError::UnsortedAbscissa(i));
        }
        if n <= 2 {
            return Ok(y.to_vec());
        }

        let window = (self.bandwidth * n as f64) as usize;
        if window < 2 {
            return Err(FitError::BandwidthTooSmall {
                bandwidth: self.bandwidth,
                points: n,
            });
        }

        let mut fitted = y.to_vec();
        let mut residuals = vec![0.0; n];
        let mut robustness = vec![1.0; n];

        for iteration in 0..=self.robustness_iterations {
            let (mut left, mut right) = (0, window - 1);

            for i in 0..n {
                while right + 1 < n && x[right + 1] - x[i] < x[i] - x[left] {
                    left += 1;
                    right += 1;
                }

                let xi = x[i];
                let edge = if xi - x[left] > x[right] - xi {
                    left
                } else {
                    right
                };
                let max_distance = (x[edge] - xi).abs();
                let scale = if max_distance > 0.0 {
                    1.0 / max_distance
                } else {
                    0.0
                };

                let mut sum_weights = 0.0;
                let mut sum_x = 0.0;
                let mut sum_x_sq = 0.0;
                let mut sum_y = 0.0;
                let mut sum_xy = 0.0;
                for k in left..=right {
                    let w = tricube((x[k] - xi).abs() * scale) * robustness[k];
                    let xkw = x[k] * w;
                    sum_weights += w;
                    sum_x += xkw;
                    sum_x_sq += x[k] * xkw;
                    sum_y += y[k] * w;
                    sum_xy += y[k] * xkw;
                }

                if sum_weights > 0.0 {
                    let mean_x = sum_x / sum_weights;
                    let mean_y = sum_y / sum_weights;
                    let mean_xy = sum_xy / sum_weights;
                    let mean_x_sq = sum_x_sq / sum_weights;
                    let variance = mean_x_sq - mean_x * mean_x;

                    let beta = if variance.abs().sqrt() < ACCURACY {
                        0.0
                    } else {
                        (mean_xy - mean_x * mean_y) / variance
                    };
                    fitted[i] = beta * xi + (mean_y - beta * mean_x);
                }
                residuals[i] = (y[i] - fitted[i]).abs();
            }

            if iteration == self.robustness_iterations {
                break;
            }

            let mut sorted = residuals.clone();
            sorted.sort_by(|a, b| a.total_cmp(b));
            let median = sorted[n / 2];
            if median.abs() < ACCURACY {
                break;
            }

            for (weight, residual) in robustness.iter_mut().zip(&residuals) {
                let arg = residual / (6.0 * median);
                *weight = if arg >= 1.0 {
                    0.0
                } else {
                    let t = 1.0 - arg * arg;
                    t * t
                };
            }
        }

        Ok(fitted)
    }
}

#[inline]
fn tricube(x: f64) -> f64 {
    let ax = x.abs();
    if ax >= 1.0 {
        0.0
    } else {
        let t = 1.0 - ax * ax * ax;
        t * t * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn new_rejects_bandwidth_outside_unit_interval() {
        assert!(Loess::new(0.0, 2).is_err());
        assert!(Loess::new(1.5, 2).is_err());
        assert!(Loess::new(f64::NAN, 2).is_err());
        assert!(Loess::new(1.0, 0).is_ok());
    }

    #[test]
    fn smooth_reproduces_a_straight_line() {
        let x: Vec<f64> = (0..20).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.5 * v - 4.0).collect();

        let smoothed = Loess::new(0.3, 2).unwrap().smooth(&x, &y).unwrap();

        for (s, expected) in smoothed.iter().zip(&y) {
            assert!(f64_approx_equal(*s, *expected));
        }
    }

    #[test]
    fn smooth_suppresses_single_outlier_with_robustness_iterations() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let mut y: Vec<f64> = (0..30).map(|i| 1.0 + 0.1 * (i % 2) as f64).collect();
        y[15] = 50.0;

        let plain = Loess::new(0.3, 0).unwrap().smooth(&x, &y).unwrap();
        let robust = Loess::new(0.3, 4).unwrap().smooth(&x, &y).unwrap();

        assert!((plain[14] - 1.05).abs() > 1.0);
        assert!((robust[14] - 1.05).abs() < 0.5);
        assert!((robust[16] - 1.05).abs() < 0.5);
    }

    #[test]
    fn smooth_returns_short_inputs_unchanged() {
        let smoothed = Loess::new(0.5, 2).unwrap().smooth(&[0.0, 1.0], &[3.0, 4.0]).unwrap();
        assert_eq!(smoothed, vec![3.0, 4.0]);
    }

    #[test]
    fn smooth_rejects_unsorted_and_mismatched_input() {
        let loess = Loess::new(0.5, 0).unwrap();
        assert_eq!(
            loess.smooth(&[0.0, 2.0, 1.0], &[0.0, 0.0, 0.0]),
            Err(FitError::UnsortedAbscissa(2))
        );
        assert!(matches!(
            loess.smooth(&[0.0, 1.0], &[0.0]),
            Err(FitError::LengthMismatch { .. })
        ));
        assert_eq!(loess.smooth(&[], &[]), Err(FitError::Empty));
    }

    #[test]
    fn smooth_rejects_bandwidth_covering_too_few_points() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let result = Loess::new(0.1, 0).unwrap().smooth(&x, &x);
        assert!(matches!(result, Err(FitError::BandwidthTooSmall { .. })));
    }
}
