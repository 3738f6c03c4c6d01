use super::FitError;
use nalgebra::{DMatrix, DVector};

const SINGULAR_VALUE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub coefficients: DVector<f64>,
    /// Residual sum of squared errors.
    pub sse: f64,
}

/// Solves `design * beta ≈ observations` in the least-squares sense.
pub fn fit_linear(
    design: &DMatrix<f64>,
    observations: &DVector<f64>,
) -> Result<LinearFit, FitError> {
    let (rows, cols) = design.shape();
    if rows != observations.len() {
        return Err(FitError::LengthMismatch {
            x: rows,
            y: observations.len(),
        });
    }
    if rows == 0 || cols == 0 {
        return Err(FitError::Empty);
    }
    if rows < cols {
        return Err(FitError::Underdetermined { rows, cols });
    }
    if design.iter().chain(observations.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::NonFinite);
    }

    let coefficients = design
        .clone()
        .svd(true, true)
        .solve(observations, SINGULAR_VALUE_EPSILON)
        .map_err(FitError::Singular)?;

    let residuals = observations - design * &coefficients;
    Ok(LinearFit {
        sse: residuals.norm_squared(),
        coefficients,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn fit_linear_recovers_exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let design = DMatrix::from_fn(4, 2, |r, c| if c == 0 { 1.0 } else { xs[r] });
        let observations = DVector::from_iterator(4, xs.iter().map(|x| 2.0 + 3.0 * x));

        let fit = fit_linear(&design, &observations).unwrap();

        assert!(f64_approx_equal(fit.coefficients[0], 2.0));
        assert!(f64_approx_equal(fit.coefficients[1], 3.0));
        assert!(f64_approx_equal(fit.sse, 0.0));
    }

    #[test]
    fn fit_linear_reports_residual_error() {
        let design = DMatrix::from_element(2, 1, 1.0);
        let observations = DVector::from_vec(vec![0.0, 2.0]);

        let fit = fit_linear(&design, &observations).unwrap();

        assert!(f64_approx_equal(fit.coefficients[0], 1.0));
        assert!(f64_approx_equal(fit.sse, 2.0));
    }

    #[test]
    fn fit_linear_rejects_underdetermined_system() {
        let design = DMatrix::from_element(1, 2, 1.0);
        let observations = DVector::from_vec(vec![1.0]);
        assert_eq!(
            fit_linear(&design, &observations),
            Err(FitError::Underdetermined { rows: 1, cols: 2 })
        );
    }

    #[test]
    fn fit_linear_rejects_mismatched_lengths_and_non_finite_input() {
        let design = DMatrix::from_element(2, 1, 1.0);
        assert!(matches!(
            fit_linear(&design, &DVector::from_vec(vec![1.0])),
            Err(FitError::LengthMismatch { .. })
        ));
        assert_eq!(
            fit_linear(&design, &DVector::from_vec(vec![1.0, f64::NAN])),
            Err(FitError::NonFinite)
        );
    }
}
