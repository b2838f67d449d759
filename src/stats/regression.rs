//! Ordinary least-squares line fitting.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressionError {
    #[error("need at least 2 valid points for a linear fit, got {0}")]
    InsufficientPoints(usize),
    #[error("x and y lengths differ: {x} vs {y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("non-finite value at index {0}")]
    NonFinite(usize),
    #[error("cannot fit a line when all x values are identical")]
    ConstantX,
}

/// Result of fitting `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient.
    pub r: f64,
    pub r_squared: f64,
    pub slope_stderr: f64,
    pub intercept_stderr: f64,
    /// Two-sided p-value for the hypothesis `slope == 0`.
    pub p_value: f64,
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Evenly sample the fitted line over `[x0, x1]`.
    pub fn line(&self, x0: f64, x1: f64, samples: usize) -> Vec<(f64, f64)> {
        linspace(x0, x1, samples)
            .into_iter()
            .map(|x| (x, self.predict(x)))
            .collect()
    }
}

/// Fit a line through `(x, y)`. Both slices must be equal length, finite, and
/// hold at least two points with distinct x.
pub fn linear_fit(x: &[f64], y: &[f64]) -> Result<LinearFit, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(RegressionError::InsufficientPoints(n));
    }
    if let Some(idx) = x
        .iter()
        .zip(y)
        .position(|(a, b)| !a.is_finite() || !b.is_finite())
    {
        return Err(RegressionError::NonFinite(idx));
    }

    let nf = n as f64;
    let x_mean = x.iter().sum::<f64>() / nf;
    let y_mean = y.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return Err(RegressionError::ConstantX);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let r_den = (sxx * syy).sqrt();
    let r = if r_den == 0.0 {
        0.0
    } else {
        (sxy / r_den).clamp(-1.0, 1.0)
    };
    let r_squared = r * r;

    let (slope_stderr, p_value) = if n == 2 {
        let p = if y[0] == y[1] { 1.0 } else { 0.0 };
        (0.0, p)
    } else {
        let df = nf - 2.0;
        let stderr = ((1.0 - r_squared).max(0.0) * syy / sxx / df).sqrt();
        (stderr, slope_p_value(r, df))
    };
    let intercept_stderr = slope_stderr * (sxx / nf + x_mean * x_mean).sqrt();

    Ok(LinearFit {
        slope,
        intercept,
        r,
        r_squared,
        slope_stderr,
        intercept_stderr,
        p_value,
        n,
    })
}

/// Drop pairs where either member is missing or non-finite, then fit.
pub fn fit_valid(x: &[Option<f64>], y: &[Option<f64>]) -> Result<LinearFit, RegressionError> {
    if x.len() != y.len() {
        return Err(RegressionError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .unzip();
    linear_fit(&xs, &ys)
}

fn slope_p_value(r: f64, df: f64) -> f64 {
    let denom = (1.0 - r) * (1.0 + r);
    if denom <= 0.0 {
        return 0.0;
    }
    let t = r * (df / denom).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// `samples` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, samples: usize) -> Vec<f64> {
    match samples {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (samples - 1) as f64;
            (0..samples).map(|i| start + step * i as f64).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OHMIC_I: [f64; 10] = [
        0.120, 0.190, 0.290, 0.350, 0.440, 0.530, 0.672, 0.761, 0.824, 0.918,
    ];
    const OHMIC_V: [f64; 10] = [
        7.41, 11.86, 17.84, 21.57, 27.02, 32.15, 40.60, 46.31, 51.02, 55.34,
    ];

    #[test]
    fn ohmic_phase_fit_is_near_sixty_ohms() {
        let fit = linear_fit(&OHMIC_I, &OHMIC_V).unwrap();
        assert!(fit.slope > 58.0 && fit.slope < 62.0, "slope {}", fit.slope);
        assert!(fit.r_squared > 0.999);
        assert!(fit.p_value < 1e-6);
        assert_eq!(fit.n, 10);
    }

    #[test]
    fn exact_line_is_recovered() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = x.iter().map(|v| 2.5 * v - 1.0).collect();
        let fit = linear_fit(&x, &y).unwrap();
        assert!((fit.slope - 2.5).abs() < 1e-12);
        assert!((fit.intercept + 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert!(fit.slope_stderr.abs() < 1e-9);
    }

    #[test]
    fn too_few_points_is_an_error() {
        assert_eq!(
            linear_fit(&[1.0], &[2.0]).unwrap_err(),
            RegressionError::InsufficientPoints(1)
        );
        assert_eq!(
            linear_fit(&[], &[]).unwrap_err(),
            RegressionError::InsufficientPoints(0)
        );
    }

    #[test]
    fn constant_x_is_rejected() {
        assert_eq!(
            linear_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err(),
            RegressionError::ConstantX
        );
    }

    #[test]
    fn constant_y_has_zero_correlation() {
        let fit = linear_fit(&[1.0, 2.0, 3.0], &[4.0, 4.0, 4.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
    }

    #[test]
    fn two_points_fit_exactly_with_zero_stderr() {
        let fit = linear_fit(&[0.0, 1.0], &[1.0, 3.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert_eq!(fit.slope_stderr, 0.0);
        assert_eq!(fit.p_value, 0.0);
    }

    #[test]
    fn fit_valid_skips_missing_pairs() {
        let x = [Some(1.0), Some(2.0), None, Some(4.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0), Some(f64::NAN)];
        let fit = fit_valid(&x, &y).unwrap();
        assert_eq!(fit.n, 2);

        let y_sparse = [Some(2.0), None, None, None];
        assert_eq!(
            fit_valid(&x, &y_sparse).unwrap_err(),
            RegressionError::InsufficientPoints(1)
        );
    }

    #[test]
    fn non_finite_input_is_reported() {
        assert_eq!(
            linear_fit(&[1.0, f64::INFINITY], &[1.0, 2.0]).unwrap_err(),
            RegressionError::NonFinite(1)
        );
    }

    #[test]
    fn linspace_includes_both_ends() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }
}
