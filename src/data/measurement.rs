//! Measurement sets: ordered (x, y) readings with optional uncertainty.

use crate::stats::{linear_fit, LinearFit, RegressionError};

/// An ordered sequence of paired readings, fixed once built.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSet {
    x: Vec<f64>,
    y: Vec<f64>,
    uncertainty: Option<Vec<f64>>,
}

impl MeasurementSet {
    /// Pair two sequences. Extra trailing values on the longer side are ignored.
    pub fn new(x: &[f64], y: &[f64]) -> Self {
        let n = x.len().min(y.len());
        Self {
            x: x[..n].to_vec(),
            y: y[..n].to_vec(),
            uncertainty: None,
        }
    }

    /// Build from possibly-missing readings, keeping only complete finite pairs.
    pub fn from_optional(x: &[Option<f64>], y: &[Option<f64>]) -> Self {
        let (x, y): (Vec<f64>, Vec<f64>) = x
            .iter()
            .zip(y)
            .filter_map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
                _ => None,
            })
            .unzip();
        Self {
            x,
            y,
            uncertainty: None,
        }
    }

    /// Attach per-point uncertainty on y. Must match the set length.
    pub fn with_uncertainty(mut self, uncertainty: &[f64]) -> Self {
        if uncertainty.len() == self.x.len() {
            self.uncertainty = Some(uncertainty.to_vec());
        } else {
            log::warn!(
                "ignoring uncertainty of length {} for a set of {} points",
                uncertainty.len(),
                self.x.len()
            );
        }
        self
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn uncertainty(&self) -> Option<&[f64]> {
        self.uncertainty.as_deref()
    }

    pub fn points(&self) -> Vec<(f64, f64)> {
        self.x.iter().copied().zip(self.y.iter().copied()).collect()
    }

    /// Same readings with y multiplied by `factor` (unit conversion).
    pub fn scale_y(&self, factor: f64) -> Self {
        Self {
            x: self.x.clone(),
            y: self.y.iter().map(|v| v * factor).collect(),
            uncertainty: self
                .uncertainty
                .as_ref()
                .map(|u| u.iter().map(|v| v * factor).collect()),
        }
    }

    pub fn x_range(&self) -> Option<(f64, f64)> {
        min_max(&self.x)
    }

    pub fn y_range(&self) -> Option<(f64, f64)> {
        min_max(&self.y)
    }

    pub fn fit(&self) -> Result<LinearFit, RegressionError> {
        linear_fit(&self.x, &self.y)
    }
}

pub(crate) fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_optional_keeps_complete_pairs() {
        let set = MeasurementSet::from_optional(
            &[Some(5.0), Some(10.0), Some(15.0)],
            &[Some(0.26), None, Some(f64::NAN)],
        );
        assert_eq!(set.len(), 1);
        assert_eq!(set.points(), vec![(5.0, 0.26)]);
    }

    #[test]
    fn uncertainty_length_must_match() {
        let set = MeasurementSet::new(&[200.0, 400.0, 600.0], &[15.83, 31.25, 47.05])
            .with_uncertainty(&[0.10, 0.12]);
        assert!(set.uncertainty().is_none());
        let set = set.with_uncertainty(&[0.10, 0.12, 0.13]);
        assert_eq!(set.uncertainty().unwrap().len(), 3);
    }

    #[test]
    fn scale_y_converts_units() {
        let set = MeasurementSet::new(&[1.0, 2.0], &[0.040, 0.083]).scale_y(1e-3);
        assert!((set.y()[1] - 0.083e-3).abs() < 1e-15);
        assert_eq!(set.x_range(), Some((1.0, 2.0)));
    }
}
