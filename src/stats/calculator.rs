//! Statistics Calculator Module
//! Descriptive statistics and histogram binning for measurement sets.

use serde::Serialize;

/// Descriptive statistics for a single sequence of readings.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (ddof = 1).
    pub std: f64,
    /// Population standard deviation (ddof = 0).
    pub population_std: f64,
    pub variance: f64,
    /// Standard error of the mean, `std / sqrt(n)`.
    pub std_error: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            population_std: f64::NAN,
            variance: f64::NAN,
            std_error: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            p25: f64::NAN,
            p75: f64::NAN,
        }
    }
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        StatsCalculator::compute_descriptive_stats(values)
    }
}

/// Equal-width bins shared by every data set of a histogram.
#[derive(Debug, Clone)]
pub struct Histogram {
    pub edges: Vec<f64>,
    /// One count vector per input set, each `edges.len() - 1` long.
    pub counts: Vec<Vec<usize>>,
}

impl Histogram {
    pub fn bin_width(&self) -> f64 {
        match self.edges.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }
}

/// Handles statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> Summary {
        let n = values.len();
        if n == 0 {
            return Summary::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = mean(values);
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        // ddof = 1: undefined for a single reading
        let variance = if n > 1 {
            values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            f64::NAN
        };
        let std = variance.sqrt();

        Summary {
            count: n,
            mean,
            median,
            std,
            population_std: population_std(values),
            variance,
            std_error: std / (n as f64).sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
            p25: Self::percentile(&sorted, 25.0),
            p75: Self::percentile(&sorted, 75.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Bin several data sets over their combined range (NumPy `hist` semantics:
    /// equal-width bins, the last one closed on the right).
    pub fn histogram(sets: &[&[f64]], bins: usize) -> Histogram {
        let bins = bins.max(1);
        let (mut lo, mut hi) = sets
            .iter()
            .flat_map(|s| s.iter().copied())
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() {
            lo = 0.0;
            hi = 1.0;
        } else if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
        let counts = sets
            .iter()
            .map(|set| {
                let mut counts = vec![0usize; bins];
                for &v in set.iter().filter(|v| v.is_finite()) {
                    let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
                    counts[idx] += 1;
                }
                counts
            })
            .collect();

        Histogram { edges, counts }
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (ddof = 1). NaN for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    (values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    (values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Index of the largest value; NaNs are skipped.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

pub fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_nan_summary() {
        let s = Summary::of(&[]);
        assert_eq!(s.count, 0);
        assert!(s.mean.is_nan());
    }

    #[test]
    fn single_reading_has_undefined_sample_spread() {
        let s = Summary::of(&[2.43]);
        assert_eq!(s.count, 1);
        assert_eq!(s.mean, 2.43);
        assert_eq!(s.median, 2.43);
        assert!(s.std.is_nan() && s.variance.is_nan() && s.std_error.is_nan());
        assert!(sample_std(&[2.43]).is_nan());
        assert_eq!(s.population_std, 0.0);
    }

    #[test]
    fn arc_readings_match_hand_computed_values() {
        // First disc-disc arc of the equipotential lab.
        let s = Summary::of(&[-0.17, -0.24, -0.19, -0.18, -0.22]);
        assert!((s.mean + 0.2).abs() < 1e-12);
        assert!((s.std - 0.029_154_759).abs() < 1e-6);
        assert!((s.std_error - s.std / 5f64.sqrt()).abs() < 1e-12);
        assert_eq!(s.min, -0.24);
        assert_eq!(s.max, -0.17);
    }

    #[test]
    fn percentile_interpolates_like_numpy() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((StatsCalculator::percentile(&sorted, 25.0) - 1.75).abs() < 1e-12);
        assert!((StatsCalculator::percentile(&sorted, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(StatsCalculator::percentile(&[7.0], 90.0), 7.0);
    }

    #[test]
    fn population_and_sample_std_differ_by_ddof() {
        let v = [0.079, 0.078, 0.078];
        assert!(population_std(&v) < sample_std(&v));
        assert!(sample_std(&[1.0]).is_nan());
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let a = [-2.5, -2.025, -1.95, -4.475];
        let b = [6.03, 5.17, 4.47, 2.87];
        let h = StatsCalculator::histogram(&[&a, &b], 8);
        assert_eq!(h.edges.len(), 9);
        assert_eq!(h.counts[0].iter().sum::<usize>(), a.len());
        assert_eq!(h.counts[1].iter().sum::<usize>(), b.len());
        // Maximum lands in the closed last bin.
        assert_eq!(h.counts[1][7], 1);
    }

    #[test]
    fn argmax_and_argmin_pick_extremes() {
        let v = [56.1, 57.0, 69.4, 77.3, 84.0];
        assert_eq!(argmax(&v), Some(4));
        assert_eq!(argmin(&v), Some(0));
        assert_eq!(argmax(&[]), None);
    }
}
