//! Closed-form physical relations used by the labs.
//!
//! Everything here is elementwise arithmetic on SI quantities. Divisions that
//! would produce an infinite or undefined result return `None` instead.

use std::f64::consts::PI;

/// Vacuum permeability, T·m/A.
pub const MU0: f64 = 4.0 * PI * 1e-7;

/// `R = V / I`. A zero or non-finite current is rejected.
pub fn resistance(voltage: f64, current: f64) -> Option<f64> {
    ratio(voltage, current)
}

/// Elementwise `R = V / I` over paired readings; a missing current yields `None`.
pub fn resistances(voltages: &[f64], currents: &[Option<f64>]) -> Vec<Option<f64>> {
    voltages
        .iter()
        .zip(currents)
        .map(|(&v, i)| i.and_then(|i| resistance(v, i)))
        .collect()
}

/// `a / b`, or `None` when `b` is zero or either side is not finite.
pub fn ratio(a: f64, b: f64) -> Option<f64> {
    if b == 0.0 || !a.is_finite() || !b.is_finite() {
        return None;
    }
    Some(a / b)
}

/// Elementwise ratio of two equal-length sequences.
pub fn ratios(a: &[f64], b: &[f64]) -> Vec<Option<f64>> {
    a.iter().zip(b).map(|(&a, &b)| ratio(a, b)).collect()
}

/// `|measured - reference| / |reference| * 100`.
pub fn percent_error(measured: f64, reference: f64) -> Option<f64> {
    ratio((measured - reference).abs(), reference.abs()).map(|e| e * 100.0)
}

/// Cross-section of a round wire of diameter `d` (m), in m².
pub fn wire_area(diameter: f64) -> f64 {
    let r = diameter / 2.0;
    PI * r * r
}

/// `L / A` in m⁻¹ for lengths given in centimetres.
pub fn length_over_area(lengths_cm: &[f64], diameter: f64) -> Vec<f64> {
    let area = wire_area(diameter);
    lengths_cm.iter().map(|l| l * 1e-2 / area).collect()
}

pub fn series_resistance(resistors: &[f64]) -> f64 {
    resistors.iter().sum()
}

/// `1 / Σ(1/R)`. Any zero resistor short-circuits the network.
pub fn parallel_resistance(resistors: &[f64]) -> Option<f64> {
    if resistors.is_empty() || resistors.iter().any(|r| *r == 0.0) {
        return None;
    }
    ratio(1.0, resistors.iter().map(|r| 1.0 / r).sum())
}

/// `B = μ₀ I / (2π s)` solved for μ₀ from the slope of B(I).
pub fn mu0_straight_wire(slope: f64, distance: f64) -> f64 {
    2.0 * PI * distance * slope
}

/// `B = μ₀ I / (2R)` solved for μ₀ from the slope of B(I).
pub fn mu0_circular_loop(slope: f64, radius: f64) -> f64 {
    2.0 * radius * slope
}

/// `B = μ₀ n I` with `n = N / ℓ`, solved for μ₀ from the slope of B(I).
pub fn mu0_solenoid(slope: f64, turns: f64, length: f64) -> Option<f64> {
    ratio(turns, length).and_then(|n| ratio(slope, n))
}

/// `P_out / P_in * 100`.
pub fn efficiency(p_out: f64, p_in: f64) -> Option<f64> {
    ratio(p_out, p_in).map(|e| e * 100.0)
}

/// Average induced EMF `N · B · A / Δt`, in millivolts.
pub fn faraday_emf_mv(turns: f64, field: f64, area: f64, dt: f64) -> Option<f64> {
    ratio(turns * field * area, dt).map(|v| v * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resistance_is_positive_for_same_sign_readings() {
        assert!(resistance(7.41, 0.120).unwrap() > 0.0);
        assert!(resistance(-7.41, -0.120).unwrap() > 0.0);
    }

    #[test]
    fn zero_current_is_rejected() {
        assert_eq!(resistance(1.0, 0.0), None);
        assert_eq!(resistance(1.0, -0.0), None);
        assert_eq!(resistance(f64::NAN, 1.0), None);
    }

    #[test]
    fn resistances_skip_missing_currents() {
        let r = resistances(&[0.007, 0.020, 0.033], &[Some(0.027), Some(0.027), None]);
        assert!(r[0].is_some() && r[1].is_some());
        assert!(r[2].is_none());
    }

    #[test]
    fn series_and_parallel_equivalents() {
        let rs = [46.5, 98.8, 149.5, 216.1];
        assert!((series_resistance(&rs) - 510.9).abs() < 1e-9);
        let p = parallel_resistance(&rs).unwrap();
        assert!(p < 46.5);
        assert_eq!(parallel_resistance(&[10.0, 0.0]), None);
        assert_eq!(parallel_resistance(&[]), None);
    }

    #[test]
    fn wire_geometry() {
        let a = wire_area(0.4e-3);
        assert!((a - 1.256_637e-7).abs() < 1e-12);
        let la = length_over_area(&[50.0], 0.4e-3);
        assert!((la[0] - 0.5 / a).abs() < 1e-6);
    }

    #[test]
    fn mu0_from_ideal_slopes_recovers_constant() {
        let s = 0.001;
        let slope = MU0 / (2.0 * PI * s);
        assert!((mu0_straight_wire(slope, s) - MU0).abs() < 1e-18);
        let slope = MU0 / (2.0 * 0.02);
        assert!((mu0_circular_loop(slope, 0.02) - MU0).abs() < 1e-18);
        let slope = MU0 * 500.0 / 9e-3;
        assert!((mu0_solenoid(slope, 500.0, 9e-3).unwrap() - MU0).abs() < 1e-18);
    }

    #[test]
    fn percent_error_and_efficiency() {
        assert!((percent_error(63.0, 60.0).unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(percent_error(1.0, 0.0), None);
        assert!((efficiency(3.94, 7.02).unwrap() - 56.125_356).abs() < 1e-5);
    }
}
