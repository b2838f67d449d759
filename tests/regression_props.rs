use labcharts::physics::resistance;
use labcharts::stats::{linear_fit, RegressionError};
use proptest::prelude::*;

/// Distinct, increasing x values with arbitrary y.
fn readings() -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (2usize..40).prop_flat_map(|n| {
        (
            prop::collection::vec(0.1f64..10.0, n),
            prop::collection::vec(-1e3f64..1e3, n),
        )
            .prop_map(|(steps, y)| {
                let x = steps
                    .iter()
                    .scan(0.0, |acc, step| {
                        *acc += step;
                        Some(*acc)
                    })
                    .collect();
                (x, y)
            })
    })
}

proptest! {
    #[test]
    fn fitted_line_passes_through_the_means((x, y) in readings()) {
        let fit = linear_fit(&x, &y).unwrap();
        let x_mean = x.iter().sum::<f64>() / x.len() as f64;
        let y_mean = y.iter().sum::<f64>() / y.len() as f64;
        prop_assert!((fit.predict(x_mean) - y_mean).abs() < 1e-6 * (1.0 + y_mean.abs()));
    }

    #[test]
    fn r_squared_stays_in_unit_interval((x, y) in readings()) {
        let fit = linear_fit(&x, &y).unwrap();
        prop_assert!(fit.r_squared >= 0.0 && fit.r_squared <= 1.0 + 1e-12, "{}", fit.r_squared);
    }

    #[test]
    fn exact_lines_are_recovered(
        slope in prop_oneof![-50.0f64..-0.01, 0.01f64..50.0],
        intercept in -100.0f64..100.0,
        (x, _) in readings(),
    ) {
        let y: Vec<f64> = x.iter().map(|v| slope * v + intercept).collect();
        let fit = linear_fit(&x, &y).unwrap();
        prop_assert!((fit.slope - slope).abs() < 1e-6 * slope.abs().max(1.0));
        prop_assert!((fit.intercept - intercept).abs() < 1e-6 * (1.0 + intercept.abs()) * 10.0);
        prop_assert!((fit.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn resistance_is_positive_for_matching_signs(v in 0.001f64..100.0, i in 0.001f64..10.0) {
        prop_assert!(resistance(v, i).unwrap() > 0.0);
        prop_assert!(resistance(-v, -i).unwrap() > 0.0);
    }
}

#[test]
fn zero_current_has_no_resistance() {
    assert_eq!(resistance(1.5, 0.0), None);
}

#[test]
fn degenerate_inputs_are_rejected() {
    assert_eq!(
        linear_fit(&[1.0], &[2.0]).unwrap_err(),
        RegressionError::InsufficientPoints(1)
    );
    assert_eq!(
        linear_fit(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err(),
        RegressionError::ConstantX
    );
    assert!(matches!(
        linear_fit(&[1.0, 2.0], &[1.0]),
        Err(RegressionError::LengthMismatch { x: 2, y: 1 })
    ));
    assert_eq!(
        linear_fit(&[1.0, f64::NAN, 3.0], &[1.0, 2.0, 3.0]).unwrap_err(),
        RegressionError::NonFinite(1)
    );
}
