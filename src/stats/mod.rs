//! Stats module - descriptive statistics and line fitting

mod calculator;
mod regression;

pub use calculator::{
    argmax, argmin, mean, population_std, sample_std, Histogram, StatsCalculator, Summary,
};
pub use regression::{fit_valid, linear_fit, linspace, LinearFit, RegressionError};
