//! Data Processor Module
//! Turns loaded tables into clean measurement sets.

use polars::prelude::*;
use thiserror::Error;

use super::MeasurementSet;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    MissingColumn(String),
}

/// Paired columns extracted from a table, before and after cleaning.
#[derive(Debug, Clone)]
pub struct ExtractedPairs {
    pub set: MeasurementSet,
    pub total_rows: usize,
    pub dropped_rows: usize,
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Read one column as `f64`, mapping nulls and unparsable cells to `None`.
    pub fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ProcessorError> {
        let column = df
            .column(name)
            .map_err(|_| ProcessorError::MissingColumn(name.to_string()))?;
        let value_f64 = column.cast(&DataType::Float64)?;
        let value_ca = value_f64.f64()?;
        Ok(value_ca.into_iter().collect())
    }

    /// Pair two numeric columns, dropping rows where either side is missing or NaN.
    pub fn to_measurement_set(
        df: &DataFrame,
        x_col: &str,
        y_col: &str,
    ) -> Result<ExtractedPairs, ProcessorError> {
        let x = Self::numeric_column(df, x_col)?;
        let y = Self::numeric_column(df, y_col)?;

        let set = MeasurementSet::from_optional(&x, &y);
        let total_rows = df.height();
        let dropped_rows = total_rows - set.len();
        if dropped_rows > 0 {
            log::warn!("dropped {dropped_rows} of {total_rows} rows with missing {x_col}/{y_col}");
        }

        Ok(ExtractedPairs {
            set,
            total_rows,
            dropped_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_with_nulls_are_dropped() {
        let df = DataFrame::new(vec![
            Column::new("L_cm".into(), [5.0, 10.0, 15.0, 20.0]),
            Column::new("V".into(), [Some(0.007), Some(0.020), None, Some(0.034)]),
        ])
        .unwrap();

        let pairs = DataProcessor::to_measurement_set(&df, "L_cm", "V").unwrap();
        assert_eq!(pairs.total_rows, 4);
        assert_eq!(pairs.dropped_rows, 1);
        assert_eq!(pairs.set.x(), &[5.0, 10.0, 20.0]);
    }

    #[test]
    fn missing_column_is_reported() {
        let df = DataFrame::new(vec![Column::new("I".into(), [1.0, 2.0])]).unwrap();
        let err = DataProcessor::to_measurement_set(&df, "I", "B").unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn(c) if c == "B"));
    }

    #[test]
    fn integer_columns_are_cast() {
        let df = DataFrame::new(vec![
            Column::new("N".into(), [200i64, 400, 600]),
            Column::new("V".into(), [15.83, 31.25, 47.05]),
        ])
        .unwrap();
        let pairs = DataProcessor::to_measurement_set(&df, "N", "V").unwrap();
        assert_eq!(pairs.set.x(), &[200.0, 400.0, 600.0]);
    }
}
