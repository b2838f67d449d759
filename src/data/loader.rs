//! CSV readings loader for the ad-hoc `fit` command.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV file not found: {0}")]
    NotFound(PathBuf),
    #[error("No data loaded")]
    NoData,
}

/// Holds one CSV table of readings.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Read a CSV with a header row. Cells that fail to parse become nulls.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        if !file_path.exists() {
            return Err(LoaderError::NotFound(file_path.to_path_buf()));
        }

        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        log::debug!(
            "loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            file_path.display()
        );
        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Columns polars inferred as numeric, in file order.
    pub fn get_numeric_columns(&self) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .filter(|col| col.dtype().is_primitive_numeric())
            .map(|col| col.name().to_string())
            .collect()
    }

    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_numeric_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lecturas.csv");
        std::fs::write(&path, "punto,V,I\na,0.6,0.01\nb,1.2,0.02\n").unwrap();

        let mut loader = DataLoader::new();
        assert_eq!(loader.load_csv(&path).unwrap().height(), 2);
        assert_eq!(loader.get_numeric_columns(), vec!["V", "I"]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let mut loader = DataLoader::new();
        let err = loader.load_csv(Path::new("no/such/file.csv")).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
        assert!(loader.get_dataframe().is_none());
    }
}
