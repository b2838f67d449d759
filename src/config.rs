//! Run configuration: where charts go and how they are drawn.

use std::fs;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::charts::StaticChartRenderer;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Lab directories (`Taller_1`, `i3`, ...) are created under this root.
    pub output_root: PathBuf,
    pub dpi: f64,
    pub font_family: String,
    pub pdf_input: PathBuf,
    pub pdf_output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_root: PathBuf::from("."),
            dpi: 150.0,
            font_family: String::from("sans-serif"),
            pdf_input: PathBuf::from("Taller_3/F2W07.pdf"),
            pdf_output: PathBuf::from("Taller_3/F2W07_extracted.txt"),
        }
    }
}

impl Config {
    /// Picked up from the working directory when no `--config` is given.
    pub const DEFAULT_FILE: &'static str = "labcharts.json";

    /// Load a config file. Keys left out keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist; otherwise `labcharts.json` in the working
    /// directory is used when present, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(Self::DEFAULT_FILE);
                if fallback.is_file() {
                    log::debug!("using {}", fallback.display());
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dpi.is_finite() || self.dpi < 10.0 || self.dpi > 1200.0 {
            return Err(ConfigError::Invalid(format!(
                "dpi must be between 10 and 1200, got {}",
                self.dpi
            )));
        }
        if self.font_family.trim().is_empty() {
            return Err(ConfigError::Invalid("font_family is empty".into()));
        }
        Ok(())
    }

    /// Apply global command-line overrides on top of the file values.
    pub fn apply_matches(&mut self, matches: &ArgMatches) -> Result<(), ConfigError> {
        if let Some(root) = matches.get_one::<PathBuf>("output_root") {
            self.output_root = root.clone();
        }
        if let Some(dpi) = matches.get_one::<f64>("dpi") {
            self.dpi = *dpi;
        }
        self.validate()
    }

    pub fn renderer(&self) -> StaticChartRenderer {
        StaticChartRenderer::new(self.dpi, self.font_family.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labcharts.json");
        fs::write(&path, r#"{ "dpi": 300 }"#).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.dpi, 300.0);
        assert_eq!(config.font_family, "sans-serif");
        assert_eq!(config.pdf_input, PathBuf::from("Taller_3/F2W07.pdf"));
    }

    #[test]
    fn missing_explicit_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ dpi: ").unwrap();
        assert!(matches!(
            Config::from_file(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
        fs::write(&path, r#"{ "colour": "red" }"#).unwrap();
        assert!(matches!(
            Config::from_file(&path).unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn dpi_out_of_range_is_rejected() {
        let config = Config {
            dpi: 0.0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
