//! Workspace configuration loaded from TOML.
//!
//! Lookup order: an explicit `--config` path (must exist), then
//! [`DEFAULT_CONFIG_FILE`] in the working directory if present, then
//! built-in defaults. Front ends apply their CLI overrides on top with the
//! `with_*` builders.
//!
//! ```toml
//! px_per_mm = 13.0
//! cell_px = 8.0
//! distance = "3m"
//! results_path = "acuity-results.jsonl"
//! seed = 42
//!
//! [log]
//! level = "info"
//! format = "json"
//! file = "acuity.log"
//! ```

use crate::calibration::{Calibration, DEFAULT_PX_PER_MM};
use crate::logging::LogConfig;
use crate::optotype::DistanceCategory;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "acuity.toml";

/// Result file used when nothing else is configured.
pub const DEFAULT_RESULTS_FILE: &str = "acuity-results.jsonl";

/// Display pixels covered by one terminal column.
pub const DEFAULT_CELL_PX: f64 = 8.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Settings shared by every front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcuityConfig {
    /// Rendering units per millimeter on the target display.
    pub px_per_mm: f64,
    /// Rendering units per terminal column, for the terminal renderer.
    pub cell_px: f64,
    /// Default viewing distance.
    pub distance: DistanceCategory,
    /// JSONL file results are appended to.
    pub results_path: PathBuf,
    /// Fixed seed for target directions. Unset draws from OS entropy.
    pub seed: Option<u64>,
    pub log: LogConfig,
}

impl Default for AcuityConfig {
    fn default() -> Self {
        AcuityConfig {
            px_per_mm: DEFAULT_PX_PER_MM,
            cell_px: DEFAULT_CELL_PX,
            distance: DistanceCategory::default(),
            results_path: PathBuf::from(DEFAULT_RESULTS_FILE),
            seed: None,
            log: LogConfig::default(),
        }
    }
}

impl AcuityConfig {
    /// Resolve and load configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&body).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(body: &str) -> Result<Self, ConfigError> {
        let config: AcuityConfig = toml::from_str(body).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if Calibration::new(self.px_per_mm).is_none() {
            return Err(ConfigError::Invalid {
                field: "px_per_mm",
                reason: format!("must be a positive number, got {}", self.px_per_mm),
            });
        }
        if !(self.cell_px.is_finite() && self.cell_px > 0.0) {
            return Err(ConfigError::Invalid {
                field: "cell_px",
                reason: format!("must be a positive number, got {}", self.cell_px),
            });
        }
        Ok(())
    }

    /// Display calibration. Falls back to the default density if the value
    /// was changed after validation to something unusable.
    pub fn calibration(&self) -> Calibration {
        Calibration::new(self.px_per_mm).unwrap_or_default()
    }

    pub fn with_distance(mut self, distance: DistanceCategory) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_path = path.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override the density, re-validating it.
    pub fn with_px_per_mm(mut self, px_per_mm: f64) -> Result<Self, ConfigError> {
        self.px_per_mm = px_per_mm;
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;

    #[test]
    fn defaults_match_reference_display() {
        let c = AcuityConfig::default();
        assert_eq!(c.px_per_mm, 13.0);
        assert_eq!(c.cell_px, 8.0);
        assert_eq!(c.distance, DistanceCategory::Near30Cm);
        assert_eq!(c.results_path, PathBuf::from("acuity-results.jsonl"));
        assert!(c.seed.is_none());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parses_full_file() {
        let c = AcuityConfig::from_toml_str(
            r#"
px_per_mm = 9.5
cell_px = 10.0
distance = "3m"
results_path = "out/results.jsonl"
seed = 42

[log]
level = "debug"
format = "json"
file = "acuity.log"
"#,
        )
        .unwrap();
        assert_eq!(c.px_per_mm, 9.5);
        assert_eq!(c.distance, DistanceCategory::Far3M);
        assert_eq!(c.seed, Some(42));
        assert_eq!(c.log.level, "debug");
        assert_eq!(c.log.format, LogFormat::Json);
        assert_eq!(c.log.file, Some(PathBuf::from("acuity.log")));
        assert_eq!(c.calibration().px_per_mm(), 9.5);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let c = AcuityConfig::from_toml_str("distance = \"3m\"\n").unwrap();
        assert_eq!(c.distance, DistanceCategory::Far3M);
        assert_eq!(c.px_per_mm, 13.0);
        assert_eq!(c.log, LogConfig::default());
    }

    #[test]
    fn rejects_non_positive_density() {
        let err = AcuityConfig::from_toml_str("px_per_mm = 0.0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "px_per_mm",
                ..
            }
        ));
        assert!(AcuityConfig::default().with_px_per_mm(-2.0).is_err());
    }

    #[test]
    fn rejects_unknown_keys_and_bad_distance() {
        assert!(matches!(
            AcuityConfig::from_toml_str("pixels = 3\n"),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            AcuityConfig::from_toml_str("distance = \"5m\"\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AcuityConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn from_file_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "px_per_mm = \"thirteen\"\n").unwrap();
        match AcuityConfig::from_file(&path).unwrap_err() {
            ConfigError::Parse { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn builders_override_fields() {
        let c = AcuityConfig::default()
            .with_distance(DistanceCategory::Far3M)
            .with_results_path("x.jsonl")
            .with_seed(9)
            .with_px_per_mm(20.0)
            .unwrap();
        assert_eq!(c.distance, DistanceCategory::Far3M);
        assert_eq!(c.results_path, PathBuf::from("x.jsonl"));
        assert_eq!(c.seed, Some(9));
        assert_eq!(c.px_per_mm, 20.0);
    }
}
