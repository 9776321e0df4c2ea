//! Engine configuration loaded from an optional JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::MaterialCatalog;
use crate::chart::ChartSettings;
use crate::errors::{CatalogError, ConfigError};
use crate::simulation::Calibration;

/// Settings for a [`Workbench`](crate::Workbench).
///
/// Every field has a default, so an empty JSON object is a valid configuration.
///
/// # Examples
/// ```
/// use woodsim::EngineConfig;
///
/// let config = EngineConfig::from_json_str(r#"{"url_prefix": "/charts"}"#)
///     .expect("valid configuration");
/// assert_eq!(config.url_prefix, "/charts");
/// assert_eq!(config.chart_width, 800);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory chart images are written to.
    pub artifact_dir: PathBuf,
    /// URL prefix the artifact directory is served under.
    pub url_prefix: String,
    /// Chart width in pixels.
    pub chart_width: u32,
    /// Chart height in pixels.
    pub chart_height: u32,
    /// TrueType font used for chart text.
    pub font_path: Option<PathBuf>,
    /// Scale factors of the property models.
    pub calibration: Calibration,
    /// Catalog document replacing the built-in materials.
    pub catalog: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let chart = ChartSettings::default();
        Self {
            artifact_dir: chart.artifact_dir,
            url_prefix: chart.url_prefix,
            chart_width: chart.width,
            chart_height: chart.height,
            font_path: chart.font_path,
            calibration: Calibration::default(),
            catalog: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown keys.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// errors of [`EngineConfig::from_json_str`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("using configuration {}", path.display());
        Self::from_json_str(&json)
    }

    /// The configured catalog, or the built-in one when none is configured.
    ///
    /// # Errors
    ///
    /// Returns the [`CatalogError`] of a configured catalog that fails to load.
    pub fn load_catalog(&self) -> Result<MaterialCatalog, CatalogError> {
        match &self.catalog {
            Some(path) => MaterialCatalog::from_path(path),
            None => Ok(MaterialCatalog::builtin()),
        }
    }

    /// Chart output settings.
    #[must_use]
    pub fn chart_settings(&self) -> ChartSettings {
        ChartSettings {
            artifact_dir: self.artifact_dir.clone(),
            url_prefix: self.url_prefix.clone(),
            width: self.chart_width,
            height: self.chart_height,
            font_path: self.font_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_json_str("{}").expect("empty configuration");
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.artifact_dir, PathBuf::from("static_simulation"));
        assert_eq!(config.url_prefix, "/static_simulation");
        assert_eq!(config.calibration, Calibration::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            EngineConfig::from_json_str(r#"{"chart_colour": "red"}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn calibration_and_chart_size_are_configurable() {
        let json = r#"{
            "chart_width": 400,
            "chart_height": 300,
            "calibration": {"tensile_strength": 0.001}
        }"#;
        let config = EngineConfig::from_json_str(json).expect("valid configuration");
        let settings = config.chart_settings();
        assert_eq!((settings.width, settings.height), (400, 300));
        assert_eq!(config.calibration.tensile_strength, 0.001);
        assert_eq!(config.calibration.hardness, 1.0);
    }

    #[test]
    fn configured_catalog_replaces_builtin_materials() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let catalog_path = dir.path().join("woods.json");
        fs::write(
            &catalog_path,
            r#"{"Cedar": {"density": 380, "grain_angle": 5, "porosity": 0.7,
                "humidity_level": 0.12, "fiber_length": 3.5, "image": "cedar.png"}}"#,
        )
        .expect("catalog written");
        let config_path = dir.path().join("woodsim.json");
        fs::write(
            &config_path,
            serde_json::json!({ "catalog": catalog_path }).to_string(),
        )
        .expect("configuration written");

        let config = EngineConfig::from_path(&config_path).expect("configuration loads");
        let catalog = config.load_catalog().expect("catalog loads");
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["Cedar"]);
    }

    #[test]
    fn missing_configuration_file_is_an_io_error() {
        assert!(matches!(
            EngineConfig::from_path("/nonexistent/woodsim.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
