//! Error types produced while simulating measurements and rendering charts.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::chart::Metric;

/// Error returned when a workbench operation rejects a request.
///
/// Every variant except [`EngineError::Render`] is a user-input error: the caller can
/// correct the request and submit it again.
///
/// # Examples
///
/// ```
/// use woodsim::{EngineError, MaterialCatalog};
///
/// let catalog = MaterialCatalog::builtin();
/// let error = catalog.lookup("Teak").expect_err("Teak is not catalogued");
/// assert_eq!(error, EngineError::UnknownMaterial("Teak".to_string()));
/// assert_eq!(error.public_message(), "Invalid wood type");
/// ```
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Returned when a material name is not part of the catalog.
    #[error("material `{0}` is not in the catalog")]
    UnknownMaterial(String),
    /// Returned when a measurement tool identifier is not recognised.
    #[error("measurement tool `{0}` is not recognised")]
    UnknownTool(String),
    /// Returned when a chart metric name is not recognised.
    #[error("metric `{0}` is not recognised")]
    UnknownMetric(String),
    /// Returned when a value cannot be interpreted as a real number.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidInput {
        /// Name of the offending request field.
        field: String,
        /// Why the value was rejected.
        #[source]
        reason: CoercionError,
    },
    /// Returned when a chart could not be written.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl EngineError {
    /// Classify the error for the request layer.
    #[must_use]
    pub fn status(&self) -> ErrorStatus {
        match self {
            EngineError::UnknownMaterial(_)
            | EngineError::UnknownTool(_)
            | EngineError::UnknownMetric(_)
            | EngineError::InvalidInput { .. } => ErrorStatus::BadRequest,
            EngineError::Render(_) => ErrorStatus::Internal,
        }
    }

    /// Short message suitable for the `error` field of a response payload.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            EngineError::UnknownMaterial(_) => "Invalid wood type",
            EngineError::UnknownTool(_) => "Invalid tool",
            EngineError::UnknownMetric(_) => "Invalid metric",
            EngineError::InvalidInput { .. } => "Invalid input values",
            EngineError::Render(_) => "Failed to render plot",
        }
    }
}

/// Broad classification of an [`EngineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorStatus {
    /// The request was rejected and can be corrected by the caller.
    BadRequest,
    /// The engine failed while serving a valid request.
    Internal,
}

/// Reason a loosely typed value failed numeric coercion.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CoercionError {
    /// The value was absent or `null`.
    #[error("a number is required")]
    Missing,
    /// The value was a string that does not parse as a number.
    #[error("`{0}` is not a number")]
    NotANumber(String),
    /// The value parsed but is infinite or NaN.
    #[error("{0} is not a finite number")]
    NonFinite(f64),
    /// The value has a JSON type that cannot represent a number.
    #[error("expected a number, found {0}")]
    WrongType(&'static str),
}

/// Error returned when producing a chart artifact fails.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Returned when the artifact directory cannot be created.
    #[error("failed to prepare artifact directory {path}: {source}")]
    ArtifactDirectory {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the drawing backend fails to draw or encode a chart.
    #[error("failed to draw the {metric} chart: {message}")]
    Drawing {
        /// Metric whose chart failed.
        metric: Metric,
        /// Message reported by the drawing backend.
        message: String,
    },
}

// I/O errors carry no equality; two render errors compare equal when they
// describe the same failure site.
impl PartialEq for RenderError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                RenderError::ArtifactDirectory { path: a, .. },
                RenderError::ArtifactDirectory { path: b, .. },
            ) => a == b,
            (
                RenderError::Drawing {
                    metric: a,
                    message: x,
                },
                RenderError::Drawing {
                    metric: b,
                    message: y,
                },
            ) => a == b && x == y,
            _ => false,
        }
    }
}

/// Error returned when a material catalog document is rejected.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Returned when the catalog file cannot be read.
    #[error("failed to read catalog {path}: {source}")]
    Io {
        /// Path of the catalog file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the catalog is not valid JSON or has the wrong shape.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    /// Returned when a catalog entry holds a physically meaningless value.
    #[error("material `{material}` has invalid {property} (received {value})")]
    InvalidProfile {
        /// Name of the offending material.
        material: String,
        /// Name of the rejected property.
        property: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// Returned when the document lists no materials at all.
    #[error("catalog contains no materials")]
    Empty,
}

/// Error returned when loading the engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Returned when the configuration file cannot be read.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// Returned when the configuration file is not valid JSON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// Returned when the catalog referenced by the configuration is rejected.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
