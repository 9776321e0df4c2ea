//! Request-level operations of the measurement workbench.
//!
//! The [`Workbench`] is what a request layer talks to. It accepts the same
//! JSON-shaped requests a browser front end sends, validates them completely
//! before doing any work, and answers either with a typed response or with an
//! [`EngineError`] that maps onto an `{"error": ...}` payload.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::MaterialCatalog;
use crate::chart::{batch_from_json, ChartRenderer, Metric};
use crate::config::EngineConfig;
use crate::errors::{ConfigError, EngineError, ErrorStatus};
use crate::measurement::measure;
use crate::properties::{calculate_properties, MeasuredValues};
use crate::simulation::Calibration;

/// Request for a reading from one tool on one material.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRequest {
    /// Material to measure.
    #[serde(default)]
    pub wood_type: String,
    /// Identifier of the measurement tool.
    #[serde(default)]
    pub tool_id: String,
}

/// Reading returned for a [`MeasurementRequest`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResponse {
    /// Formatted reading, such as `"500 kg/m³"` or `"45.0%"`.
    pub measurement: String,
    /// Tool that produced the reading.
    pub tool_id: String,
    /// Material that was measured.
    pub wood_type: String,
}

/// Request to derive properties from measured values.
///
/// The measured values are kept as raw JSON so that strings and other loosely
/// typed inputs reach the coercion step instead of failing deserialisation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRequest {
    /// Material whose grain angle and fibre length are used.
    #[serde(default)]
    pub wood_type: String,
    /// Measured density in kg/m³.
    #[serde(default)]
    pub density: Option<Value>,
    /// Measured porosity fraction.
    #[serde(default)]
    pub porosity: Option<Value>,
    /// Measured moisture fraction.
    #[serde(default)]
    pub moisture: Option<Value>,
}

/// Properties returned for a [`PropertyRequest`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyResponse {
    /// Always `true`; failures are reported as errors instead.
    pub success: bool,
    /// Simulated hardness.
    pub hardness: f64,
    /// Simulated moisture resistance in percent.
    pub moisture_resistance: f64,
    /// Simulated tensile strength.
    pub tensile_strength: f64,
}

/// Request to chart result sets gathered across materials.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotRequest {
    /// Hardness per material.
    #[serde(default)]
    pub hardness: Option<Map<String, Value>>,
    /// Moisture resistance per material.
    #[serde(default)]
    pub moisture_resistance: Option<Map<String, Value>>,
    /// Tensile strength per material.
    #[serde(default)]
    pub tensile_strength: Option<Map<String, Value>>,
}

impl PlotRequest {
    /// Raw result mapping supplied for `metric`.
    fn results(&self, metric: Metric) -> Option<&Map<String, Value>> {
        match metric {
            Metric::Hardness => self.hardness.as_ref(),
            Metric::MoistureResistance => self.moisture_resistance.as_ref(),
            Metric::TensileStrength => self.tensile_strength.as_ref(),
        }
    }
}

/// URLs of the charts produced for a [`PlotRequest`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotResponse {
    /// Always `true`; failures are reported as errors instead.
    pub success: bool,
    /// Chart URL for each metric that had results.
    pub plot_urls: BTreeMap<Metric, String>,
}

/// Body of a failed operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human readable reason.
    pub error: String,
}

/// One of the three workbench operations with its request.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Take a reading.
    Measure(MeasurementRequest),
    /// Derive mechanical properties.
    Calculate(PropertyRequest),
    /// Render comparison charts.
    UpdatePlot(PlotRequest),
}

/// Outcome of [`Workbench::handle`].
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    /// `None` on success, otherwise the class of the failure.
    pub failure: Option<ErrorStatus>,
    /// Response or error payload as JSON.
    pub body: Value,
}

impl Reply {
    /// Whether the operation succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Reply carrying a serialised response.
    fn success<T: Serialize>(response: &T) -> Self {
        match serde_json::to_value(response) {
            Ok(body) => Self { failure: None, body },
            Err(err) => Self::internal(&err.to_string()),
        }
    }

    /// Reply for an engine error.
    fn failure(error: &EngineError) -> Self {
        Self {
            failure: Some(error.status()),
            body: Self::payload(error.public_message()),
        }
    }

    /// Reply for a failure outside the engine's error taxonomy.
    fn internal(message: &str) -> Self {
        Self {
            failure: Some(ErrorStatus::Internal),
            body: Self::payload(message),
        }
    }

    /// `{"error": message}` as JSON.
    fn payload(message: &str) -> Value {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(message.to_string()));
        Value::Object(body)
    }
}

/// Entry point for the measurement, property and plotting operations.
///
/// The catalog is shared read-only; a workbench can be used from several
/// threads at once, with chart batches serialised by the renderer.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use woodsim::{
///     Calibration, ChartRenderer, ChartSettings, MaterialCatalog, MeasurementRequest, Workbench,
/// };
///
/// let workbench = Workbench::new(
///     Arc::new(MaterialCatalog::builtin()),
///     Calibration::default(),
///     ChartRenderer::new(ChartSettings::default()),
/// );
/// let response = workbench
///     .get_measurement(&MeasurementRequest {
///         wood_type: "Oak".to_string(),
///         tool_id: "porosity_meter".to_string(),
///     })
///     .expect("Oak and the porosity meter are known");
/// assert_eq!(response.measurement, "45.0%");
/// ```
#[derive(Debug)]
pub struct Workbench {
    /// Materials available for measurement.
    catalog: Arc<MaterialCatalog>,
    /// Scale factors of the property models.
    calibration: Calibration,
    /// Chart output.
    renderer: ChartRenderer,
}

impl Workbench {
    /// Assemble a workbench from its parts.
    #[must_use]
    pub fn new(
        catalog: Arc<MaterialCatalog>,
        calibration: Calibration,
        renderer: ChartRenderer,
    ) -> Self {
        Self {
            catalog,
            calibration,
            renderer,
        }
    }

    /// Build a workbench from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Catalog`] when a configured catalog cannot be loaded.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let catalog = config.load_catalog()?;
        Ok(Self::new(
            Arc::new(catalog),
            config.calibration,
            ChartRenderer::new(config.chart_settings()),
        ))
    }

    /// Materials served by this workbench.
    #[must_use]
    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    /// Take a reading with the requested tool.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownMaterial`] or [`EngineError::UnknownTool`].
    pub fn get_measurement(
        &self,
        request: &MeasurementRequest,
    ) -> Result<MeasurementResponse, EngineError> {
        let measurement = measure(&self.catalog, &request.wood_type, &request.tool_id)?;
        Ok(MeasurementResponse {
            measurement,
            tool_id: request.tool_id.clone(),
            wood_type: request.wood_type.clone(),
        })
    }

    /// Derive hardness, moisture resistance and tensile strength.
    ///
    /// The measured values are coerced before the material is looked up, and the
    /// three properties are returned together or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] when a measured value is not a real
    /// number and [`EngineError::UnknownMaterial`] for an unknown material.
    pub fn calculate_properties(
        &self,
        request: &PropertyRequest,
    ) -> Result<PropertyResponse, EngineError> {
        let measured = MeasuredValues::coerce(
            request.density.as_ref(),
            request.porosity.as_ref(),
            request.moisture.as_ref(),
        )?;
        let properties = calculate_properties(
            &self.catalog,
            &self.calibration,
            &request.wood_type,
            measured,
        )?;
        debug!("{}: {properties:?}", request.wood_type);
        Ok(PropertyResponse {
            success: true,
            hardness: properties.hardness,
            moisture_resistance: properties.moisture_resistance,
            tensile_strength: properties.tensile_strength,
        })
    }

    /// Render a chart for every metric with results and return their URLs.
    ///
    /// All values are validated before the first chart is drawn.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidInput`] for a value that is not a real number
    /// and [`EngineError::Render`] when a chart cannot be written.
    pub fn update_plot(&self, request: &PlotRequest) -> Result<PlotResponse, EngineError> {
        let batch = batch_from_json(
            Metric::ALL
                .into_iter()
                .filter_map(|metric| request.results(metric).map(|results| (metric, results))),
        )?;
        let artifacts = self.renderer.render(&batch)?;
        Ok(PlotResponse {
            success: true,
            plot_urls: artifacts
                .into_iter()
                .map(|(metric, artifact)| (metric, artifact.url))
                .collect(),
        })
    }

    /// Run `operation` and convert the outcome into a JSON reply.
    #[must_use]
    pub fn handle(&self, operation: &Operation) -> Reply {
        let outcome = match operation {
            Operation::Measure(request) => {
                self.get_measurement(request).map(|r| Reply::success(&r))
            }
            Operation::Calculate(request) => {
                self.calculate_properties(request).map(|r| Reply::success(&r))
            }
            Operation::UpdatePlot(request) => self.update_plot(request).map(|r| Reply::success(&r)),
        };
        outcome.unwrap_or_else(|error| {
            debug!("rejected request: {error}");
            Reply::failure(&error)
        })
    }
}
