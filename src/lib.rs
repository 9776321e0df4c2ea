#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_doc_code_examples)]
#![warn(clippy::missing_docs_in_private_items)]
#![doc = include_str!("../README.md")]

mod catalog;
mod chart;
mod config;
mod errors;
mod measurement;
mod properties;
mod simulation;
mod workbench;

pub use catalog::{MaterialCatalog, MaterialProfile, MaterialRecord};
pub use chart::{
    batch_from_json, ChartArtifact, ChartRenderer, ChartSettings, Clock, IdentityToken, Metric,
    PlotBatch, ResultSet, SystemClock,
};
pub use config::EngineConfig;
pub use errors::{CatalogError, CoercionError, ConfigError, EngineError, ErrorStatus, RenderError};
pub use measurement::{measure, Tool};
pub use properties::{calculate_properties, coerce_real, MeasuredValues, MechanicalProperties};
pub use simulation::{
    simulate_hardness, simulate_moisture_resistance, simulate_tensile_strength, Calibration, K1,
    K2, K3,
};
pub use workbench::{
    ErrorPayload, MeasurementRequest, MeasurementResponse, Operation, PlotRequest, PlotResponse,
    PropertyRequest, PropertyResponse, Reply, Workbench,
};
