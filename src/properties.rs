//! Derived mechanical properties from caller-measured material values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uom::si::f64::{MassDensity, Ratio};
use uom::si::mass_density::kilogram_per_cubic_meter;
use uom::si::ratio::ratio;

use crate::catalog::MaterialCatalog;
use crate::errors::{CoercionError, EngineError};
use crate::simulation::Calibration;

/// Interpret a loosely typed request value as a finite real number.
///
/// Numbers are taken as they are, strings are trimmed and parsed, and booleans
/// count as `1` and `0`. Anything else is rejected with the name of `field`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] when the value is missing, `null`, of a
/// non-numeric type, an unparsable string, or not finite.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use woodsim::coerce_real;
///
/// assert_eq!(coerce_real("density", Some(&json!("800"))), Ok(800.0));
/// assert!(coerce_real("density", Some(&json!("abc"))).is_err());
/// assert!(coerce_real("density", None).is_err());
/// ```
pub fn coerce_real(field: &str, value: Option<&Value>) -> Result<f64, EngineError> {
    let number = match value {
        None | Some(Value::Null) => Err(CoercionError::Missing),
        Some(Value::Bool(flag)) => Ok(if *flag { 1.0 } else { 0.0 }),
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or_else(|| CoercionError::NotANumber(number.to_string())),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| CoercionError::NotANumber(text.clone())),
        Some(Value::Array(_)) => Err(CoercionError::WrongType("an array")),
        Some(Value::Object(_)) => Err(CoercionError::WrongType("an object")),
    }
    .and_then(|number| {
        if number.is_finite() {
            Ok(number)
        } else {
            Err(CoercionError::NonFinite(number))
        }
    });
    number.map_err(|reason| EngineError::InvalidInput {
        field: field.to_string(),
        reason,
    })
}

/// Measured values that replace the catalog's nominal density, porosity and
/// moisture when properties are calculated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasuredValues {
    /// Measured density.
    pub density: MassDensity,
    /// Measured porosity fraction.
    pub porosity: Ratio,
    /// Measured moisture fraction.
    pub moisture: Ratio,
}

impl MeasuredValues {
    /// Measured values from plain numbers: density in kg/m³, porosity and
    /// moisture as fractions.
    #[must_use]
    pub fn new(density: f64, porosity: f64, moisture: f64) -> Self {
        Self {
            density: MassDensity::new::<kilogram_per_cubic_meter>(density),
            porosity: Ratio::new::<ratio>(porosity),
            moisture: Ratio::new::<ratio>(moisture),
        }
    }

    /// Coerce three loosely typed request values.
    ///
    /// # Errors
    ///
    /// Returns the [`EngineError::InvalidInput`] of the first value, in the order
    /// density, porosity, moisture, that fails [`coerce_real`].
    pub fn coerce(
        density: Option<&Value>,
        porosity: Option<&Value>,
        moisture: Option<&Value>,
    ) -> Result<Self, EngineError> {
        Ok(Self::new(
            coerce_real("density", density)?,
            coerce_real("porosity", porosity)?,
            coerce_real("moisture", moisture)?,
        ))
    }
}

/// The three derived properties of one material.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MechanicalProperties {
    /// Simulated hardness.
    pub hardness: f64,
    /// Simulated moisture resistance in percent.
    pub moisture_resistance: f64,
    /// Simulated tensile strength.
    pub tensile_strength: f64,
}

/// Derive hardness, moisture resistance and tensile strength for `material`.
///
/// Grain angle and fibre length always come from the catalog; the measured
/// values stand in for the nominal density, porosity and humidity.
///
/// # Errors
///
/// Returns [`EngineError::UnknownMaterial`] when `material` is not catalogued.
///
/// # Examples
/// ```
/// use woodsim::{calculate_properties, Calibration, MaterialCatalog, MeasuredValues};
///
/// let catalog = MaterialCatalog::builtin();
/// let measured = MeasuredValues::new(800.0, 0.55, 0.20);
/// let properties = calculate_properties(&catalog, &Calibration::default(), "MDF", measured)
///     .expect("MDF is catalogued");
/// assert!((properties.moisture_resistance - 36.0).abs() < 1.0e-9);
/// assert!((properties.tensile_strength - 800.0).abs() < 1.0e-9);
/// ```
pub fn calculate_properties(
    catalog: &MaterialCatalog,
    calibration: &Calibration,
    material: &str,
    measured: MeasuredValues,
) -> Result<MechanicalProperties, EngineError> {
    let profile = catalog.lookup(material)?;
    Ok(MechanicalProperties {
        hardness: calibration.hardness(measured.density, profile.grain_angle),
        moisture_resistance: calibration.moisture_resistance(measured.porosity, measured.moisture),
        tensile_strength: calibration.tensile_strength(profile.fiber_length, measured.density),
    })
}
