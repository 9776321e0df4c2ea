//! Virtual measurement tools and the readings they report.

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::{MaterialCatalog, MaterialProfile};
use crate::errors::EngineError;

/// Measurement tools available on the workbench.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// Reports bulk density in kg/m³.
    DensityMeter,
    /// Reports porosity as a percentage.
    PorosityMeter,
    /// Reports moisture content as a percentage.
    MoistureMeter,
}

impl Tool {
    /// Every tool, in workbench order.
    pub const ALL: [Tool; 3] = [Tool::DensityMeter, Tool::PorosityMeter, Tool::MoistureMeter];

    /// Identifier used by requests.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Tool::DensityMeter => "density_meter",
            Tool::PorosityMeter => "porosity_meter",
            Tool::MoistureMeter => "moisture_meter",
        }
    }

    /// Reading this tool reports for `profile`.
    ///
    /// Readings come straight from the nominal catalog values; none of the
    /// property models are involved.
    ///
    /// # Examples
    /// ```
    /// use woodsim::{MaterialCatalog, Tool};
    ///
    /// let catalog = MaterialCatalog::builtin();
    /// let pine = catalog.lookup("Pine").expect("Pine is catalogued");
    /// assert_eq!(Tool::DensityMeter.read(pine), "500 kg/m³");
    /// assert_eq!(Tool::PorosityMeter.read(pine), "60.0%");
    /// ```
    #[must_use]
    pub fn read(self, profile: &MaterialProfile) -> String {
        match self {
            Tool::DensityMeter => format!("{} kg/m³", profile.density_kg_per_m3()),
            Tool::PorosityMeter => format_percent(profile.porosity_fraction()),
            Tool::MoistureMeter => format_percent(profile.humidity_fraction()),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Tool {
    type Err = EngineError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.id() == id)
            .ok_or_else(|| EngineError::UnknownTool(id.to_string()))
    }
}

/// Render a fraction as a percentage that always shows a decimal part.
fn format_percent(fraction: f64) -> String {
    let percent = fraction * 100.0;
    if percent.fract() == 0.0 {
        format!("{percent:.1}%")
    } else {
        format!("{percent}%")
    }
}

/// Take a reading of `material` with the tool identified by `tool_id`.
///
/// The material is resolved before the tool, so a request naming neither a
/// known material nor a known tool reports the material.
///
/// # Errors
///
/// Returns [`EngineError::UnknownMaterial`] for a material that is not
/// catalogued and [`EngineError::UnknownTool`] for an unrecognised tool.
pub fn measure(
    catalog: &MaterialCatalog,
    material: &str,
    tool_id: &str,
) -> Result<String, EngineError> {
    let profile = catalog.lookup(material)?;
    let tool: Tool = tool_id.parse()?;
    let reading = tool.read(profile);
    debug!("{tool} on {material}: {reading}");
    Ok(reading)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_ids_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(tool.id().parse::<Tool>(), Ok(tool));
        }
        assert_eq!(
            "caliper".parse::<Tool>(),
            Err(EngineError::UnknownTool("caliper".to_string()))
        );
    }

    #[test]
    fn readings_for_builtin_materials() {
        let catalog = MaterialCatalog::builtin();
        assert_eq!(measure(&catalog, "Pine", "density_meter").as_deref(), Ok("500 kg/m³"));
        assert_eq!(measure(&catalog, "Oak", "porosity_meter").as_deref(), Ok("45.0%"));
        assert_eq!(measure(&catalog, "Oak", "moisture_meter").as_deref(), Ok("12.0%"));
        assert_eq!(measure(&catalog, "MDF", "moisture_meter").as_deref(), Ok("20.0%"));
        assert_eq!(measure(&catalog, "Plywood", "density_meter").as_deref(), Ok("550 kg/m³"));
    }

    #[test]
    fn unknown_material_is_reported_before_unknown_tool() {
        let catalog = MaterialCatalog::builtin();
        assert_eq!(
            measure(&catalog, "Teak", "caliper"),
            Err(EngineError::UnknownMaterial("Teak".to_string()))
        );
        assert_eq!(
            measure(&catalog, "Oak", "caliper"),
            Err(EngineError::UnknownTool("caliper".to_string()))
        );
    }

    #[test]
    fn percent_keeps_fractional_digits() {
        assert_eq!(format_percent(0.5), "50.0%");
        assert_eq!(format_percent(0.125), "12.5%");
    }
}
