//! Immutable catalog of wood materials and their nominal parameters.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uom::si::angle::degree;
use uom::si::f64::{Angle, MassDensity, Ratio};
use uom::si::mass_density::kilogram_per_cubic_meter;
use uom::si::ratio::ratio;

use crate::errors::{CatalogError, EngineError};

/// Nominal physical parameters of one material.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialProfile {
    /// Name the material is catalogued under.
    pub name: String,
    /// Bulk density.
    pub density: MassDensity,
    /// Angle between the grain and the loading direction.
    pub grain_angle: Angle,
    /// Fraction of the volume that is void.
    pub porosity: Ratio,
    /// Fractional moisture content.
    pub humidity_level: Ratio,
    /// Representative fibre length. Only ratios between materials matter, so
    /// the value carries no unit.
    pub fiber_length: f64,
    /// Reference to a display asset for the material.
    pub image_ref: String,
}

impl MaterialProfile {
    /// Density in kilograms per cubic metre.
    #[must_use]
    pub fn density_kg_per_m3(&self) -> f64 {
        self.density.get::<kilogram_per_cubic_meter>()
    }

    /// Porosity as a fraction in `[0, 1]`.
    #[must_use]
    pub fn porosity_fraction(&self) -> f64 {
        self.porosity.get::<ratio>()
    }

    /// Humidity level as a fraction in `[0, 1]`.
    #[must_use]
    pub fn humidity_fraction(&self) -> f64 {
        self.humidity_level.get::<ratio>()
    }
}

/// Serialised form of a catalog entry.
///
/// Keys match the catalog documents accepted by [`MaterialCatalog::from_json_str`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialRecord {
    /// Density in kg/m³.
    pub density: f64,
    /// Grain angle in degrees.
    pub grain_angle: f64,
    /// Porosity fraction.
    pub porosity: f64,
    /// Humidity fraction.
    pub humidity_level: f64,
    /// Fibre length.
    pub fiber_length: f64,
    /// Display asset reference.
    pub image: String,
}

impl MaterialRecord {
    /// Validate the record and convert it into a [`MaterialProfile`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidProfile`] naming the first property that is
    /// non-finite or outside its physical range.
    pub fn into_profile(self, name: &str) -> Result<MaterialProfile, CatalogError> {
        let reject = |property: &'static str, value: f64| CatalogError::InvalidProfile {
            material: name.to_string(),
            property,
            value,
        };
        if !(self.density.is_finite() && self.density > 0.0) {
            return Err(reject("density", self.density));
        }
        if !(0.0..90.0).contains(&self.grain_angle) {
            return Err(reject("grain angle", self.grain_angle));
        }
        if !(0.0..=1.0).contains(&self.porosity) {
            return Err(reject("porosity", self.porosity));
        }
        if !(0.0..=1.0).contains(&self.humidity_level) {
            return Err(reject("humidity level", self.humidity_level));
        }
        if !(self.fiber_length.is_finite() && self.fiber_length > 0.0) {
            return Err(reject("fiber length", self.fiber_length));
        }
        Ok(MaterialProfile {
            name: name.to_string(),
            density: MassDensity::new::<kilogram_per_cubic_meter>(self.density),
            grain_angle: Angle::new::<degree>(self.grain_angle),
            porosity: Ratio::new::<ratio>(self.porosity),
            humidity_level: Ratio::new::<ratio>(self.humidity_level),
            fiber_length: self.fiber_length,
            image_ref: self.image,
        })
    }
}

/// Read-only mapping from material name to [`MaterialProfile`].
///
/// A catalog is built once and then shared; it exposes no way to add, change or
/// remove entries.
///
/// # Examples
/// ```
/// use woodsim::MaterialCatalog;
///
/// let catalog = MaterialCatalog::builtin();
/// let oak = catalog.lookup("Oak").expect("Oak is catalogued");
/// assert_eq!(oak.density_kg_per_m3(), 700.0);
/// assert!(catalog.lookup("Balsa").is_err());
/// ```
#[derive(Clone, Debug)]
pub struct MaterialCatalog {
    /// Profiles in catalog order.
    profiles: Vec<MaterialProfile>,
    /// Position of each profile in `profiles`, keyed by name.
    index: HashMap<String, usize>,
}

impl MaterialCatalog {
    /// The four woods available on the workbench: Pine, Oak, Plywood and MDF.
    #[must_use]
    pub fn builtin() -> Self {
        let entry = |name: &str, density, porosity, humidity_level, fiber_length, image: &str| {
            MaterialProfile {
                name: name.to_string(),
                density: MassDensity::new::<kilogram_per_cubic_meter>(density),
                grain_angle: Angle::new::<degree>(15.0),
                porosity: Ratio::new::<ratio>(porosity),
                humidity_level: Ratio::new::<ratio>(humidity_level),
                fiber_length,
                image_ref: image.to_string(),
            }
        };
        Self::from_profiles(vec![
            entry("Pine", 500.0, 0.60, 0.15, 2.0, "pine_wood.png"),
            entry("Oak", 700.0, 0.45, 0.12, 2.5, "oak_wood.png"),
            entry("Plywood", 550.0, 0.50, 0.18, 1.5, "plywood_wood.png"),
            entry("MDF", 800.0, 0.55, 0.20, 1.0, "MDF_wood.png"),
        ])
    }

    /// Build a catalog from a JSON object mapping material names to records.
    ///
    /// Entry order in the document is kept as catalog order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] when the document is malformed,
    /// [`CatalogError::InvalidProfile`] when an entry is out of range and
    /// [`CatalogError::Empty`] when no entries are present.
    ///
    /// # Examples
    /// ```
    /// use woodsim::MaterialCatalog;
    ///
    /// let catalog = MaterialCatalog::from_json_str(
    ///     r#"{"Birch": {"density": 670, "grain_angle": 10, "porosity": 0.4,
    ///         "humidity_level": 0.1, "fiber_length": 1.2, "image": "birch.png"}}"#,
    /// )
    /// .expect("valid catalog");
    /// assert_eq!(catalog.names().collect::<Vec<_>>(), ["Birch"]);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let document: serde_json::Map<String, Value> = serde_json::from_str(json)?;
        if document.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut profiles = Vec::with_capacity(document.len());
        for (name, value) in document {
            let record: MaterialRecord = serde_json::from_value(value)?;
            profiles.push(record.into_profile(&name)?);
        }
        Ok(Self::from_profiles(profiles))
    }

    /// Read and parse a catalog document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] when the file cannot be read, otherwise the
    /// errors of [`MaterialCatalog::from_json_str`].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        debug!(
            "loaded {} materials from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Index already validated profiles. A repeated name replaces the earlier entry
    /// in place.
    fn from_profiles(entries: Vec<MaterialProfile>) -> Self {
        let mut profiles: Vec<MaterialProfile> = Vec::with_capacity(entries.len());
        let mut index = HashMap::with_capacity(entries.len());
        for profile in entries {
            if let Some(&position) = index.get(&profile.name) {
                profiles[position] = profile;
            } else {
                index.insert(profile.name.clone(), profiles.len());
                profiles.push(profile);
            }
        }
        Self { profiles, index }
    }

    /// Find the profile catalogued under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownMaterial`] when `name` is not catalogued.
    /// Names are matched exactly, including case.
    pub fn lookup(&self, name: &str) -> Result<&MaterialProfile, EngineError> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownMaterial(name.to_string()))
    }

    /// Find the profile catalogued under `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MaterialProfile> {
        self.index.get(name).map(|&position| &self.profiles[position])
    }

    /// Material names in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|profile| profile.name.as_str())
    }

    /// Profiles in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &MaterialProfile> {
        self.profiles.iter()
    }

    /// Number of catalogued materials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the catalog holds no materials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BIRCH_AND_ASH: &str = r#"{
        "Birch": {"density": 670, "grain_angle": 10, "porosity": 0.4,
                  "humidity_level": 0.1, "fiber_length": 1.2, "image": "birch.png"},
        "Ash":   {"density": 680, "grain_angle": 12, "porosity": 0.35,
                  "humidity_level": 0.11, "fiber_length": 1.4, "image": "ash.png"}
    }"#;

    #[test]
    fn builtin_catalog_matches_workbench_materials() {
        let catalog = MaterialCatalog::builtin();
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            ["Pine", "Oak", "Plywood", "MDF"]
        );
        let mdf = catalog.lookup("MDF").expect("MDF is catalogued");
        assert_eq!(mdf.density_kg_per_m3(), 800.0);
        assert_eq!(mdf.porosity_fraction(), 0.55);
        assert_eq!(mdf.humidity_fraction(), 0.20);
        assert_eq!(mdf.fiber_length, 1.0);
        assert_eq!(mdf.image_ref, "MDF_wood.png");
    }

    #[test]
    fn every_builtin_grain_angle_is_fifteen_degrees() {
        for profile in MaterialCatalog::builtin().iter() {
            assert!((profile.grain_angle.get::<degree>() - 15.0).abs() < 1.0e-9);
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let catalog = MaterialCatalog::builtin();
        assert_eq!(
            catalog.lookup("pine"),
            Err(EngineError::UnknownMaterial("pine".to_string()))
        );
        assert!(catalog.get("Pine").is_some());
    }

    #[test]
    fn json_catalog_keeps_document_order() {
        let catalog = MaterialCatalog::from_json_str(BIRCH_AND_ASH).expect("valid catalog");
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["Birch", "Ash"]);
        let ash = catalog.lookup("Ash").expect("Ash is catalogued");
        assert_eq!(ash.image_ref, "ash.png");
    }

    #[test]
    fn json_catalog_rejects_out_of_range_porosity() {
        let json = r#"{"Cork": {"density": 240, "grain_angle": 0, "porosity": 1.2,
            "humidity_level": 0.1, "fiber_length": 0.5, "image": "cork.png"}}"#;
        match MaterialCatalog::from_json_str(json) {
            Err(CatalogError::InvalidProfile {
                material, property, ..
            }) => {
                assert_eq!(material, "Cork");
                assert_eq!(property, "porosity");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn grain_angle_must_stay_below_ninety_degrees() {
        let record = |grain_angle: f64| MaterialRecord {
            density: 600.0,
            grain_angle,
            porosity: 0.4,
            humidity_level: 0.1,
            fiber_length: 2.0,
            image: "beech.png".to_string(),
        };
        for angle in [90.0, 120.0, -1.0, f64::NAN] {
            match record(angle).into_profile("Beech") {
                Err(CatalogError::InvalidProfile { property, .. }) => {
                    assert_eq!(property, "grain angle");
                }
                other => panic!("angle {angle} accepted: {other:?}"),
            }
        }
        let steep = record(89.9).into_profile("Beech").expect("below ninety degrees");
        assert!((steep.grain_angle.get::<degree>() - 89.9).abs() < 1.0e-9);
        assert!(record(0.0).into_profile("Beech").is_ok());
    }

    #[test]
    fn json_catalog_rejects_missing_fields_and_empty_documents() {
        let json = r#"{"Cork": {"density": 240}}"#;
        assert!(matches!(
            MaterialCatalog::from_json_str(json),
            Err(CatalogError::Parse(_))
        ));
        assert!(matches!(
            MaterialCatalog::from_json_str("{}"),
            Err(CatalogError::Empty)
        ));
    }

    #[test]
    fn catalog_loads_from_disk() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let path = dir.path().join("woods.json");
        fs::write(&path, BIRCH_AND_ASH).expect("catalog written");
        let catalog = MaterialCatalog::from_path(&path).expect("catalog loads");
        assert!(catalog.get("Birch").is_some());

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            MaterialCatalog::from_path(missing),
            Err(CatalogError::Io { .. })
        ));
    }
}
