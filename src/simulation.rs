//! Closed-form models that turn material parameters into mechanical properties.
//!
//! Each model is a single product of the inputs scaled by a calibration
//! constant. The constants default to `1.0` and can be overridden through
//! [`Calibration`] when a deployment needs to rescale the results.

use serde::{Deserialize, Serialize};
use uom::si::angle::degree;
use uom::si::f64::{Angle, MassDensity, Ratio};
use uom::si::mass_density::kilogram_per_cubic_meter;
use uom::si::ratio::ratio;

/// Default scale factor of the hardness model.
pub const K1: f64 = 1.0;
/// Default scale factor of the moisture resistance model.
pub const K2: f64 = 1.0;
/// Default scale factor of the tensile strength model.
pub const K3: f64 = 1.0;

/// Scale factors applied by the three property models.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    /// Multiplier of the hardness model.
    pub hardness: f64,
    /// Multiplier of the moisture resistance model.
    pub moisture_resistance: f64,
    /// Multiplier of the tensile strength model.
    pub tensile_strength: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            hardness: K1,
            moisture_resistance: K2,
            tensile_strength: K3,
        }
    }
}

impl Calibration {
    /// Hardness from density and grain angle.
    ///
    /// The angle is resolved in radians before the cosine is taken, so a catalog
    /// can keep the more readable degree values.
    ///
    /// # Examples
    /// ```
    /// use uom::si::angle::degree;
    /// use uom::si::f64::{Angle, MassDensity};
    /// use uom::si::mass_density::kilogram_per_cubic_meter;
    /// use woodsim::Calibration;
    ///
    /// let density = MassDensity::new::<kilogram_per_cubic_meter>(700.0);
    /// let hardness = Calibration::default().hardness(density, Angle::new::<degree>(0.0));
    /// assert_eq!(hardness, 700.0);
    /// ```
    #[must_use]
    pub fn hardness(&self, density: MassDensity, grain_angle: Angle) -> f64 {
        self.hardness * density.get::<kilogram_per_cubic_meter>() * grain_angle.cos().get::<ratio>()
    }

    /// Moisture resistance in percent from porosity and humidity.
    ///
    /// Inputs outside `[0, 1]` are not clamped and yield values outside
    /// `[0, 100]`.
    #[must_use]
    pub fn moisture_resistance(&self, porosity: Ratio, humidity: Ratio) -> f64 {
        self.moisture_resistance
            * (1.0 - porosity.get::<ratio>())
            * (1.0 - humidity.get::<ratio>())
            * 100.0
    }

    /// Tensile strength from fibre length and density.
    #[must_use]
    pub fn tensile_strength(&self, fiber_length: f64, density: MassDensity) -> f64 {
        self.tensile_strength * fiber_length * density.get::<kilogram_per_cubic_meter>()
    }
}

/// Hardness for a density in kg/m³ and a grain angle in degrees, using [`K1`].
///
/// # Examples
/// ```
/// use woodsim::simulate_hardness;
///
/// let hardness = simulate_hardness(500.0, 15.0);
/// assert!((hardness - 500.0 * 15.0_f64.to_radians().cos()).abs() < 1.0e-9);
/// ```
#[must_use]
pub fn simulate_hardness(density: f64, grain_angle_degrees: f64) -> f64 {
    Calibration::default().hardness(
        MassDensity::new::<kilogram_per_cubic_meter>(density),
        Angle::new::<degree>(grain_angle_degrees),
    )
}

/// Moisture resistance in percent for fractional porosity and humidity, using [`K2`].
#[must_use]
pub fn simulate_moisture_resistance(porosity: f64, humidity_level: f64) -> f64 {
    Calibration::default().moisture_resistance(
        Ratio::new::<ratio>(porosity),
        Ratio::new::<ratio>(humidity_level),
    )
}

/// Tensile strength for a fibre length and a density in kg/m³, using [`K3`].
#[must_use]
pub fn simulate_tensile_strength(fiber_length: f64, density: f64) -> f64 {
    Calibration::default()
        .tensile_strength(fiber_length, MassDensity::new::<kilogram_per_cubic_meter>(density))
}
