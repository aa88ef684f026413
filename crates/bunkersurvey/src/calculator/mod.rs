//! Fuel quantity calculator.
//!
//! This module turns tank soundings into standard volumes and masses:
//!
//! - **Correction**: the Table 54B volume correction and weight conversions
//!   ([`correction`]).
//!
//! - **Entries**: one [`SoundingEntry`] per tank holding the surveyor's
//!   readings and the last computed quantities.
//!
//! - **Session**: a [`FuelCalculator`] owned by the caller, holding the
//!   working tank list for one survey and producing the finalized totals.
//!
//! # Example
//!
//! ```
//! use bunkersurvey::calculator::{FuelCalculator, Measurement};
//! use bunkersurvey::tank::{FuelCategory, Tank};
//!
//! let mut session = FuelCalculator::new(vec![Tank::new("1P", "No.1 Port", 800.0, "VLSFO")]);
//! session.set_entry_field("1P", Measurement::ObservedVolume, "1000").unwrap();
//! session.set_entry_field("1P", Measurement::Temperature, "30").unwrap();
//! session.compute_tank("1P").unwrap();
//!
//! let vlsfo = session.aggregate_category(FuelCategory::Vlsfo);
//! assert!((vlsfo - 984.273).abs() < 0.001);
//!
//! let finalized = session.finalize(None, None);
//! assert!((finalized.total_hfo - 984.27).abs() < 1e-9);
//! ```

pub mod correction;
mod session;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tank::{Tank, DISTILLATE_DEFAULT_DENSITY, FUEL_OIL_DEFAULT_DENSITY};

pub use correction::{Quantities, Reading};
pub use session::{CategoryTotals, FinalizedQuantities, FuelCalculator, Removal};

/// Tunable inputs of the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorSettings {
    /// Temperature given to fresh entries (°C).
    pub default_temperature: f64,
    /// Density at 15 °C given to fresh fuel-oil entries (t/m³).
    pub fuel_oil_density: f64,
    /// Density at 15 °C given to fresh distillate entries (t/m³).
    pub distillate_density: f64,
    /// Density used when an entry's density is zero (t/m³).
    pub density_fallback: f64,
    /// Air density for the buoyancy correction (t/m³).
    pub air_density: f64,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            default_temperature: correction::REFERENCE_TEMPERATURE,
            fuel_oil_density: FUEL_OIL_DEFAULT_DENSITY,
            distillate_density: DISTILLATE_DEFAULT_DENSITY,
            density_fallback: correction::DENSITY_FALLBACK,
            air_density: correction::AIR_DENSITY,
        }
    }
}

impl CalculatorSettings {
    /// Density given to a fresh entry on `tank`.
    #[must_use]
    pub fn default_density_for(&self, tank: &Tank) -> f64 {
        if tank.is_fuel_oil() {
            self.fuel_oil_density
        } else {
            self.distillate_density
        }
    }

    /// A fresh entry for `tank`.
    #[must_use]
    pub fn default_entry(&self, tank: &Tank) -> SoundingEntry {
        SoundingEntry {
            tank_id: tank.id.clone(),
            tank_name: Some(tank.name.clone()),
            fuel_type: Some(tank.fuel_type.clone()),
            sounding: 0.0,
            temperature: self.default_temperature,
            density_at_15: self.default_density_for(tank),
            observed_volume: 0.0,
            vcf: None,
            gsv: None,
            weight_in_vacuum: None,
            weight_in_air: None,
        }
    }
}

/// Editable measurement fields of a [`SoundingEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measurement {
    /// Sounding or ullage depth (m).
    Sounding,
    /// Observed temperature (°C).
    Temperature,
    /// Density at 15 °C (t/m³).
    DensityAt15,
    /// Observed volume (m³).
    ObservedVolume,
}

impl Measurement {
    /// All editable fields.
    pub const ALL: [Self; 4] = [
        Self::Sounding,
        Self::Temperature,
        Self::DensityAt15,
        Self::ObservedVolume,
    ];

    /// Field name as stored in survey documents.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sounding => "sounding",
            Self::Temperature => "temperature",
            Self::DensityAt15 => "densityAt15",
            Self::ObservedVolume => "observedVolume",
        }
    }
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Measurement {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sounding" => Ok(Self::Sounding),
            "temperature" => Ok(Self::Temperature),
            "densityAt15" | "density_at_15" | "density" => Ok(Self::DensityAt15),
            "observedVolume" | "observed_volume" | "volume" => Ok(Self::ObservedVolume),
            other => Err(format!("unknown measurement field: {other}")),
        }
    }
}

/// Readings and computed quantities for one tank.
///
/// The computed fields are `None` until the tank is computed and go stale
/// when a reading changes; they are only refreshed by an explicit compute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundingEntry {
    /// Tank this entry belongs to.
    pub tank_id: String,
    /// Tank name at the time the entry was finalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tank_name: Option<String>,
    /// Tank fuel type at the time the entry was finalized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    /// Sounding or ullage depth (m).
    #[serde(default)]
    pub sounding: f64,
    /// Observed temperature (°C).
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Density at 15 °C (t/m³).
    #[serde(default)]
    pub density_at_15: f64,
    /// Observed volume (m³).
    #[serde(default)]
    pub observed_volume: f64,
    /// Volume correction factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcf: Option<f64>,
    /// Gross standard volume (m³).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gsv: Option<f64>,
    /// Weight in vacuum (t).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_in_vacuum: Option<f64>,
    /// Weight in air (t).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_in_air: Option<f64>,
}

fn default_temperature() -> f64 {
    correction::REFERENCE_TEMPERATURE
}

impl SoundingEntry {
    /// Current value of a measurement field.
    #[must_use]
    pub fn get(&self, field: Measurement) -> f64 {
        match field {
            Measurement::Sounding => self.sounding,
            Measurement::Temperature => self.temperature,
            Measurement::DensityAt15 => self.density_at_15,
            Measurement::ObservedVolume => self.observed_volume,
        }
    }

    /// Set a measurement field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMeasurement`] if `value` is NaN or infinite;
    /// the field keeps its previous value.
    pub fn set(&mut self, field: Measurement, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::invalid_measurement(
                self.tank_id.clone(),
                field.name(),
                value.to_string(),
            ));
        }
        match field {
            Measurement::Sounding => self.sounding = value,
            Measurement::Temperature => self.temperature = value,
            Measurement::DensityAt15 => self.density_at_15 = value,
            Measurement::ObservedVolume => self.observed_volume = value,
        }
        Ok(())
    }

    /// The inputs of the volume correction.
    #[must_use]
    pub fn reading(&self) -> Reading {
        Reading {
            observed_volume: self.observed_volume,
            temperature: self.temperature,
            density_at_15: self.density_at_15,
        }
    }

    /// Last computed quantities, if the entry has been computed.
    #[must_use]
    pub fn quantities(&self) -> Option<Quantities> {
        Some(Quantities {
            vcf: self.vcf?,
            gsv: self.gsv?,
            weight_in_vacuum: self.weight_in_vacuum?,
            weight_in_air: self.weight_in_air?,
        })
    }

    /// Cache computed quantities on the entry.
    pub fn store(&mut self, quantities: Quantities) {
        self.vcf = Some(quantities.vcf);
        self.gsv = Some(quantities.gsv);
        self.weight_in_vacuum = Some(quantities.weight_in_vacuum);
        self.weight_in_air = Some(quantities.weight_in_air);
    }

    /// Weight in air, or zero when never computed.
    #[must_use]
    pub fn weight_in_air_or_zero(&self) -> f64 {
        self.weight_in_air.unwrap_or(0.0)
    }
}

/// Parse a typed measurement.
///
/// Accepts surrounding whitespace and a comma as the decimal separator.
/// Returns `None` for empty, non-numeric or non-finite input.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
