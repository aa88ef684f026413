//! Bunker tanks and fuel classification.
//!
//! Tanks carry a free-text fuel type. Reports and totals group tanks into one
//! of four [`FuelCategory`] values using ordered keyword rules.

use serde::{Deserialize, Serialize};

/// Default density at 15 °C for fuel-oil tanks (t/m³).
pub const FUEL_OIL_DEFAULT_DENSITY: f64 = 0.9910;

/// Default density at 15 °C for distillate tanks (t/m³).
pub const DISTILLATE_DEFAULT_DENSITY: f64 = 0.8450;

/// Reporting category of a bunker tank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FuelCategory {
    /// High-sulphur fuel oil.
    Hsfo,
    /// Very-low-sulphur fuel oil.
    Vlsfo,
    /// Marine diesel oil.
    Mdo,
    /// Low-sulphur marine gas oil.
    Lsmgo,
}

impl FuelCategory {
    /// All categories in report order.
    pub const ALL: [Self; 4] = [Self::Hsfo, Self::Vlsfo, Self::Mdo, Self::Lsmgo];

    /// Classify a free-text fuel type.
    ///
    /// Rules are tried in order and the first match wins:
    ///
    /// 1. HSFO: contains `HSFO`, or contains `HFO` but not `VLSFO`
    /// 2. VLSFO: contains `VLSFO`
    /// 3. MDO: contains `MDO`, or contains `MGO` but not `LSMGO`
    /// 4. LSMGO: contains `LSMGO`
    ///
    /// Matching ignores case. Returns `None` when no rule matches.
    #[must_use]
    pub fn classify(fuel_type: &str) -> Option<Self> {
        let t = fuel_type.to_uppercase();
        if t.contains("HSFO") || (t.contains("HFO") && !t.contains("VLSFO")) {
            Some(Self::Hsfo)
        } else if t.contains("VLSFO") {
            Some(Self::Vlsfo)
        } else if t.contains("MDO") || (t.contains("MGO") && !t.contains("LSMGO")) {
            Some(Self::Mdo)
        } else if t.contains("LSMGO") {
            Some(Self::Lsmgo)
        } else {
            None
        }
    }

    /// Fuel type tag given to tanks added manually in this category.
    #[must_use]
    pub fn default_tag(self) -> &'static str {
        match self {
            Self::Hsfo => "HFO",
            Self::Vlsfo => "VLSFO",
            Self::Mdo => "MDO",
            Self::Lsmgo => "LSMGO",
        }
    }

    /// Whether this is a residual fuel-oil grade (as opposed to a distillate).
    #[must_use]
    pub fn is_fuel_oil(self) -> bool {
        matches!(self, Self::Hsfo | Self::Vlsfo)
    }

    /// Density at 15 °C assumed for a fresh entry in this category.
    #[must_use]
    pub fn default_density(self) -> f64 {
        if self.is_fuel_oil() {
            FUEL_OIL_DEFAULT_DENSITY
        } else {
            DISTILLATE_DEFAULT_DENSITY
        }
    }

    /// The two-bucket total this category rolls up into.
    #[must_use]
    pub fn bucket(self) -> Bucket {
        if self.is_fuel_oil() {
            Bucket::Hfo
        } else {
            Bucket::Mgo
        }
    }

    /// Table heading used in quantity reports.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Hsfo => "HIGH SULPHUR FUEL OIL (HSFO)",
            Self::Vlsfo => "VERY LOW SULPHUR FUEL OIL (VLSFO)",
            Self::Mdo => "MARINE DIESEL OIL (MDO)",
            Self::Lsmgo => "LOW SULPHUR MARINE GAS OIL (LSMGO)",
        }
    }
}

impl std::fmt::Display for FuelCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hsfo => write!(f, "HSFO"),
            Self::Vlsfo => write!(f, "VLSFO"),
            Self::Mdo => write!(f, "MDO"),
            Self::Lsmgo => write!(f, "LSMGO"),
        }
    }
}

impl std::str::FromStr for FuelCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HSFO" | "HFO" => Ok(Self::Hsfo),
            "VLSFO" => Ok(Self::Vlsfo),
            "MDO" | "MGO" => Ok(Self::Mdo),
            "LSMGO" => Ok(Self::Lsmgo),
            other => Err(format!("unknown fuel category: {other}")),
        }
    }
}

/// Reporting bucket for the finalized survey totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Bucket {
    /// Fuel oils (HSFO and VLSFO).
    Hfo,
    /// Gas oils and diesel (MDO and LSMGO).
    Mgo,
}

/// A bunker tank, either from the vessel's fixed configuration or added
/// during a survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tank {
    /// Identifier, unique within a vessel.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Nominal capacity in m³.
    #[serde(default)]
    pub capacity: f64,
    /// Free-text fuel type, e.g. `"VLSFO"` or `"HFO (Settling)"`.
    pub fuel_type: String,
    /// Added during a survey rather than part of the vessel configuration.
    #[serde(default)]
    pub is_manual: bool,
}

impl Tank {
    /// Create a fixed tank.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        capacity: f64,
        fuel_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capacity,
            fuel_type: fuel_type.into(),
            is_manual: false,
        }
    }

    /// The category this tank reports under, if any.
    #[must_use]
    pub fn category(&self) -> Option<FuelCategory> {
        FuelCategory::classify(&self.fuel_type)
    }

    /// Whether correction constants for residual fuel oil apply.
    #[must_use]
    pub fn is_fuel_oil(&self) -> bool {
        self.category().is_some_and(FuelCategory::is_fuel_oil)
    }
}
