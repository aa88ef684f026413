//! Vessel configurations.

use serde::{Deserialize, Serialize};

use crate::tank::{FuelCategory, Tank};

/// A vessel and its fixed bunker tanks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    /// Store id, assigned when saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Vessel name.
    pub name: String,
    /// IMO number.
    #[serde(default)]
    pub imo: String,
    /// Radio call sign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_sign: Option<String>,
    /// Fixed tanks in calibration-table order.
    #[serde(default)]
    pub tanks: Vec<Tank>,
}

impl Vessel {
    /// Look up a tank by id.
    #[must_use]
    pub fn tank(&self, tank_id: &str) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.id == tank_id)
    }

    /// Total nominal capacity of the tanks in `category` (m³).
    #[must_use]
    pub fn capacity_of(&self, category: FuelCategory) -> f64 {
        self.tanks
            .iter()
            .filter(|t| t.category() == Some(category))
            .map(|t| t.capacity)
            .sum()
    }
}
