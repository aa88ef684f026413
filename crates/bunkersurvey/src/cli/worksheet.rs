//! Survey worksheets.
//!
//! A worksheet is the JSON file the CLI reads in place of the web form: the
//! vessel with its fixed tanks, the typed readings per tank, any manual tanks
//! added on board and optional total overrides.
//!
//! ```json
//! {
//!   "vessel": { "name": "MV Nike", "imo": "9876543", "tanks": [...] },
//!   "type": "OFFHIRE SURVEY",
//!   "date": "2025-09-28",
//!   "details": { "charterer": "Pacific Basin", "location": "Casablanca" },
//!   "readings": [ { "tankId": "1P", "observedVolume": "1000", "temperature": 30 } ],
//!   "manualTanks": [ { "category": "LSMGO", "name": "Drums", "observedVolume": 2 } ],
//!   "overrides": { "hfo": "", "mgo": "65.79" }
//! }
//! ```
//!
//! Measurements may be numbers or text; text goes through the same parser as
//! typed input, so a bad value fails with the tank and field named.

use std::path::Path;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calculator::{CalculatorSettings, FinalizedQuantities, FuelCalculator, Measurement};
use crate::config::SurveyConfig;
use crate::error::{Error, Result};
use crate::survey::{Survey, SurveyDetails, SurveyKind};
use crate::tank::FuelCategory;
use crate::vessel::Vessel;

/// A measurement as written in the worksheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// A JSON number.
    Number(f64),
    /// Text as typed by the surveyor.
    Text(String),
}

impl FieldValue {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Readings for one tank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankReadings {
    /// Sounding or ullage (m).
    pub sounding: Option<FieldValue>,
    /// Observed temperature (°C).
    pub temperature: Option<FieldValue>,
    /// Density at 15 °C (t/m³).
    pub density_at_15: Option<FieldValue>,
    /// Observed volume (m³).
    pub observed_volume: Option<FieldValue>,
}

impl TankReadings {
    fn fields(&self) -> impl Iterator<Item = (Measurement, &FieldValue)> {
        [
            (Measurement::Sounding, self.sounding.as_ref()),
            (Measurement::Temperature, self.temperature.as_ref()),
            (Measurement::DensityAt15, self.density_at_15.as_ref()),
            (Measurement::ObservedVolume, self.observed_volume.as_ref()),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }

    fn apply(&self, session: &mut FuelCalculator, tank_id: &str) -> Result<()> {
        for (field, value) in self.fields() {
            session.set_entry_field(tank_id, field, &value.as_text())?;
        }
        Ok(())
    }
}

/// Readings of a fixed tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedReading {
    /// Vessel tank id.
    pub tank_id: String,
    /// The measurements.
    #[serde(flatten)]
    pub readings: TankReadings,
}

/// A tank added on board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualTankSheet {
    /// Category the tank is added to.
    pub category: FuelCategory,
    /// Display name, "New Tank" when omitted.
    pub name: Option<String>,
    /// The measurements.
    #[serde(flatten)]
    pub readings: TankReadings,
}

/// Total overrides, as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
    /// Fuel oil total override.
    pub hfo: Option<String>,
    /// Gas oil total override.
    pub mgo: Option<String>,
}

/// A complete survey worksheet.
///
/// The survey type is read from the top-level `type` key; a `type` inside
/// `details` is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worksheet {
    /// Vessel and fixed tanks.
    pub vessel: Vessel,
    /// On-hire or off-hire; the configured default when omitted.
    #[serde(rename = "type", default)]
    pub kind: Option<SurveyKind>,
    /// Survey date; today when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Descriptive survey fields.
    #[serde(default)]
    pub details: SurveyDetails,
    /// Readings of fixed tanks.
    #[serde(default)]
    pub readings: Vec<FixedReading>,
    /// Tanks added on board.
    #[serde(default)]
    pub manual_tanks: Vec<ManualTankSheet>,
    /// Total overrides.
    #[serde(default)]
    pub overrides: Overrides,
}

impl Worksheet {
    /// Read a worksheet file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid worksheet.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let sheet: Self = serde_json::from_str(&text)?;
        debug!(
            "Loaded worksheet {} for {}",
            path.display(),
            sheet.vessel.name
        );
        Ok(sheet)
    }

    /// Run a calculator session over the worksheet.
    ///
    /// Every tank is computed before the session is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTank`] for readings of a tank the vessel does
    /// not have and [`Error::InvalidMeasurement`] for unusable values.
    pub fn session(&self, settings: CalculatorSettings) -> Result<FuelCalculator> {
        let mut session = FuelCalculator::with_settings(self.vessel.tanks.clone(), settings);

        for reading in &self.readings {
            if session.tank(&reading.tank_id).is_none() {
                return Err(Error::unknown_tank(reading.tank_id.clone()));
            }
            reading.readings.apply(&mut session, &reading.tank_id)?;
        }

        for manual in &self.manual_tanks {
            let tank = session.add_manual_tank(manual.category);
            if let Some(name) = &manual.name {
                session.rename_manual_tank(&tank.id, name.clone());
            }
            manual.readings.apply(&mut session, &tank.id)?;
        }

        session.compute_all();
        Ok(session)
    }

    /// Finalize `session` with the worksheet overrides.
    #[must_use]
    pub fn finalize(&self, session: &FuelCalculator) -> FinalizedQuantities {
        session.finalize(
            self.overrides.hfo.as_deref(),
            self.overrides.mgo.as_deref(),
        )
    }

    /// Build the completed survey.
    ///
    /// Vessel identity fills empty detail fields; `defaults` supply the type
    /// and place of survey when the worksheet leaves them out.
    #[must_use]
    pub fn to_survey(&self, finalized: FinalizedQuantities, defaults: &SurveyConfig) -> Survey {
        let mut details = self.details.clone();
        details.kind = self.kind.unwrap_or(defaults.default_kind);
        if details.vessel_name.is_empty() {
            details.vessel_name.clone_from(&self.vessel.name);
        }
        if details.vessel_imo.is_empty() {
            details.vessel_imo.clone_from(&self.vessel.imo);
        }
        if details.vessel_call_sign.is_none() {
            details.vessel_call_sign.clone_from(&self.vessel.call_sign);
        }
        if details.location.is_none() {
            details.location.clone_from(&defaults.default_location);
        }

        let date = self.date.unwrap_or_else(|| Local::now().date_naive());
        info!(
            "Survey of {} on {}: HFO {:.2} t, MGO {:.2} t",
            details.vessel_name, date, finalized.total_hfo, finalized.total_mgo
        );
        Survey::from_finalized(details, finalized, date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::Removal;

    const SHEET: &str = r#"{
        "vessel": {
            "name": "MV Nike",
            "imo": "9876543",
            "callSign": "V7AB2",
            "tanks": [
                {"id": "1P", "name": "No.1 P", "capacity": 800, "fuelType": "VLSFO"},
                {"id": "DO", "name": "DO Stor", "capacity": 90, "fuelType": "LSMGO"}
            ]
        },
        "date": "2025-09-28",
        "details": {"charterer": "Pacific Basin"},
        "readings": [
            {"tankId": "1P", "observedVolume": "1000", "temperature": 30},
            {"tankId": "DO", "observedVolume": 200, "temperature": "25", "densityAt15": "0,845"}
        ],
        "manualTanks": [
            {"category": "LSMGO", "name": "Drums", "observedVolume": 100, "temperature": 30, "densityAt15": 0.9}
        ]
    }"#;

    fn sheet() -> Worksheet {
        serde_json::from_str(SHEET).unwrap()
    }

    #[test]
    fn test_session_computes_all_tanks() {
        let sheet = sheet();
        let session = sheet.session(CalculatorSettings::default()).unwrap();

        assert_eq!(session.tanks().len(), 3);
        assert!(session.entries().all(|e| e.quantities().is_some()));
        let wia = session.entry("1P").unwrap().weight_in_air.unwrap();
        assert!((wia - 984.273_06).abs() < 1e-4);

        let manual = session.manual_tanks().next().unwrap();
        assert_eq!(manual.name, "Drums");
        assert_eq!(manual.fuel_type, "LSMGO");
    }

    #[test]
    fn test_finalize_and_survey() {
        let sheet = sheet();
        let session = sheet.session(CalculatorSettings::default()).unwrap();
        let finalized = sheet.finalize(&session);

        // 167.36342 (DO) + 88.84684 (drums)
        assert!((finalized.total_mgo - 256.21).abs() < 1e-9);
        assert!((finalized.total_hfo - 984.27).abs() < 1e-9);

        let defaults = SurveyConfig {
            default_kind: SurveyKind::OffHire,
            default_location: Some("Casablanca".to_string()),
        };
        let survey = sheet.to_survey(finalized, &defaults);
        assert_eq!(survey.details.vessel_name, "MV Nike");
        assert_eq!(survey.details.vessel_call_sign.as_deref(), Some("V7AB2"));
        assert_eq!(survey.details.kind, SurveyKind::OffHire);
        assert_eq!(survey.details.location.as_deref(), Some("Casablanca"));
        assert_eq!(survey.details.charterer.as_deref(), Some("Pacific Basin"));
        assert_eq!(survey.date, NaiveDate::from_ymd_opt(2025, 9, 28).unwrap());
        assert_eq!(survey.soundings.len(), 3);
    }

    #[test]
    fn test_explicit_kind_wins() {
        let mut sheet = sheet();
        sheet.kind = Some(SurveyKind::OnHire);
        let session = sheet.session(CalculatorSettings::default()).unwrap();
        let defaults = SurveyConfig {
            default_kind: SurveyKind::OffHire,
            default_location: None,
        };
        let survey = sheet.to_survey(sheet.finalize(&session), &defaults);
        assert_eq!(survey.details.kind, SurveyKind::OnHire);
        assert!(survey.details.location.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut sheet = sheet();
        sheet.overrides = Overrides {
            hfo: Some("  ".to_string()),
            mgo: Some("65.79".to_string()),
        };
        let session = sheet.session(CalculatorSettings::default()).unwrap();
        let finalized = sheet.finalize(&session);
        assert!((finalized.total_hfo - 984.27).abs() < 1e-9);
        assert!((finalized.total_mgo - 65.79).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_tank_rejected() {
        let mut sheet = sheet();
        sheet.readings.push(FixedReading {
            tank_id: "9C".to_string(),
            readings: TankReadings::default(),
        });
        let err = sheet.session(CalculatorSettings::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownTank { .. }));
    }

    #[test]
    fn test_bad_value_names_field() {
        let mut sheet = sheet();
        sheet.readings[0].readings.temperature = Some(FieldValue::Text("warm".to_string()));
        let err = sheet.session(CalculatorSettings::default()).unwrap_err();
        assert!(err.is_invalid_measurement());
        assert!(err.to_string().contains("temperature"));
        assert!(err.to_string().contains("1P"));
    }

    #[test]
    fn test_manual_tanks_removable_after_load() {
        let sheet = sheet();
        let mut session = sheet.session(CalculatorSettings::default()).unwrap();
        let id = session.manual_tanks().next().unwrap().id.clone();
        assert_eq!(session.remove_manual_tank(&id), Removal::Removed);
        assert_eq!(session.remove_manual_tank("1P"), Removal::FixedTank);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        std::fs::write(&path, SHEET).unwrap();
        let sheet = Worksheet::load(&path).unwrap();
        assert_eq!(sheet.readings.len(), 2);

        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(Worksheet::load(&path).unwrap_err(), Error::Json(_)));
        assert!(matches!(
            Worksheet::load(&dir.path().join("missing.json")).unwrap_err(),
            Error::Io(_)
        ));
    }
}
