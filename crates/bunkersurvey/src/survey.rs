//! Bunker survey records.
//!
//! A [`Survey`] is the persisted result of a survey session: who, where and
//! when, the frozen sounding entries and the two reported totals. Documents
//! use camelCase keys so they stay readable by the web client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calculator::{FinalizedQuantities, SoundingEntry};

/// Whether the survey opens or closes a charter period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurveyKind {
    /// Delivery of the vessel to the charterer.
    #[default]
    #[serde(rename = "ONHIRE SURVEY")]
    OnHire,
    /// Redelivery of the vessel to the owner.
    #[serde(rename = "OFFHIRE SURVEY")]
    OffHire,
}

impl std::fmt::Display for SurveyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OnHire => write!(f, "ONHIRE SURVEY"),
            Self::OffHire => write!(f, "OFFHIRE SURVEY"),
        }
    }
}

/// Lifecycle state of a survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SurveyStatus {
    /// Still being edited.
    #[default]
    Draft,
    /// Finalized and saved.
    Completed,
}

/// One line of the deck/engine log book extract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogBookEntry {
    /// Pilot station or event name.
    pub pilot_station: Option<String>,
    /// Event date as typed.
    pub date: Option<String>,
    /// Event time as typed.
    pub time: Option<String>,
    /// VLSFO remaining on board (t).
    pub vlsfo: Option<f64>,
    /// HSFO remaining on board (t).
    pub hsfo: Option<f64>,
    /// MDO remaining on board (t).
    pub mdo: Option<f64>,
    /// LSMGO remaining on board (t).
    pub lsmgo: Option<f64>,
}

/// Descriptive fields of a survey, filled in by the surveyor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveyDetails {
    /// Vessel name.
    pub vessel_name: String,
    /// IMO number.
    pub vessel_imo: String,
    /// Radio call sign.
    pub vessel_call_sign: Option<String>,
    /// On-hire or off-hire.
    #[serde(rename = "type")]
    pub kind: SurveyKind,
    /// Client who ordered the survey.
    pub client: Option<String>,
    /// Vessel owner.
    pub owner: Option<String>,
    /// Charterer.
    pub charterer: Option<String>,
    /// Master's name.
    pub master_name: Option<String>,
    /// Chief engineer's name.
    pub chief_engineer_name: Option<String>,
    /// Place of survey.
    pub location: Option<String>,
    /// Place of delivery or redelivery.
    pub place_of_delivery: Option<String>,
    /// Survey start time.
    pub from_time: Option<String>,
    /// Survey end time.
    pub to_time: Option<String>,
    /// Forward draft (m).
    pub draft_fwd: Option<f64>,
    /// Aft draft (m).
    pub draft_aft: Option<f64>,
    /// Voyage number.
    pub voy: Option<String>,
    /// List (degrees).
    pub list: Option<f64>,
    /// Engine-room temperature (°C).
    pub er: Option<f64>,
    /// Thermometer identification.
    pub thermometer: Option<String>,
    /// Log book extract.
    pub log_book_entries: Vec<LogBookEntry>,
}

/// A saved bunker survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    /// Store id, assigned when saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Descriptive fields.
    #[serde(flatten)]
    pub details: SurveyDetails,
    /// Survey date.
    pub date: NaiveDate,
    /// Lifecycle state.
    #[serde(default)]
    pub status: SurveyStatus,
    /// Frozen sounding entries.
    #[serde(default)]
    pub soundings: Vec<SoundingEntry>,
    /// Reported fuel oil total (t).
    #[serde(rename = "totalHFO", default)]
    pub total_hfo: f64,
    /// Reported gas oil total (t).
    #[serde(rename = "totalMGO", default)]
    pub total_mgo: f64,
}

impl Survey {
    /// Freeze a finalized session into a completed survey.
    #[must_use]
    pub fn from_finalized(
        details: SurveyDetails,
        finalized: FinalizedQuantities,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            details,
            date,
            status: SurveyStatus::Completed,
            soundings: finalized.entries,
            total_hfo: finalized.total_hfo,
            total_mgo: finalized.total_mgo,
        }
    }

    /// Whether the survey has been finalized.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == SurveyStatus::Completed
    }

    /// File name used for the exported certificate.
    #[must_use]
    pub fn export_name(&self) -> String {
        let vessel: String = self
            .details
            .vessel_name
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect();
        format!("Survey_{}_{}", vessel, self.date.format("%Y-%m-%d"))
    }
}
