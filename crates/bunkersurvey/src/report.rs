//! Quantity reports.
//!
//! A [`QuantityReport`] is the tabular view of a saved survey that the
//! certificate renderer consumes: a header block plus one table per fuel
//! category that has at least one tank. Rendering goes through a
//! [`ReportSink`]; [`TextSink`] produces aligned plain text.

use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::calculator::correction::round_to;
use crate::error::Result;
use crate::survey::{Survey, SurveyKind, SurveyStatus};
use crate::tank::FuelCategory;
use crate::vessel::Vessel;

const MISSING: &str = "-";

/// One tank line of a quantity table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityRow {
    /// Tank id.
    pub tank_id: String,
    /// Tank name as printed.
    pub tank_name: String,
    /// Fuel type as printed.
    pub fuel_type: String,
    /// Sounding or ullage (m).
    pub sounding: f64,
    /// Observed temperature (°C).
    pub temperature: f64,
    /// Density at 15 °C (t/m³).
    pub density_at_15: f64,
    /// Observed volume (m³).
    pub observed_volume: f64,
    /// Volume correction factor, 5 dp.
    pub vcf: Option<f64>,
    /// Gross standard volume (m³), 2 dp.
    pub gsv: Option<f64>,
    /// Weight in air (t), 3 dp. Zero for tanks never computed.
    pub weight_in_air: f64,
}

/// All rows of one fuel category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityTable {
    /// The category.
    pub category: FuelCategory,
    /// Table heading.
    pub title: &'static str,
    /// Tank lines in survey order.
    pub rows: Vec<QuantityRow>,
    /// Sum of the row weights (t), 3 dp.
    pub total: f64,
}

/// Survey identification printed above the tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    /// Vessel name.
    pub vessel_name: String,
    /// IMO number.
    pub vessel_imo: String,
    /// On-hire or off-hire.
    pub kind: SurveyKind,
    /// Lifecycle state.
    pub status: SurveyStatus,
    /// Survey date.
    pub date: NaiveDate,
    /// Place of survey.
    pub location: String,
    /// Place of delivery or redelivery.
    pub place_of_delivery: String,
}

/// Tabular quantities of one survey.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityReport {
    /// Identification block.
    pub header: ReportHeader,
    /// Non-empty category tables in HSFO, VLSFO, MDO, LSMGO order.
    pub tables: Vec<QuantityTable>,
    /// Tanks whose fuel type matched no category.
    pub unclassified: Vec<String>,
    /// Reported fuel oil total (t).
    #[serde(rename = "totalHFO")]
    pub total_hfo: f64,
    /// Reported gas oil total (t).
    #[serde(rename = "totalMGO")]
    pub total_mgo: f64,
}

impl QuantityReport {
    /// Build the report for `survey`.
    ///
    /// Tank names and fuel types come from the entry snapshots, then from
    /// `vessel`, and finally fall back to the tank id and `-`.
    #[must_use]
    pub fn from_survey(survey: &Survey, vessel: Option<&Vessel>) -> Self {
        let mut buckets: Vec<(FuelCategory, Vec<QuantityRow>, f64)> = FuelCategory::ALL
            .into_iter()
            .map(|c| (c, Vec::new(), 0.0))
            .collect();
        let mut unclassified = Vec::new();

        for entry in &survey.soundings {
            let tank = vessel.and_then(|v| v.tank(&entry.tank_id));
            let tank_name = entry
                .tank_name
                .clone()
                .or_else(|| tank.map(|t| t.name.clone()))
                .unwrap_or_else(|| entry.tank_id.clone());
            let fuel_type = entry
                .fuel_type
                .clone()
                .or_else(|| tank.map(|t| t.fuel_type.clone()))
                .unwrap_or_else(|| MISSING.to_string());

            let Some(category) = FuelCategory::classify(&fuel_type) else {
                warn!(
                    "Tank {} with fuel type {:?} left out of the report",
                    entry.tank_id, fuel_type
                );
                unclassified.push(tank_name);
                continue;
            };

            let weight = entry.weight_in_air_or_zero();
            let slot = &mut buckets[category_index(category)];
            slot.2 += weight;
            slot.1.push(QuantityRow {
                tank_id: entry.tank_id.clone(),
                tank_name,
                fuel_type,
                sounding: entry.sounding,
                temperature: entry.temperature,
                density_at_15: entry.density_at_15,
                observed_volume: entry.observed_volume,
                vcf: entry.vcf.map(|v| round_to(v, 5)),
                gsv: entry.gsv.map(|v| round_to(v, 2)),
                weight_in_air: round_to(weight, 3),
            });
        }

        let tables: Vec<QuantityTable> = buckets
            .into_iter()
            .filter(|(_, rows, _)| !rows.is_empty())
            .map(|(category, rows, total)| QuantityTable {
                category,
                title: category.title(),
                rows,
                total: round_to(total, 3),
            })
            .collect();
        debug!(
            "Built quantity report with {} tables for {}",
            tables.len(),
            survey.details.vessel_name
        );

        let details = &survey.details;
        Self {
            header: ReportHeader {
                vessel_name: details.vessel_name.clone(),
                vessel_imo: details.vessel_imo.clone(),
                kind: details.kind,
                status: survey.status,
                date: survey.date,
                location: or_missing(details.location.as_deref()),
                place_of_delivery: or_missing(details.place_of_delivery.as_deref()),
            },
            tables,
            unclassified,
            total_hfo: survey.total_hfo,
            total_mgo: survey.total_mgo,
        }
    }

    /// The table for `category`, if it has any rows.
    #[must_use]
    pub fn table(&self, category: FuelCategory) -> Option<&QuantityTable> {
        self.tables.iter().find(|t| t.category == category)
    }

    /// Feed the report to `sink`.
    ///
    /// # Errors
    ///
    /// Returns whatever error the sink reports.
    pub fn render<S: ReportSink>(&self, sink: &mut S) -> Result<()> {
        sink.header(&self.header)?;
        for table in &self.tables {
            sink.table(table)?;
        }
        sink.totals(self.total_hfo, self.total_mgo)
    }
}

fn category_index(category: FuelCategory) -> usize {
    match category {
        FuelCategory::Hsfo => 0,
        FuelCategory::Vlsfo => 1,
        FuelCategory::Mdo => 2,
        FuelCategory::Lsmgo => 3,
    }
}

fn or_missing(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

/// Destination of a rendered report.
pub trait ReportSink {
    /// Write the identification block.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn header(&mut self, header: &ReportHeader) -> Result<()>;

    /// Write one category table.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn table(&mut self, table: &QuantityTable) -> Result<()>;

    /// Write the reported totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    fn totals(&mut self, total_hfo: f64, total_mgo: f64) -> Result<()>;
}

/// Renders reports as aligned plain text.
#[derive(Debug)]
pub struct TextSink<W> {
    out: W,
}

impl<W: Write> TextSink<W> {
    /// Create a sink writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReportSink for TextSink<W> {
    fn header(&mut self, header: &ReportHeader) -> Result<()> {
        writeln!(self.out, "{} - {}", header.kind, header.vessel_name)?;
        writeln!(
            self.out,
            "IMO: {}  Date: {}  Status: {:?}",
            header.vessel_imo,
            header.date.format("%d.%m.%Y"),
            header.status
        )?;
        writeln!(
            self.out,
            "Place of Survey: {}  Place of Delivery: {}",
            header.location, header.place_of_delivery
        )?;
        writeln!(self.out)?;
        writeln!(self.out, "CALCULATED QUANTITIES")?;
        Ok(())
    }

    fn table(&mut self, table: &QuantityTable) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", table.title)?;
        writeln!(
            self.out,
            "{:<16} {:<8} {:>8} {:>7} {:>8} {:>10} {:>8} {:>10} {:>11}",
            "Tank", "Type", "Sound.", "Temp", "Dens@15", "Vol (m3)", "VCF", "GSV (m3)", "WiA (t)"
        )?;
        for row in &table.rows {
            let vcf = row.vcf.map_or_else(|| MISSING.to_string(), |v| format!("{v:.5}"));
            let gsv = row.gsv.map_or_else(|| MISSING.to_string(), |v| format!("{v:.2}"));
            writeln!(
                self.out,
                "{:<16} {:<8} {:>8.3} {:>7.1} {:>8.4} {:>10.3} {:>8} {:>10} {:>11.3}",
                row.tank_name,
                row.fuel_type,
                row.sounding,
                row.temperature,
                row.density_at_15,
                row.observed_volume,
                vcf,
                gsv,
                row.weight_in_air
            )?;
        }
        writeln!(self.out, "{:>86} {:>11.3}", "Total", table.total)?;
        Ok(())
    }

    fn totals(&mut self, total_hfo: f64, total_mgo: f64) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Total HFO (t): {total_hfo:.2}")?;
        writeln!(self.out, "Total MGO (t): {total_mgo:.2}")?;
        self.out.flush()?;
        Ok(())
    }
}
