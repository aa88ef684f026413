//! Survey calculation session.
//!
//! A [`FuelCalculator`] owns the working tank list of one survey: the
//! vessel's fixed tanks plus any tanks the surveyor adds on the spot. Each
//! tank has exactly one [`SoundingEntry`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::correction::{self, round_to, ExpansionConstants, Quantities};
use super::{parse_number, CalculatorSettings, Measurement, SoundingEntry};
use crate::error::{Error, Result};
use crate::tank::{Bucket, FuelCategory, Tank};

/// Name given to tanks added during a survey.
const MANUAL_TANK_NAME: &str = "New Tank";

/// Prefix of generated manual tank ids.
const MANUAL_ID_PREFIX: &str = "ext-";

/// Outcome of [`FuelCalculator::remove_manual_tank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The manual tank and its entry were removed.
    Removed,
    /// The id belongs to a fixed tank; nothing was changed.
    FixedTank,
    /// No tank has this id; nothing was changed.
    NotFound,
}

/// Weight in air per category (t).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotals {
    /// High-sulphur fuel oil.
    pub hsfo: f64,
    /// Very-low-sulphur fuel oil.
    pub vlsfo: f64,
    /// Marine diesel oil.
    pub mdo: f64,
    /// Low-sulphur marine gas oil.
    pub lsmgo: f64,
}

impl CategoryTotals {
    /// Total for one category.
    #[must_use]
    pub fn get(&self, category: FuelCategory) -> f64 {
        match category {
            FuelCategory::Hsfo => self.hsfo,
            FuelCategory::Vlsfo => self.vlsfo,
            FuelCategory::Mdo => self.mdo,
            FuelCategory::Lsmgo => self.lsmgo,
        }
    }

    /// Sum of the categories rolling up into `bucket`.
    #[must_use]
    pub fn bucket(&self, bucket: Bucket) -> f64 {
        FuelCategory::ALL
            .into_iter()
            .filter(|c| c.bucket() == bucket)
            .map(|c| self.get(c))
            .sum()
    }
}

/// The persistable result of a survey session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedQuantities {
    /// Every entry in working-list order, with computed fields.
    pub entries: Vec<SoundingEntry>,
    /// Fuel oil total (t), overridden or HSFO + VLSFO, 2 decimals.
    #[serde(rename = "totalHFO")]
    pub total_hfo: f64,
    /// Gas oil total (t), overridden or MDO + LSMGO, 2 decimals.
    #[serde(rename = "totalMGO")]
    pub total_mgo: f64,
    /// Computed per-category weights, unaffected by overrides.
    pub categories: CategoryTotals,
}

/// Calculation session for one survey.
#[derive(Debug, Clone)]
pub struct FuelCalculator {
    settings: CalculatorSettings,
    /// Fixed tanks first, then manual tanks in creation order.
    tanks: Vec<Tank>,
    entries: HashMap<String, SoundingEntry>,
    manual_seq: u64,
}

impl FuelCalculator {
    /// Start a session over a vessel's fixed tanks with default settings.
    #[must_use]
    pub fn new(tanks: Vec<Tank>) -> Self {
        Self::with_settings(tanks, CalculatorSettings::default())
    }

    /// Start a session over a vessel's fixed tanks.
    ///
    /// Every tank gets a default entry. Tanks are treated as fixed whatever
    /// their `is_manual` flag says; a repeated id is dropped.
    #[must_use]
    pub fn with_settings(tanks: Vec<Tank>, settings: CalculatorSettings) -> Self {
        let mut session = Self {
            settings,
            tanks: Vec::with_capacity(tanks.len()),
            entries: HashMap::with_capacity(tanks.len()),
            manual_seq: 0,
        };

        for mut tank in tanks {
            if session.entries.contains_key(&tank.id) {
                warn!("Dropping duplicate tank id {}", tank.id);
                continue;
            }
            if tank.category().is_none() {
                warn!(
                    "Tank {} ({}) has unrecognised fuel type {:?}; it will not appear in any total",
                    tank.id, tank.name, tank.fuel_type
                );
            }
            tank.is_manual = false;
            let entry = session.settings.default_entry(&tank);
            session.entries.insert(tank.id.clone(), entry);
            session.tanks.push(tank);
        }

        debug!("Started session with {} fixed tanks", session.tanks.len());
        session
    }

    /// Reopen a saved survey for editing.
    ///
    /// Saved entries for fixed tanks replace the default entries. Entries for
    /// tanks missing from `tanks` come back as manual tanks, named and typed
    /// from the entry snapshot.
    #[must_use]
    pub fn resume(
        tanks: Vec<Tank>,
        saved: &[SoundingEntry],
        settings: CalculatorSettings,
    ) -> Self {
        let mut session = Self::with_settings(tanks, settings);
        let mut seen = HashSet::new();

        for entry in saved {
            if !seen.insert(entry.tank_id.clone()) {
                warn!("Ignoring repeated saved entry for tank {}", entry.tank_id);
                continue;
            }
            if !session.entries.contains_key(&entry.tank_id) {
                let tank = Tank {
                    id: entry.tank_id.clone(),
                    name: entry
                        .tank_name
                        .clone()
                        .unwrap_or_else(|| MANUAL_TANK_NAME.to_string()),
                    capacity: 0.0,
                    fuel_type: entry.fuel_type.clone().unwrap_or_default(),
                    is_manual: true,
                };
                if tank.category().is_none() {
                    warn!(
                        "Restored tank {} ({}) has unrecognised fuel type {:?}; it will not appear in any total",
                        tank.id, tank.name, tank.fuel_type
                    );
                }
                debug!("Restoring manual tank {}", tank.id);
                session.tanks.push(tank);
            }
            session.entries.insert(entry.tank_id.clone(), entry.clone());
        }

        session
    }

    /// Calculator settings in use.
    #[must_use]
    pub fn settings(&self) -> &CalculatorSettings {
        &self.settings
    }

    /// The working tank list, fixed tanks first.
    #[must_use]
    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    /// Look up a tank by id.
    #[must_use]
    pub fn tank(&self, tank_id: &str) -> Option<&Tank> {
        self.tanks.iter().find(|t| t.id == tank_id)
    }

    /// Manual tanks in creation order.
    pub fn manual_tanks(&self) -> impl Iterator<Item = &Tank> {
        self.tanks.iter().filter(|t| t.is_manual)
    }

    /// Fixed tanks in vessel order.
    pub fn fixed_tanks(&self) -> impl Iterator<Item = &Tank> {
        self.tanks.iter().filter(|t| !t.is_manual)
    }

    /// Tanks classified into `category`, in working-list order.
    #[must_use]
    pub fn tanks_in(&self, category: FuelCategory) -> Vec<&Tank> {
        self.tanks
            .iter()
            .filter(|t| t.category() == Some(category))
            .collect()
    }

    /// Tanks whose fuel type matches no category.
    #[must_use]
    pub fn unclassified_tanks(&self) -> Vec<&Tank> {
        self.tanks
            .iter()
            .filter(|t| t.category().is_none())
            .collect()
    }

    /// The entry of a tank.
    #[must_use]
    pub fn entry(&self, tank_id: &str) -> Option<&SoundingEntry> {
        self.entries.get(tank_id)
    }

    /// All entries in working-list order.
    pub fn entries(&self) -> impl Iterator<Item = &SoundingEntry> {
        self.tanks.iter().filter_map(|t| self.entries.get(&t.id))
    }

    /// Add a tank that is not part of the vessel configuration.
    pub fn add_manual_tank(&mut self, category: FuelCategory) -> Tank {
        let id = self.next_manual_id();
        let tank = Tank {
            id: id.clone(),
            name: MANUAL_TANK_NAME.to_string(),
            capacity: 0.0,
            fuel_type: category.default_tag().to_string(),
            is_manual: true,
        };

        let mut entry = self.settings.default_entry(&tank);
        entry.density_at_15 = if category.is_fuel_oil() {
            self.settings.fuel_oil_density
        } else {
            self.settings.distillate_density
        };

        info!("Added manual {} tank {}", category, id);
        self.entries.insert(id, entry);
        self.tanks.push(tank.clone());
        tank
    }

    fn next_manual_id(&mut self) -> String {
        loop {
            self.manual_seq += 1;
            let candidate = format!("{MANUAL_ID_PREFIX}{}", self.manual_seq);
            if !self.entries.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    /// Rename a manual tank.
    ///
    /// Returns `false` (and changes nothing) for fixed or unknown tanks.
    pub fn rename_manual_tank(&mut self, tank_id: &str, name: impl Into<String>) -> bool {
        match self.tanks.iter_mut().find(|t| t.id == tank_id) {
            Some(tank) if tank.is_manual => {
                tank.name = name.into();
                true
            }
            Some(_) => {
                warn!("Refusing to rename fixed tank {}", tank_id);
                false
            }
            None => false,
        }
    }

    /// Remove a manual tank together with its entry.
    ///
    /// Fixed tanks are never removed.
    pub fn remove_manual_tank(&mut self, tank_id: &str) -> Removal {
        let Some(index) = self.tanks.iter().position(|t| t.id == tank_id) else {
            return Removal::NotFound;
        };
        if !self.tanks[index].is_manual {
            warn!("Refusing to remove fixed tank {}", tank_id);
            return Removal::FixedTank;
        }

        self.tanks.remove(index);
        self.entries.remove(tank_id);
        info!("Removed manual tank {}", tank_id);
        Removal::Removed
    }

    /// Update one reading from user input.
    ///
    /// The computed fields are left stale until [`Self::compute_tank`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTank`] for an unknown id and
    /// [`Error::InvalidMeasurement`] when `raw` is not a finite number, in
    /// which case the previous value is kept.
    pub fn set_entry_field(&mut self, tank_id: &str, field: Measurement, raw: &str) -> Result<f64> {
        let entry = self
            .entries
            .get_mut(tank_id)
            .ok_or_else(|| Error::unknown_tank(tank_id))?;

        let Some(value) = parse_number(raw) else {
            warn!(
                "Rejected {} input {:?} for tank {}; keeping {}",
                field,
                raw,
                tank_id,
                entry.get(field)
            );
            return Err(Error::invalid_measurement(tank_id, field.name(), raw));
        };

        entry.set(field, value)?;
        debug!("Set {} = {} on tank {}", field, value, tank_id);
        Ok(value)
    }

    /// Update one reading with an already-parsed value.
    ///
    /// # Errors
    ///
    /// Same as [`Self::set_entry_field`].
    pub fn set_measurement(&mut self, tank_id: &str, field: Measurement, value: f64) -> Result<()> {
        self.entries
            .get_mut(tank_id)
            .ok_or_else(|| Error::unknown_tank(tank_id))?
            .set(field, value)
    }

    /// Recompute one tank and cache the result on its entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTank`] if the id is not in the working list.
    pub fn compute_tank(&mut self, tank_id: &str) -> Result<Quantities> {
        let fuel_oil = self
            .tank(tank_id)
            .ok_or_else(|| Error::unknown_tank(tank_id))?
            .is_fuel_oil();
        let entry = self
            .entries
            .get_mut(tank_id)
            .ok_or_else(|| Error::unknown_tank(tank_id))?;

        let quantities = correction::correct(
            entry.reading(),
            ExpansionConstants::for_product(fuel_oil),
            self.settings.density_fallback,
            self.settings.air_density,
        );
        entry.store(quantities);

        debug!(
            "Computed tank {}: vcf={:.5} gsv={:.2} wiv={:.3} wia={:.3}",
            tank_id,
            quantities.vcf,
            quantities.gsv,
            quantities.weight_in_vacuum,
            quantities.weight_in_air
        );
        Ok(quantities)
    }

    /// Recompute every tank in the working list.
    pub fn compute_all(&mut self) {
        let ids: Vec<String> = self.tanks.iter().map(|t| t.id.clone()).collect();
        for id in ids {
            if let Err(e) = self.compute_tank(&id) {
                warn!("Skipping tank {} during recompute: {}", id, e);
            }
        }
    }

    /// Sum of cached weights in air over the tanks in `category`.
    ///
    /// Tanks never computed count as zero.
    #[must_use]
    pub fn aggregate_category(&self, category: FuelCategory) -> f64 {
        self.tanks_in(category)
            .into_iter()
            .filter_map(|t| self.entries.get(&t.id))
            .map(SoundingEntry::weight_in_air_or_zero)
            .sum()
    }

    /// Cached weights per category.
    #[must_use]
    pub fn category_totals(&self) -> CategoryTotals {
        CategoryTotals {
            hsfo: self.aggregate_category(FuelCategory::Hsfo),
            vlsfo: self.aggregate_category(FuelCategory::Vlsfo),
            mdo: self.aggregate_category(FuelCategory::Mdo),
            lsmgo: self.aggregate_category(FuelCategory::Lsmgo),
        }
    }

    /// Produce the persistable snapshot of this session.
    ///
    /// A blank or non-numeric override counts as no override; the total then
    /// falls back to the computed bucket sum.
    #[must_use]
    pub fn finalize(
        &self,
        manual_hfo: Option<&str>,
        manual_mgo: Option<&str>,
    ) -> FinalizedQuantities {
        let categories = self.category_totals();

        let entries = self
            .tanks
            .iter()
            .filter_map(|tank| {
                self.entries.get(&tank.id).map(|entry| SoundingEntry {
                    tank_name: Some(tank.name.clone()),
                    fuel_type: Some(tank.fuel_type.clone()),
                    ..entry.clone()
                })
            })
            .collect();

        let total_hfo = parse_override("HFO", manual_hfo)
            .unwrap_or_else(|| categories.bucket(Bucket::Hfo));
        let total_mgo = parse_override("MGO", manual_mgo)
            .unwrap_or_else(|| categories.bucket(Bucket::Mgo));

        FinalizedQuantities {
            entries,
            total_hfo: round_to(total_hfo, 2),
            total_mgo: round_to(total_mgo, 2),
            categories,
        }
    }
}

fn parse_override(label: &str, raw: Option<&str>) -> Option<f64> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    let value = parse_number(raw);
    if value.is_none() {
        warn!("Ignoring non-numeric {} override {:?}", label, raw);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vessel_tanks() -> Vec<Tank> {
        vec![
            Tank::new("1P", "No.1 FO Port", 800.0, "HSFO"),
            Tank::new("1S", "No.1 FO Stbd", 800.0, "VLSFO"),
            Tank::new("DO", "DO Storage", 120.0, "MDO"),
            Tank::new("GO", "LSMGO Storage", 150.0, "LSMGO"),
            Tank::new("LO", "Lube Oil", 30.0, "LUBE"),
        ]
    }

    fn fill(session: &mut FuelCalculator, id: &str, volume: &str, temperature: &str) {
        session
            .set_entry_field(id, Measurement::ObservedVolume, volume)
            .unwrap();
        session
            .set_entry_field(id, Measurement::Temperature, temperature)
            .unwrap();
    }

    fn tank_ids(session: &FuelCalculator) -> Vec<String> {
        session.tanks().iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn test_new_session_defaults() {
        let session = FuelCalculator::new(vessel_tanks());
        assert_eq!(session.tanks().len(), 5);
        assert_eq!(session.entries().count(), 5);

        let fo = session.entry("1S").unwrap();
        assert!((fo.density_at_15 - 0.9910).abs() < f64::EPSILON);
        assert_eq!(fo.temperature, 15.0);

        let go = session.entry("GO").unwrap();
        assert!((go.density_at_15 - 0.8450).abs() < f64::EPSILON);
    }

    #[test]
    fn test_duplicate_tank_ids_dropped() {
        let mut tanks = vessel_tanks();
        tanks.push(Tank::new("1P", "Dup", 1.0, "MGO"));
        let session = FuelCalculator::new(tanks);
        assert_eq!(session.tanks().len(), 5);
        assert_eq!(session.tank("1P").unwrap().name, "No.1 FO Port");
    }

    #[test]
    fn test_supplied_tanks_are_fixed() {
        let mut tank = Tank::new("X", "X", 1.0, "MDO");
        tank.is_manual = true;
        let mut session = FuelCalculator::new(vec![tank]);
        assert_eq!(session.remove_manual_tank("X"), Removal::FixedTank);
    }

    #[test]
    fn test_compute_tank_example() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "1S", "1000", "30");

        let q = session.compute_tank("1S").unwrap();
        assert!((q.vcf - 0.994_316).abs() < 1e-6);
        assert!((q.gsv - 994.316).abs() < 0.001);
        assert!((q.weight_in_vacuum - 985.367).abs() < 0.001);
        assert!((q.weight_in_air - 984.273).abs() < 0.001);

        let entry = session.entry("1S").unwrap();
        assert_eq!(entry.quantities(), Some(q));
    }

    #[test]
    fn test_compute_uses_distillate_constants() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "GO", "200", "25");
        let q = session.compute_tank("GO").unwrap();
        assert!((q.weight_in_air - 167.363).abs() < 0.001);
    }

    #[test]
    fn test_compute_unknown_tank() {
        let mut session = FuelCalculator::new(vessel_tanks());
        let err = session.compute_tank("nope").unwrap_err();
        assert!(matches!(err, Error::UnknownTank { .. }));
    }

    #[test]
    fn test_compute_does_not_touch_other_tanks() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "1P", "500", "40");
        fill(&mut session, "1S", "300", "20");
        session.compute_tank("1P").unwrap();

        assert!(session.entry("1S").unwrap().quantities().is_none());
    }

    #[test]
    fn test_field_update_leaves_cache_stale() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "1S", "1000", "30");
        let first = session.compute_tank("1S").unwrap();

        fill(&mut session, "1S", "2000", "30");
        assert_eq!(session.entry("1S").unwrap().quantities(), Some(first));
        assert!((session.aggregate_category(FuelCategory::Vlsfo) - first.weight_in_air).abs() < 1e-12);

        let second = session.compute_tank("1S").unwrap();
        assert!((second.gsv - 2.0 * first.gsv).abs() < 1e-9);
    }

    #[test]
    fn test_set_entry_field_rejects_garbage() {
        let mut session = FuelCalculator::new(vessel_tanks());
        session
            .set_entry_field("DO", Measurement::DensityAt15, "0.86")
            .unwrap();

        for bad in ["", "abc", "NaN", "1e999", "0.8x"] {
            let err = session
                .set_entry_field("DO", Measurement::DensityAt15, bad)
                .unwrap_err();
            assert!(err.is_invalid_measurement(), "{bad}");
        }
        assert!((session.entry("DO").unwrap().density_at_15 - 0.86).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_entry_field_unknown_tank() {
        let mut session = FuelCalculator::new(vessel_tanks());
        let err = session
            .set_entry_field("ghost", Measurement::Sounding, "1.2")
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTank { .. }));
    }

    #[test]
    fn test_set_measurement_rejects_nan() {
        let mut session = FuelCalculator::new(vessel_tanks());
        session.set_measurement("DO", Measurement::Sounding, 2.5).unwrap();
        assert!(session
            .set_measurement("DO", Measurement::Sounding, f64::NAN)
            .is_err());
        assert_eq!(session.entry("DO").unwrap().sounding, 2.5);
    }

    #[test]
    fn test_zero_density_input_falls_back() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "DO", "100", "30");
        session
            .set_entry_field("DO", Measurement::DensityAt15, "0")
            .unwrap();
        let q = session.compute_tank("DO").unwrap();
        assert!(q.vcf.is_finite());
        assert!((q.weight_in_air - 88.847).abs() < 0.001);
    }

    #[test]
    fn test_add_manual_tank() {
        let mut session = FuelCalculator::new(vessel_tanks());
        let tank = session.add_manual_tank(FuelCategory::Hsfo);

        assert!(tank.is_manual);
        assert_eq!(tank.name, "New Tank");
        assert_eq!(tank.fuel_type, "HFO");
        assert_eq!(tank.capacity, 0.0);
        assert_eq!(tank.category(), Some(FuelCategory::Hsfo));

        let entry = session.entry(&tank.id).unwrap();
        assert!((entry.density_at_15 - 0.9910).abs() < f64::EPSILON);
        assert_eq!(entry.temperature, 15.0);
        assert_eq!(session.manual_tanks().count(), 1);
        assert_eq!(session.tanks_in(FuelCategory::Hsfo).len(), 2);
    }

    #[test]
    fn test_add_manual_distillate_density() {
        let mut session = FuelCalculator::new(Vec::new());
        let tank = session.add_manual_tank(FuelCategory::Lsmgo);
        assert!((session.entry(&tank.id).unwrap().density_at_15 - 0.8450).abs() < f64::EPSILON);
    }

    #[test]
    fn test_manual_ids_unique() {
        let mut session = FuelCalculator::new(vec![Tank::new("ext-1", "Odd", 1.0, "MDO")]);
        let a = session.add_manual_tank(FuelCategory::Mdo);
        let b = session.add_manual_tank(FuelCategory::Mdo);
        assert_ne!(a.id, "ext-1");
        assert_ne!(a.id, b.id);

        session.remove_manual_tank(&a.id);
        let c = session.add_manual_tank(FuelCategory::Mdo);
        assert_ne!(c.id, b.id);
    }

    #[test]
    fn test_add_then_remove_round_trip() {
        let mut session = FuelCalculator::new(vessel_tanks());
        let before = tank_ids(&session);

        let tank = session.add_manual_tank(FuelCategory::Vlsfo);
        assert_eq!(session.remove_manual_tank(&tank.id), Removal::Removed);

        assert_eq!(tank_ids(&session), before);
        assert!(session.entry(&tank.id).is_none());
    }

    #[test]
    fn test_remove_fixed_tank_rejected() {
        let mut session = FuelCalculator::new(vessel_tanks());
        let before = tank_ids(&session);

        assert_eq!(session.remove_manual_tank("1P"), Removal::FixedTank);
        assert_eq!(tank_ids(&session), before);
        assert!(session.entry("1P").is_some());
    }

    #[test]
    fn test_remove_missing_idempotent() {
        let mut session = FuelCalculator::new(vessel_tanks());
        let tank = session.add_manual_tank(FuelCategory::Mdo);
        assert_eq!(session.remove_manual_tank(&tank.id), Removal::Removed);
        assert_eq!(session.remove_manual_tank(&tank.id), Removal::NotFound);
        assert_eq!(session.tanks().len(), 5);
    }

    #[test]
    fn test_rename_manual_tank() {
        let mut session = FuelCalculator::new(vessel_tanks());
        let tank = session.add_manual_tank(FuelCategory::Mdo);

        assert!(session.rename_manual_tank(&tank.id, "Emergency DO"));
        assert_eq!(session.tank(&tank.id).unwrap().name, "Emergency DO");

        assert!(!session.rename_manual_tank("DO", "Renamed"));
        assert_eq!(session.tank("DO").unwrap().name, "DO Storage");
        assert!(!session.rename_manual_tank("ghost", "x"));
    }

    #[test]
    fn test_aggregate_empty_category() {
        let session = FuelCalculator::new(vec![Tank::new("1", "One", 1.0, "MDO")]);
        assert_eq!(session.aggregate_category(FuelCategory::Vlsfo), 0.0);
        assert_eq!(session.aggregate_category(FuelCategory::Mdo), 0.0);

        let empty = FuelCalculator::new(Vec::new());
        for category in FuelCategory::ALL {
            assert_eq!(empty.aggregate_category(category), 0.0);
        }
    }

    #[test]
    fn test_unclassified_tank_excluded() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "LO", "25", "30");
        session.compute_all();

        let unclassified = session.unclassified_tanks();
        assert_eq!(unclassified.len(), 1);
        assert_eq!(unclassified[0].id, "LO");

        let totals = session.category_totals();
        let sum: f64 = FuelCategory::ALL.into_iter().map(|c| totals.get(c)).sum();
        assert_eq!(sum, 0.0);
        assert!(session.entry("LO").unwrap().weight_in_air.unwrap() > 0.0);
    }

    #[test]
    fn test_finalize_partitions_buckets() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "1P", "500", "40");
        fill(&mut session, "1S", "1000", "30");
        fill(&mut session, "DO", "80", "20");
        fill(&mut session, "GO", "200", "25");
        session.compute_all();

        let totals = session.category_totals();
        let finalized = session.finalize(None, None);

        assert!((finalized.total_hfo - round_to(totals.hsfo + totals.vlsfo, 2)).abs() < 1e-9);
        assert!((finalized.total_mgo - round_to(totals.mdo + totals.lsmgo, 2)).abs() < 1e-9);
        assert_eq!(finalized.categories, totals);
        assert_eq!(finalized.entries.len(), 5);
        assert_eq!(finalized.entries[0].tank_id, "1P");
        assert_eq!(finalized.entries[0].tank_name.as_deref(), Some("No.1 FO Port"));
        assert_eq!(finalized.entries[3].fuel_type.as_deref(), Some("LSMGO"));
    }

    #[test]
    fn test_finalize_hfo_override() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "1S", "1000", "30");
        fill(&mut session, "GO", "200", "25");
        session.compute_all();

        let finalized = session.finalize(Some("473.058"), None);
        assert!((finalized.total_hfo - 473.06).abs() < 1e-9);
        assert!((finalized.total_mgo - 167.36).abs() < 1e-9);
        assert!((finalized.categories.vlsfo - 984.273).abs() < 0.001);
    }

    #[test]
    fn test_finalize_unparseable_override_falls_back() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "1S", "1000", "30");
        session.compute_all();

        for raw in ["", "   ", "n/a"] {
            let finalized = session.finalize(Some(raw), Some(raw));
            assert!((finalized.total_hfo - 984.27).abs() < 1e-9, "{raw:?}");
            assert_eq!(finalized.total_mgo, 0.0);
        }

        let zero = session.finalize(Some("0"), None);
        assert_eq!(zero.total_hfo, 0.0);
    }

    #[test]
    fn test_finalize_huge_override_stays_finite() {
        let session = FuelCalculator::new(vessel_tanks());
        let finalized = session.finalize(Some("1e307"), Some("-1e307"));
        assert_eq!(finalized.total_hfo, 1e307);
        assert_eq!(finalized.total_mgo, -1e307);
    }

    #[test]
    fn test_finalize_uses_current_manual_names() {
        let mut session = FuelCalculator::new(Vec::new());
        let tank = session.add_manual_tank(FuelCategory::Vlsfo);
        session.rename_manual_tank(&tank.id, "Slop FO");

        let finalized = session.finalize(None, None);
        assert_eq!(finalized.entries.len(), 1);
        assert_eq!(finalized.entries[0].tank_name.as_deref(), Some("Slop FO"));
        assert_eq!(finalized.entries[0].fuel_type.as_deref(), Some("VLSFO"));
        assert!(finalized.entries[0].weight_in_air.is_none());
    }

    #[test]
    fn test_resume_restores_entries_and_manual_tanks() {
        let mut session = FuelCalculator::new(vessel_tanks());
        fill(&mut session, "1S", "1000", "30");
        let manual = session.add_manual_tank(FuelCategory::Mdo);
        session.rename_manual_tank(&manual.id, "Spare DO");
        fill(&mut session, &manual.id, "10", "15");
        session.compute_all();
        let finalized = session.finalize(None, None);

        let resumed = FuelCalculator::resume(
            vessel_tanks(),
            &finalized.entries,
            CalculatorSettings::default(),
        );

        assert_eq!(resumed.tanks().len(), 6);
        let restored = resumed.tank(&manual.id).unwrap();
        assert!(restored.is_manual);
        assert_eq!(restored.name, "Spare DO");
        assert_eq!(restored.category(), Some(FuelCategory::Mdo));

        assert_eq!(resumed.entry("1S").unwrap().observed_volume, 1000.0);
        assert!(
            (resumed.aggregate_category(FuelCategory::Vlsfo)
                - session.aggregate_category(FuelCategory::Vlsfo))
            .abs()
                < 1e-12
        );
        assert_eq!(resumed.finalize(None, None), finalized);
    }

    #[test]
    fn test_resume_new_manual_ids_do_not_collide() {
        let mut session = FuelCalculator::new(Vec::new());
        let first = session.add_manual_tank(FuelCategory::Mdo);
        let finalized = session.finalize(None, None);

        let mut resumed =
            FuelCalculator::resume(Vec::new(), &finalized.entries, CalculatorSettings::default());
        let second = resumed.add_manual_tank(FuelCategory::Mdo);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_resume_unclassified_manual_tank_is_reported() {
        let mut saved = CalculatorSettings::default().default_entry(&Tank::new(
            "ext-1",
            "Lube Drain",
            0.0,
            "LUBE",
        ));
        saved.observed_volume = 3.0;
        let mut untyped = saved.clone();
        untyped.tank_id = "ext-2".to_string();
        untyped.fuel_type = None;

        let resumed = FuelCalculator::resume(
            Vec::new(),
            &[saved, untyped],
            CalculatorSettings::default(),
        );
        let ids: Vec<&str> = resumed
            .unclassified_tanks()
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, ["ext-1", "ext-2"]);
        assert_eq!(resumed.finalize(None, None).total_mgo, 0.0);
    }

    #[test]
    fn test_category_totals_bucket() {
        let totals = CategoryTotals {
            hsfo: 1.0,
            vlsfo: 2.0,
            mdo: 4.0,
            lsmgo: 8.0,
        };
        assert_eq!(totals.bucket(Bucket::Hfo), 3.0);
        assert_eq!(totals.bucket(Bucket::Mgo), 12.0);
    }

    #[test]
    fn test_finalized_serialization_keys() {
        let session = FuelCalculator::new(vessel_tanks());
        let json = serde_json::to_string(&session.finalize(None, None)).unwrap();
        assert!(json.contains("\"totalHFO\""));
        assert!(json.contains("\"totalMGO\""));
        assert!(json.contains("\"entries\""));
    }
}
