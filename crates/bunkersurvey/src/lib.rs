//! `bunkersurvey` - Bunker survey quantity calculator and survey record store
//!
//! This library converts tank soundings into standard volumes and weights
//! (ASTM Table 54B), totals them per fuel category, and keeps completed
//! surveys and vessel configurations in a local document store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod calculator;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod storage;
pub mod survey;
pub mod tank;
pub mod vessel;

pub use calculator::{FinalizedQuantities, FuelCalculator, Measurement, SoundingEntry};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use report::{QuantityReport, ReportSink, TextSink};
pub use storage::{DocumentStore, Storage, StorageStats};
pub use survey::Survey;
pub use tank::{FuelCategory, Tank};
pub use vessel::Vessel;
