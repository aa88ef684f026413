//! Configuration management for bunkersurvey.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::calculator::CalculatorSettings;
use crate::error::{Error, Result};
use crate::survey::SurveyKind;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "bunkersurvey";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "surveys.db";

/// Prefix of configuration environment variables.
const ENV_PREFIX: &str = "BUNKERSURVEY_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BUNKERSURVEY_`, sections
///    separated by `__`, e.g. `BUNKERSURVEY_CALCULATOR__AIR_DENSITY`)
/// 2. TOML config file at `~/.config/bunkersurvey/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Calculator constants and entry defaults.
    pub calculator: CalculatorSettings,
    /// Defaults for new surveys.
    pub survey: SurveyConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/bunkersurvey/surveys.db`
    pub database_path: Option<PathBuf>,
}

/// Defaults applied to surveys created from worksheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Survey type when a worksheet does not give one.
    pub default_kind: SurveyKind,
    /// Place of survey when a worksheet does not give one.
    pub default_location: Option<String>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let calc = &self.calculator;
        for (name, value) in [
            ("default_temperature", calc.default_temperature),
            ("fuel_oil_density", calc.fuel_oil_density),
            ("distillate_density", calc.distillate_density),
            ("density_fallback", calc.density_fallback),
            ("air_density", calc.air_density),
        ] {
            if !value.is_finite() {
                return Err(Error::ConfigValidation {
                    message: format!("calculator.{name} must be a finite number"),
                });
            }
        }

        if calc.air_density < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "calculator.air_density ({}) cannot be negative",
                    calc.air_density
                ),
            });
        }

        for (name, value) in [
            ("fuel_oil_density", calc.fuel_oil_density),
            ("distillate_density", calc.distillate_density),
            ("density_fallback", calc.density_fallback),
        ] {
            if value <= calc.air_density {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "calculator.{name} ({value}) must be greater than air_density ({})",
                        calc.air_density
                    ),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
