//! Volume correction to 15 °C and mass conversion.
//!
//! Implements the generalized-products correction of ASTM D1250 Table 54B:
//!
//! ```text
//! α15 = K0 / ρ15² + K1 / ρ15          (ρ15 in kg/m³)
//! VCF = exp(-α15 · ΔT · (1 + 0.8 · α15 · ΔT))
//! ```
//!
//! followed by the weight-in-vacuum / weight-in-air conversion with a fixed
//! air buoyancy density.

use serde::{Deserialize, Serialize};

/// Reference temperature of the standard volume (°C).
pub const REFERENCE_TEMPERATURE: f64 = 15.0;

/// Air density used for the buoyancy correction (t/m³).
pub const AIR_DENSITY: f64 = 0.0011;

/// Density substituted when an entry has no usable density (t/m³).
pub const DENSITY_FALLBACK: f64 = 0.9;

/// Table 54B thermal expansion constants for one product group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpansionConstants {
    /// K0 coefficient.
    pub k0: f64,
    /// K1 coefficient.
    pub k1: f64,
}

/// Constants for residual fuel oils.
pub const FUEL_OIL: ExpansionConstants = ExpansionConstants {
    k0: 103.8720,
    k1: 0.2701,
};

/// Constants for distillates (diesel and gas oils).
pub const DISTILLATE: ExpansionConstants = ExpansionConstants {
    k0: 186.9696,
    k1: 0.4862,
};

impl ExpansionConstants {
    /// Pick the constant set for a product.
    #[must_use]
    pub fn for_product(fuel_oil: bool) -> Self {
        if fuel_oil {
            FUEL_OIL
        } else {
            DISTILLATE
        }
    }

    /// Thermal expansion coefficient at 15 °C for a density in t/m³.
    #[must_use]
    pub fn alpha15(&self, density_t_m3: f64) -> f64 {
        let rho = density_t_m3 * 1000.0;
        self.k0 / (rho * rho) + self.k1 / rho
    }

    /// Volume correction factor from `temperature` to 15 °C.
    #[must_use]
    pub fn vcf(&self, density_t_m3: f64, temperature: f64) -> f64 {
        let alpha = self.alpha15(density_t_m3);
        let delta_t = temperature - REFERENCE_TEMPERATURE;
        (-alpha * delta_t * (1.0 + 0.8 * alpha * delta_t)).exp()
    }
}

/// Corrected quantities for one tank.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quantities {
    /// Volume correction factor.
    pub vcf: f64,
    /// Gross standard volume at 15 °C (m³).
    pub gsv: f64,
    /// Mass without buoyancy correction (t).
    pub weight_in_vacuum: f64,
    /// Mass with buoyancy correction (t).
    pub weight_in_air: f64,
}

impl Quantities {
    /// Values rounded for display: VCF to 5 places, GSV to 2, weights to 3.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            vcf: round_to(self.vcf, 5),
            gsv: round_to(self.gsv, 2),
            weight_in_vacuum: round_to(self.weight_in_vacuum, 3),
            weight_in_air: round_to(self.weight_in_air, 3),
        }
    }
}

/// Inputs of a single tank correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Observed volume at the observed temperature (m³).
    pub observed_volume: f64,
    /// Observed temperature (°C).
    pub temperature: f64,
    /// Density at 15 °C (t/m³).
    pub density_at_15: f64,
}

/// Correct a reading to standard volume and mass.
///
/// A density that is zero, negative or not finite is replaced by
/// `density_fallback`; a temperature that is zero or not finite is taken as
/// 15 °C; a non-finite volume as zero.
#[must_use]
pub fn correct(
    reading: Reading,
    constants: ExpansionConstants,
    density_fallback: f64,
    air_density: f64,
) -> Quantities {
    let density = if reading.density_at_15.is_finite() && reading.density_at_15 > 0.0 {
        reading.density_at_15
    } else {
        density_fallback
    };
    let temperature = if reading.temperature.is_finite() && reading.temperature != 0.0 {
        reading.temperature
    } else {
        REFERENCE_TEMPERATURE
    };
    let volume = if reading.observed_volume.is_finite() {
        reading.observed_volume
    } else {
        0.0
    };

    let vcf = constants.vcf(density, temperature);
    let gsv = volume * vcf;

    Quantities {
        vcf,
        gsv,
        weight_in_vacuum: gsv * density,
        weight_in_air: gsv * (density - air_density),
    }
}

/// Round half away from zero to `places` decimals.
///
/// Values too large to scale are returned unchanged.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if scaled.is_finite() {
        scaled.round() / factor
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(volume: f64, temperature: f64, density: f64) -> Reading {
        Reading {
            observed_volume: volume,
            temperature,
            density_at_15: density,
        }
    }

    #[test]
    fn test_vlsfo_at_30_degrees() {
        let q = correct(reading(1000.0, 30.0, 0.9910), FUEL_OIL, DENSITY_FALLBACK, AIR_DENSITY);

        assert!((q.vcf - 0.994_316).abs() < 1e-6);
        assert!((q.gsv - 994.316).abs() < 0.001);
        assert!((q.weight_in_vacuum - 985.367).abs() < 0.001);
        assert!((q.weight_in_air - 984.273).abs() < 0.001);

        let r = q.rounded();
        assert!((r.vcf - 0.99432).abs() < 1e-9);
        assert!((r.gsv - 994.32).abs() < 1e-9);
        assert!((r.weight_in_vacuum - 985.367).abs() < 1e-9);
        assert!((r.weight_in_air - 984.273).abs() < 1e-9);
    }

    #[test]
    fn test_distillate_constants() {
        let q = correct(reading(200.0, 25.0, 0.8450), DISTILLATE, DENSITY_FALLBACK, AIR_DENSITY);
        assert!((q.vcf - 0.991_607).abs() < 1e-6);
        assert!((q.weight_in_air - 167.363).abs() < 0.001);
    }

    #[test]
    fn test_below_reference_expands_factor() {
        let q = correct(reading(500.0, 10.0, 0.9910), FUEL_OIL, DENSITY_FALLBACK, AIR_DENSITY);
        assert!(q.vcf > 1.0);
        assert!((q.gsv - 500.945).abs() < 0.001);
    }

    #[test]
    fn test_reference_temperature_gives_unit_factor() {
        for density in [0.0012, 0.5, 0.8450, 0.9, 0.9910, 1.05] {
            for constants in [FUEL_OIL, DISTILLATE] {
                assert_eq!(constants.vcf(density, REFERENCE_TEMPERATURE), 1.0);
            }
        }
    }

    #[test]
    fn test_air_weight_never_exceeds_vacuum_weight() {
        for density in [0.0012, 0.8450, 0.9910, 1.01] {
            for temperature in [-5.0, 0.0, 15.0, 45.0, 80.0] {
                let q = correct(
                    reading(750.0, temperature, density),
                    FUEL_OIL,
                    DENSITY_FALLBACK,
                    AIR_DENSITY,
                );
                assert!(q.weight_in_air <= q.weight_in_vacuum);
            }
        }
    }

    #[test]
    fn test_zero_density_uses_fallback() {
        let zero = correct(reading(100.0, 30.0, 0.0), DISTILLATE, DENSITY_FALLBACK, AIR_DENSITY);
        let fallback = correct(reading(100.0, 30.0, 0.9), DISTILLATE, DENSITY_FALLBACK, AIR_DENSITY);
        assert_eq!(zero, fallback);
        assert!(zero.vcf.is_finite());
        assert!((zero.weight_in_air - 88.847).abs() < 0.001);

        let nan = correct(reading(100.0, 30.0, f64::NAN), DISTILLATE, DENSITY_FALLBACK, AIR_DENSITY);
        assert_eq!(nan, fallback);
    }

    #[test]
    fn test_zero_temperature_falls_back() {
        let zero = correct(reading(1000.0, 0.0, 0.9910), FUEL_OIL, DENSITY_FALLBACK, AIR_DENSITY);
        assert_eq!(zero.vcf, 1.0);
        assert_eq!(zero.gsv, 1000.0);

        let near = correct(reading(1000.0, 0.5, 0.9910), FUEL_OIL, DENSITY_FALLBACK, AIR_DENSITY);
        assert!(near.vcf > 1.0);
    }

    #[test]
    fn test_non_finite_inputs_stay_finite() {
        let q = correct(
            reading(f64::NAN, f64::INFINITY, 0.9910),
            FUEL_OIL,
            DENSITY_FALLBACK,
            AIR_DENSITY,
        );
        assert_eq!(q.vcf, 1.0);
        assert_eq!(q.gsv, 0.0);
        assert_eq!(q.weight_in_air, 0.0);
    }

    #[test]
    fn test_zero_volume() {
        let q = correct(reading(0.0, 40.0, 0.9910), FUEL_OIL, DENSITY_FALLBACK, AIR_DENSITY);
        assert_eq!(q.gsv, 0.0);
        assert_eq!(q.weight_in_vacuum, 0.0);
        assert!(q.vcf < 1.0);
    }

    #[test]
    fn test_for_product() {
        assert_eq!(ExpansionConstants::for_product(true), FUEL_OIL);
        assert_eq!(ExpansionConstants::for_product(false), DISTILLATE);
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(1.234_56, 2) - 1.23).abs() < 1e-12);
        assert!((round_to(2.5, 0) - 3.0).abs() < 1e-12);
        assert!((round_to(-0.123_45, 3) + 0.123).abs() < 1e-12);
    }

    #[test]
    fn test_round_to_huge_value_stays_finite() {
        assert_eq!(round_to(1e307, 2), 1e307);
        assert_eq!(round_to(-1e307, 3), -1e307);
        assert!(round_to(f64::MAX, 2).is_finite());
    }
}
