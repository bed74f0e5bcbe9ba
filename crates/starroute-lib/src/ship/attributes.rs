//! Ship attributes used by the performance and timing models.

use serde::{Deserialize, Serialize};

use super::constants::MAX_FUEL_CAPACITY;
use crate::error::{Error, Result};

/// Frame shift drive parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FsdSpec {
    /// Exponent of the fuel/range curve.
    pub fuel_power: f64,
    /// Nominal fuel multiplier.
    pub fuel_multiplier: f64,
    /// Most fuel the drive can burn in a single jump.
    pub max_fuel_per_jump: f64,
    /// Mass at which the drive reaches its rated range.
    pub optimised_mass: f64,
}

/// Ship specification, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    #[serde(default)]
    pub name: String,
    pub dry_mass: f64,
    pub fuel_capacity: f64,
    pub fsd: FsdSpec,
    /// Flat jump-range bonus (e.g. from a guardian booster).
    #[serde(default)]
    pub range_bonus: f64,
    /// Fuel units scooped per second; zero means no scoop fitted.
    #[serde(default)]
    pub scoop_rate: f64,
}

impl Ship {
    /// Validate ship attributes for correctness.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            (self.fsd.fuel_power, "fuel_power"),
            (self.fsd.fuel_multiplier, "fuel_multiplier"),
            (self.fsd.optimised_mass, "optimised_mass"),
        ];
        for (value, field) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::ShipDataValidation {
                    message: format!("{field} must be a finite positive number"),
                });
            }
        }

        let non_negative = [
            (self.dry_mass, "dry_mass"),
            (self.fuel_capacity, "fuel_capacity"),
            (self.fsd.max_fuel_per_jump, "max_fuel_per_jump"),
            (self.range_bonus, "range_bonus"),
            (self.scoop_rate, "scoop_rate"),
        ];
        for (value, field) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::ShipDataValidation {
                    message: format!("{field} must be finite and non-negative"),
                });
            }
        }

        if self.fuel_capacity > MAX_FUEL_CAPACITY {
            return Err(Error::ShipDataValidation {
                message: format!("fuel_capacity must not exceed {MAX_FUEL_CAPACITY}"),
            });
        }

        if self.dry_mass + self.fuel_capacity <= 0.0 {
            return Err(Error::ShipDataValidation {
                message: "ship must have positive total mass".to_string(),
            });
        }

        Ok(())
    }

    /// Whether the ship carries a fuel scoop.
    pub fn can_scoop(&self) -> bool {
        self.scoop_rate > 0.0
    }

    /// Fuel below which a jump leaves the ship stranded.
    pub fn fuel_floor(&self) -> f64 {
        self.fsd.max_fuel_per_jump / super::constants::FUEL_FLOOR_DIVISOR
    }
}
