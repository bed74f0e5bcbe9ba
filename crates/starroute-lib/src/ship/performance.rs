//! Fuel to jump-range physics, tabulated once per run.
//!
//! Jump range follows the drive's fuel curve:
//!
//! ```text
//! range = (optimised_mass / total_mass) * (min(max_fuel_per_jump, fuel) / multiplier)^(1 / fuel_power)
//! ```
//!
//! A flat range bonus is folded into an effective multiplier so the fuel cost
//! formula stays the exact inverse of the range formula. Because range is
//! evaluated for every candidate edge, the model precomputes range and
//! effective multiplier in [`FUEL_TABLE_STEP`] increments across the tank.

use super::attributes::Ship;
use super::constants::{FUEL_TABLE_STEP, MAX_FUEL_CAPACITY};

#[derive(Debug, Clone, Copy, PartialEq)]
struct TableEntry {
    range: f64,
    multiplier: f64,
}

/// Precomputed jump range and fuel cost model for one ship.
#[derive(Debug, Clone)]
pub struct ShipPerformanceModel {
    ship: Ship,
    table: Vec<TableEntry>,
    max_range: f64,
}

impl ShipPerformanceModel {
    pub fn new(ship: &Ship) -> Self {
        let capacity = ship.fuel_capacity.clamp(0.0, MAX_FUEL_CAPACITY);
        let steps = (capacity / FUEL_TABLE_STEP + 1e-9).floor() as usize;

        let table: Vec<TableEntry> = (0..=steps)
            .map(|i| {
                let fuel = (i as f64 * FUEL_TABLE_STEP).min(capacity);
                let multiplier = boosted_multiplier(ship, fuel);
                TableEntry {
                    range: raw_range(ship, fuel, multiplier),
                    multiplier,
                }
            })
            .collect();

        let max_range = table.iter().map(|e| e.range).fold(0.0, f64::max);

        Self {
            ship: ship.clone(),
            table,
            max_range,
        }
    }

    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    fn entry(&self, fuel: f64) -> TableEntry {
        let fuel = if fuel.is_finite() {
            fuel.clamp(0.0, self.ship.fuel_capacity.max(0.0))
        } else {
            0.0
        };
        let index = ((fuel / FUEL_TABLE_STEP) + 1e-9).floor() as usize;
        self.table[index.min(self.table.len() - 1)]
    }

    /// Unboosted single-jump range when departing with `fuel` in the tank.
    pub fn jump_range(&self, fuel: f64) -> f64 {
        self.entry(fuel).range
    }

    /// Best single-jump range over the whole tank.
    pub fn max_range(&self) -> f64 {
        self.max_range
    }

    /// Fuel burnt to cover `distance` when departing with `fuel`.
    pub fn fuel_cost(&self, fuel: f64, distance: f64) -> f64 {
        if distance <= 0.0 {
            return 0.0;
        }
        let fuel = fuel.clamp(0.0, self.ship.fuel_capacity.max(0.0));
        let total_mass = self.ship.dry_mass + fuel;
        self.entry(fuel).multiplier
            * (distance * total_mass / self.ship.fsd.optimised_mass).powf(self.ship.fsd.fuel_power)
    }
}

fn raw_range(ship: &Ship, fuel: f64, multiplier: f64) -> f64 {
    let total_mass = ship.dry_mass + fuel;
    let burn = fuel.min(ship.fsd.max_fuel_per_jump);
    if burn <= 0.0 || total_mass <= 0.0 {
        return 0.0;
    }
    (ship.fsd.optimised_mass / total_mass) * (burn / multiplier).powf(1.0 / ship.fsd.fuel_power)
}

fn boosted_multiplier(ship: &Ship, fuel: f64) -> f64 {
    let nominal = ship.fsd.fuel_multiplier;
    let base = raw_range(ship, fuel, nominal);
    if base <= 0.0 || ship.range_bonus <= 0.0 {
        return nominal;
    }
    nominal * (base / (base + ship.range_bonus)).powf(ship.fsd.fuel_power)
}
