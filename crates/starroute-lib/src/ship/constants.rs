//! Ship-related constants used across range, fuel and timing calculations.

/// Fuel step between precomputed jump-range table entries.
pub const FUEL_TABLE_STEP: f64 = 0.01;

/// Largest tank the range table is built for.
pub const MAX_FUEL_CAPACITY: f64 = 10_000.0;

/// Fraction of `max_fuel_per_jump` a ship must keep after any jump.
pub const FUEL_FLOOR_DIVISOR: f64 = 16.0;

/// Seconds spent in witch-space for any jump.
pub const WITCH_SPACE_TIME: f64 = 15.0;

/// Seconds needed to charge the frame shift drive.
pub const FSD_CHARGE_TIME: f64 = 15.0;

/// Seconds the drive needs to cool down after a jump.
pub const FSD_COOLDOWN_TIME: f64 = 10.0;

/// Extra handling for a synthesis boost (opening the synthesis panel).
pub const SYNTHESIS_OVERHEAD: f64 = 15.0;

/// Extra handling for a neutron boost (aligning with and leaving the cone).
pub const NEUTRON_OVERHEAD: f64 = 20.0;

/// Extra handling for a white dwarf boost (slower, hotter cone approach).
pub const WHITE_DWARF_OVERHEAD: f64 = 30.0;

/// Supercruise floor for any body at least one unit away.
pub const SUPERCRUISE_MIN_TIME: f64 = 30.0;

/// Logarithmic supercruise coefficient.
pub const SUPERCRUISE_LOG_FACTOR: f64 = 40.0;

/// Supercruise time when the body is (nearly) the arrival star.
pub const SUPERCRUISE_ZERO_DISTANCE_TIME: f64 = 10.0;

/// Scooping shorter than this overlaps with other activity; longer scoops
/// need a fresh FSD charge afterwards.
pub const PARALLEL_ACTIVITY_BUDGET: f64 = 20.0;

/// Scoop rate multiplier when a heatsink lets the ship skim closer.
pub const HEATSINK_SCOOP_FACTOR: f64 = 1.5;

/// Seconds to deploy a heatsink.
pub const HEATSINK_DEPLOY_TIME: f64 = 5.0;

/// Seconds to dock, refuel and launch at a station.
pub const STATION_REFUEL_TIME: f64 = 120.0;
