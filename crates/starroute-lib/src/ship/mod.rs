//! Ship data types, jump-range physics, jump timing and catalog management.
//!
//! This module is organized into focused submodules:
//!
//! - [`attributes`] - Ship and frame shift drive specification
//! - [`boost`] - Range boost kinds
//! - [`performance`] - Tabulated fuel/range model
//! - [`timing`] - Per-jump elapsed time model
//! - [`catalog`] - Ship catalog loading from CSV
//! - [`constants`] - Shared constants used across calculations
//!
//! # Example
//!
//! ```no_run
//! use starroute_lib::ship::{ShipCatalog, ShipPerformanceModel};
//!
//! let catalog = ShipCatalog::from_path(std::path::Path::new("ship_data.csv")).unwrap();
//! let ship = catalog.get("Courier").unwrap();
//! let model = ShipPerformanceModel::new(ship);
//! let range = model.jump_range(ship.fuel_capacity);
//! let cost = model.fuel_cost(ship.fuel_capacity, range / 2.0);
//! ```

pub mod attributes;
pub mod boost;
pub mod catalog;
pub mod constants;
pub mod performance;
pub mod timing;

pub use attributes::{FsdSpec, Ship};
pub use boost::BoostKind;
pub use catalog::ShipCatalog;
pub use performance::ShipPerformanceModel;
pub use timing::{supercruise_time, JumpTimeModel};
