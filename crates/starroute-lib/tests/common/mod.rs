//! Common test utilities and fixture helpers.
//!
//! Integration tests build small synthetic star maps in memory (or in a
//! temporary SQLite file) so routes can be checked against hand-computed
//! expectations.

use std::path::PathBuf;
use std::sync::Arc;

use starroute_lib::{
    FsdSpec, InMemoryCatalog, Position, Ship, ShipCatalog, StarSystem, SystemFeatures, SystemId,
};

/// Path to fixtures directory used by tests (ship data).
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Convenience helper to load the "Courier" ship from test fixtures.
#[allow(dead_code)]
pub fn courier_ship() -> Ship {
    let path = fixtures_dir().join("ship_data.csv");
    let catalog = ShipCatalog::from_path(&path).expect("load fixture ship_data.csv");
    catalog
        .get("Courier")
        .expect("Courier ship present in fixtures")
        .clone()
}

/// Ship whose full-tank range is exactly 40 and whose drive burns at most 8.
#[allow(dead_code)]
pub fn test_ship(fuel_capacity: f64, scoop_rate: f64) -> Ship {
    Ship {
        name: "Test".to_string(),
        dry_mass: 936.0,
        fuel_capacity,
        fsd: FsdSpec {
            fuel_power: 2.0,
            fuel_multiplier: 0.02,
            max_fuel_per_jump: 8.0,
            optimised_mass: 2000.0,
        },
        range_bonus: 0.0,
        scoop_rate,
    }
}

#[allow(dead_code)]
pub fn star(id: SystemId, name: &str, x: f64, y: f64, z: f64) -> StarSystem {
    StarSystem::new(id, name, Position::new(x, y, z))
}

#[allow(dead_code)]
pub fn scoopable() -> SystemFeatures {
    SystemFeatures {
        scoopable: Some(0.0),
        ..SystemFeatures::default()
    }
}

#[allow(dead_code)]
pub fn neutron_at(distance: f64) -> SystemFeatures {
    SystemFeatures {
        neutron: Some(distance),
        ..SystemFeatures::default()
    }
}

/// `count` systems named `C0..` spaced `spacing` apart along the x axis.
#[allow(dead_code)]
pub fn corridor(count: usize, spacing: f64, features: SystemFeatures) -> Vec<StarSystem> {
    (0..count)
        .map(|i| {
            star(i as SystemId + 1, &format!("C{i}"), i as f64 * spacing, 0.0, 0.0)
                .with_features(features)
        })
        .collect()
}

#[allow(dead_code)]
pub fn in_memory(systems: Vec<StarSystem>) -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::new(systems).expect("valid synthetic catalog"))
}
