//! Ship catalog loading and management.
//!
//! Ships are described one per CSV row with the drive parameters flattened
//! into columns:
//!
//! ```text
//! name,dry_mass,fuel_capacity,fuel_power,fuel_multiplier,max_fuel_per_jump,optimised_mass,range_bonus,scoop_rate
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use serde::Deserialize;

use crate::error::{Error, Result};

use super::attributes::{FsdSpec, Ship};

#[derive(Debug, Deserialize)]
struct ShipRow {
    name: String,
    dry_mass: f64,
    fuel_capacity: f64,
    fuel_power: f64,
    fuel_multiplier: f64,
    max_fuel_per_jump: f64,
    optimised_mass: f64,
    #[serde(default)]
    range_bonus: f64,
    #[serde(default)]
    scoop_rate: f64,
}

impl From<ShipRow> for Ship {
    fn from(row: ShipRow) -> Self {
        Ship {
            name: row.name.trim().to_string(),
            dry_mass: row.dry_mass,
            fuel_capacity: row.fuel_capacity,
            fsd: FsdSpec {
                fuel_power: row.fuel_power,
                fuel_multiplier: row.fuel_multiplier,
                max_fuel_per_jump: row.max_fuel_per_jump,
                optimised_mass: row.optimised_mass,
            },
            range_bonus: row.range_bonus,
            scoop_rate: row.scoop_rate,
        }
    }
}

/// Collection of ship definitions loaded from a CSV file.
#[derive(Debug, Clone, Default)]
pub struct ShipCatalog {
    ships: HashMap<String, Ship>,
    source: Option<PathBuf>,
}

impl ShipCatalog {
    /// Load a ship catalog from a file path.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut catalog = Self::from_reader(file)?;
        catalog.source = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Load a ship catalog from any CSV reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);

        let mut ships = HashMap::new();
        for record in csv_reader.deserialize::<ShipRow>() {
            let row = record.map_err(|err| Error::ShipDataValidation {
                message: err.to_string(),
            })?;
            let ship = Ship::from(row);
            if ship.name.is_empty() {
                return Err(Error::ShipDataValidation {
                    message: "ship name must not be empty".to_string(),
                });
            }
            ship.validate()?;

            let key = normalize_name(&ship.name);
            if ships.contains_key(&key) {
                return Err(Error::DuplicateShipName { name: key });
            }
            ships.insert(key, ship);
        }

        Ok(Self {
            ships,
            source: None,
        })
    }

    /// Case-insensitive lookup by ship name.
    pub fn get(&self, name: &str) -> Option<&Ship> {
        self.ships.get(&normalize_name(name))
    }

    pub fn ship_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ships.values().map(|s| s.name.clone()).collect();
        names.sort();
        names
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
