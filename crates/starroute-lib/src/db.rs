//! SQLite-backed star catalog.
//!
//! The catalog lives in a single `systems` table:
//!
//! ```sql
//! CREATE TABLE systems (
//!     id INTEGER PRIMARY KEY,
//!     name TEXT NOT NULL UNIQUE,
//!     x REAL NOT NULL, y REAL NOT NULL, z REAL NOT NULL,
//!     neutron_distance REAL,
//!     scoopable_distance REAL,
//!     station_distance REAL,
//!     white_dwarf_distance REAL
//! );
//! ```
//!
//! A `NULL` distance means the body is absent.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use crate::catalog::{rank_suggestions, Catalog, CatalogView};
use crate::error::{Error, Result};
use crate::spatial::SectorKey;
use crate::system::{Position, StarSystem, SystemFeatures, SystemId, NEARBY_BODY_RANGE};

const SYSTEMS_TABLE: &str = "systems";

const REQUIRED_COLUMNS: [&str; 9] = [
    "id",
    "name",
    "x",
    "y",
    "z",
    "neutron_distance",
    "scoopable_distance",
    "station_distance",
    "white_dwarf_distance",
];

const SELECT_SYSTEM: &str = "SELECT id, name, x, y, z, neutron_distance, scoopable_distance, \
     station_distance, white_dwarf_distance FROM systems";

/// Catalog answering queries from a SQLite database.
pub struct SqliteCatalog {
    connection: Mutex<Connection>,
}

impl SqliteCatalog {
    /// Open an existing catalog database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let connection = Connection::open(path)?;
        debug!(path = %path.display(), "opening sqlite catalog");
        Self::from_connection(connection)
    }

    /// Wrap an already open connection after checking its schema.
    pub fn from_connection(connection: Connection) -> Result<Self> {
        if !table_exists(&connection, SYSTEMS_TABLE)?
            || !table_has_columns(&connection, SYSTEMS_TABLE, &REQUIRED_COLUMNS)?
        {
            return Err(Error::UnsupportedSchema {
                table: SYSTEMS_TABLE.to_string(),
            });
        }
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Number of systems in the catalog.
    pub fn len(&self) -> Result<usize> {
        let connection = self.connection.lock();
        let count: i64 = connection.query_row("SELECT COUNT(*) FROM systems", [], |row| {
            row.get(0)
        })?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn query_box(&self, lo: Position, hi: Position, view: CatalogView) -> Result<Vec<StarSystem>> {
        let sql = format!(
            "{SELECT_SYSTEM} WHERE x >= ?1 AND x < ?2 AND y >= ?3 AND y < ?4 AND z >= ?5 AND z < ?6{}",
            view_clause(view)
        );
        let connection = self.connection.lock();
        let mut stmt = connection.prepare_cached(&sql)?;
        let rows = stmt.query_map(
            params![lo.x, hi.x, lo.y, hi.y, lo.z, hi.z],
            row_to_system,
        )?;

        let mut systems = Vec::new();
        for entry in rows {
            systems.push(entry?);
        }
        Ok(systems)
    }
}

impl fmt::Debug for SqliteCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCatalog").finish_non_exhaustive()
    }
}

impl Catalog for SqliteCatalog {
    fn system_by_id(&self, id: SystemId) -> Result<Option<StarSystem>> {
        let connection = self.connection.lock();
        let mut stmt = connection.prepare_cached(&format!("{SELECT_SYSTEM} WHERE id = ?1"))?;
        Ok(stmt.query_row([id], row_to_system).optional()?)
    }

    fn system_by_name(&self, name: &str) -> Result<Option<StarSystem>> {
        let connection = self.connection.lock();
        let mut stmt = connection.prepare_cached(&format!("{SELECT_SYSTEM} WHERE name = ?1"))?;
        Ok(stmt.query_row([name], row_to_system).optional()?)
    }

    fn neighbors(
        &self,
        point: Position,
        radius: f64,
        view: CatalogView,
    ) -> Result<Vec<StarSystem>> {
        if radius <= 0.0 {
            return Ok(Vec::new());
        }
        let squared_radius = radius * radius;
        let candidates = self.query_box(point.offset(-radius), point.offset(radius), view)?;
        Ok(candidates
            .into_iter()
            .filter(|system| system.position.distance_squared(&point) < squared_radius)
            .collect())
    }

    fn load_sectors(
        &self,
        keys: &[SectorKey],
        sector_size: f64,
        view: CatalogView,
    ) -> Result<Vec<StarSystem>> {
        let (Some(lo), Some(hi)) = (
            keys.iter().copied().reduce(SectorKey::min_corner),
            keys.iter().copied().reduce(SectorKey::max_corner),
        ) else {
            return Ok(Vec::new());
        };

        let upper = SectorKey {
            x: hi.x + 1,
            y: hi.y + 1,
            z: hi.z + 1,
        };
        let wanted: HashSet<SectorKey> = keys.iter().copied().collect();
        let systems = self.query_box(lo.origin(sector_size), upper.origin(sector_size), view)?;
        debug!(
            sectors = keys.len(),
            rows = systems.len(),
            view = %view,
            "loaded sectors from sqlite catalog"
        );
        Ok(systems
            .into_iter()
            .filter(|system| wanted.contains(&SectorKey::of(&system.position, sector_size)))
            .collect())
    }

    fn suggest_names(&self, name: &str, limit: usize) -> Result<Vec<String>> {
        let connection = self.connection.lock();
        let mut stmt = connection.prepare_cached("SELECT name FROM systems")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut names = Vec::new();
        for entry in rows {
            names.push(entry?);
        }
        Ok(rank_suggestions(
            name,
            names.iter().map(String::as_str),
            limit,
        ))
    }
}

/// Create the `systems` table if needed and insert `systems` in one transaction.
pub fn write_systems(connection: &Connection, systems: &[StarSystem]) -> Result<()> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS systems (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            x REAL NOT NULL,
            y REAL NOT NULL,
            z REAL NOT NULL,
            neutron_distance REAL,
            scoopable_distance REAL,
            station_distance REAL,
            white_dwarf_distance REAL
        );
        CREATE INDEX IF NOT EXISTS systems_x ON systems (x);",
    )?;

    let tx = connection.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO systems (id, name, x, y, z, neutron_distance, scoopable_distance, \
             station_distance, white_dwarf_distance) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for system in systems {
            let features = &system.features;
            stmt.execute(params![
                system.id,
                system.name,
                system.position.x,
                system.position.y,
                system.position.z,
                features.neutron,
                features.scoopable,
                features.station,
                features.white_dwarf,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn view_clause(view: CatalogView) -> String {
    match view {
        CatalogView::All => String::new(),
        CatalogView::NeutronOnly => {
            format!(" AND neutron_distance IS NOT NULL AND neutron_distance <= {NEARBY_BODY_RANGE:?}")
        }
        CatalogView::ScoopableOnly => format!(
            " AND scoopable_distance IS NOT NULL AND scoopable_distance <= {NEARBY_BODY_RANGE:?}"
        ),
    }
}

fn row_to_system(row: &Row<'_>) -> rusqlite::Result<StarSystem> {
    Ok(StarSystem {
        id: row.get(0)?,
        name: row.get(1)?,
        position: Position::new(row.get(2)?, row.get(3)?, row.get(4)?),
        features: SystemFeatures {
            neutron: row.get(5)?,
            scoopable: row.get(6)?,
            station: row.get(7)?,
            white_dwarf: row.get(8)?,
        },
    })
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.push(name);
    }

    Ok(required.iter().all(|required| {
        columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(required))
    }))
}
