//! Catalog collaborators answering system lookups and sector loads.
//!
//! The route search never owns the star catalog. It talks to a [`Catalog`]
//! implementation that can resolve systems by id or name and bulk-load whole
//! sectors for the [`SpatialStore`](crate::spatial::SpatialStore). Two
//! implementations ship with the crate: [`InMemoryCatalog`] for synthetic maps
//! and tests, and [`SqliteCatalog`](crate::db::SqliteCatalog) for persisted
//! catalogs.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use kiddo::float::kdtree::KdTree;
use kiddo::SquaredEuclidean;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::spatial::SectorKey;
use crate::system::{Position, StarSystem, SystemId};

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Minimum similarity for a name to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Independently indexed subsets of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogView {
    All,
    NeutronOnly,
    ScoopableOnly,
}

impl CatalogView {
    pub const ALL: [CatalogView; 3] = [
        CatalogView::All,
        CatalogView::NeutronOnly,
        CatalogView::ScoopableOnly,
    ];

    /// Whether a system belongs to this view.
    pub fn admits(self, system: &StarSystem) -> bool {
        match self {
            CatalogView::All => true,
            CatalogView::NeutronOnly => system.features.has_neutron(),
            CatalogView::ScoopableOnly => system.features.has_scoopable(),
        }
    }
}

impl fmt::Display for CatalogView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            CatalogView::All => "all",
            CatalogView::NeutronOnly => "neutron_only",
            CatalogView::ScoopableOnly => "scoopable_only",
        };
        f.write_str(value)
    }
}

/// Query collaborator backing the route search.
///
/// Implementations must be safe to call from the rayon workers that build
/// candidate edges.
pub trait Catalog: Send + Sync {
    fn system_by_id(&self, id: SystemId) -> Result<Option<StarSystem>>;

    fn system_by_name(&self, name: &str) -> Result<Option<StarSystem>>;

    /// Systems of `view` strictly within `radius` of `point`.
    fn neighbors(&self, point: Position, radius: f64, view: CatalogView)
        -> Result<Vec<StarSystem>>;

    /// All systems of `view` whose coordinates fall inside any of `keys`.
    ///
    /// Called once per cache miss batch, so implementations should answer
    /// with a single round trip.
    fn load_sectors(
        &self,
        keys: &[SectorKey],
        sector_size: f64,
        view: CatalogView,
    ) -> Result<Vec<StarSystem>>;

    /// Names resembling `name`, best first.
    fn suggest_names(&self, _name: &str, _limit: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Resolve a system name, attaching fuzzy suggestions when it is unknown.
pub fn resolve_name(catalog: &dyn Catalog, name: &str) -> Result<StarSystem> {
    match catalog.system_by_name(name)? {
        Some(system) => Ok(system),
        None => Err(Error::UnknownSystem {
            name: name.to_string(),
            suggestions: catalog.suggest_names(name, 3)?,
        }),
    }
}

/// Resolve a system identifier.
pub fn resolve_id(catalog: &dyn Catalog, id: SystemId) -> Result<StarSystem> {
    catalog
        .system_by_id(id)?
        .ok_or(Error::SystemNotFound { id })
}

/// Rank `names` by similarity to `query`, keeping the closest `limit`.
pub(crate) fn rank_suggestions<'a>(
    query: &str,
    names: impl Iterator<Item = &'a str>,
    limit: usize,
) -> Vec<String> {
    let query = query.to_lowercase();
    let mut scored: Vec<(f64, &str)> = names
        .map(|name| (strsim::jaro_winkler(&query, &name.to_lowercase()), name))
        .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}

/// Catalog held entirely in memory.
///
/// Radius queries go through a KD-tree; sector loads scan the system list and
/// are counted so callers can observe batching.
pub struct InMemoryCatalog {
    systems: Vec<StarSystem>,
    by_id: HashMap<SystemId, usize>,
    by_name: HashMap<String, usize>,
    tree: KdTree<f32, usize, 3, BUCKET_SIZE, u32>,
    load_requests: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new(systems: Vec<StarSystem>) -> Result<Self> {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        let mut tree: KdTree<f32, usize, 3, BUCKET_SIZE, u32> = KdTree::new();

        for (index, system) in systems.iter().enumerate() {
            if by_id.insert(system.id, index).is_some() {
                return Err(Error::invalid_config(format!(
                    "duplicate system id {} in catalog",
                    system.id
                )));
            }
            by_name.insert(system.name.clone(), index);
            tree.add(&position_to_coords(&system.position), index);
        }

        debug!(systems = systems.len(), "built in-memory catalog");

        Ok(Self {
            systems,
            by_id,
            by_name,
            tree,
            load_requests: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Number of `load_sectors` calls served so far.
    pub fn load_requests(&self) -> usize {
        self.load_requests.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for InMemoryCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCatalog")
            .field("systems", &self.systems.len())
            .field("load_requests", &self.load_requests())
            .finish()
    }
}

impl Catalog for InMemoryCatalog {
    fn system_by_id(&self, id: SystemId) -> Result<Option<StarSystem>> {
        Ok(self.by_id.get(&id).map(|&i| self.systems[i].clone()))
    }

    fn system_by_name(&self, name: &str) -> Result<Option<StarSystem>> {
        Ok(self.by_name.get(name).map(|&i| self.systems[i].clone()))
    }

    fn neighbors(
        &self,
        point: Position,
        radius: f64,
        view: CatalogView,
    ) -> Result<Vec<StarSystem>> {
        if radius <= 0.0 || self.systems.is_empty() {
            return Ok(Vec::new());
        }

        // The tree stores f32 coordinates; widen the search and re-check in f64.
        let squared_radius = radius * radius;
        let reach = (squared_radius * 1.001 + 1e-3) as f32;
        let results = self
            .tree
            .within::<SquaredEuclidean>(&position_to_coords(&point), reach);

        Ok(results
            .into_iter()
            .map(|neighbor| &self.systems[neighbor.item])
            .filter(|system| system.position.distance_squared(&point) < squared_radius)
            .filter(|system| view.admits(system))
            .cloned()
            .collect())
    }

    fn load_sectors(
        &self,
        keys: &[SectorKey],
        sector_size: f64,
        view: CatalogView,
    ) -> Result<Vec<StarSystem>> {
        self.load_requests.fetch_add(1, Ordering::Relaxed);
        if sector_size <= 0.0 || self.systems.is_empty() {
            return Ok(Vec::new());
        }

        // Each sector is covered by its circumscribed sphere, then members are
        // matched on the exact key so a system is never returned twice.
        let half = sector_size / 2.0;
        let reach = (3.0 * half * half * 1.001 + 1e-3) as f32;
        let wanted: HashSet<SectorKey> = keys.iter().copied().collect();
        let mut loaded = Vec::new();
        for key in &wanted {
            let origin = key.origin(sector_size);
            let centre = Position::new(origin.x + half, origin.y + half, origin.z + half);
            let results = self
                .tree
                .within::<SquaredEuclidean>(&position_to_coords(&centre), reach);
            loaded.extend(
                results
                    .into_iter()
                    .map(|neighbor| &self.systems[neighbor.item])
                    .filter(|system| SectorKey::of(&system.position, sector_size) == *key)
                    .filter(|system| view.admits(system))
                    .cloned(),
            );
        }
        Ok(loaded)
    }

    fn suggest_names(&self, name: &str, limit: usize) -> Result<Vec<String>> {
        Ok(rank_suggestions(
            name,
            self.systems.iter().map(|s| s.name.as_str()),
            limit,
        ))
    }
}

fn position_to_coords(pos: &Position) -> [f32; 3] {
    [pos.x as f32, pos.y as f32, pos.z as f32]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::SystemFeatures;

    fn sample() -> InMemoryCatalog {
        InMemoryCatalog::new(vec![
            StarSystem::new(1, "Alpha", Position::new(0.0, 0.0, 0.0)),
            StarSystem::new(2, "Beta", Position::new(5.0, 0.0, 0.0)).with_features(
                SystemFeatures {
                    neutron: Some(0.0),
                    ..SystemFeatures::default()
                },
            ),
            StarSystem::new(3, "Gamma", Position::new(15.0, 0.0, 0.0)),
        ])
        .expect("valid catalog")
    }

    #[test]
    fn neighbors_respect_radius_and_view() {
        let catalog = sample();
        let all = catalog
            .neighbors(Position::default(), 10.0, CatalogView::All)
            .unwrap();
        let mut ids: Vec<_> = all.iter().map(|s| s.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);

        let neutron = catalog
            .neighbors(Position::default(), 20.0, CatalogView::NeutronOnly)
            .unwrap();
        assert_eq!(neutron.len(), 1);
        assert_eq!(neutron[0].id, 2);
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        let catalog = sample();
        let hits = catalog
            .neighbors(Position::default(), 5.0, CatalogView::All)
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn sector_loads_match_a_full_scan() {
        let systems: Vec<StarSystem> = (0..400i64)
            .map(|i| {
                let x = (i % 20) as f64 * 7.3 - 60.0;
                let y = ((i / 20) % 20) as f64 * 5.1 - 40.0;
                let z = (i as f64 * 0.37).sin() * 30.0;
                let system = StarSystem::new(i + 1, format!("S{i}"), Position::new(x, y, z));
                if i % 3 == 0 {
                    system.with_features(SystemFeatures {
                        neutron: Some(0.0),
                        ..SystemFeatures::default()
                    })
                } else {
                    system
                }
            })
            .collect();
        let catalog = InMemoryCatalog::new(systems.clone()).expect("valid catalog");
        let sector_size = 16.0;
        let keys = [
            SectorKey { x: 0, y: 0, z: 0 },
            SectorKey { x: -1, y: 0, z: 0 },
            SectorKey { x: -4, y: -3, z: -2 },
            SectorKey { x: 3, y: 2, z: 1 },
            SectorKey { x: 40, y: 40, z: 40 },
        ];

        for view in [CatalogView::All, CatalogView::NeutronOnly] {
            let mut loaded: Vec<SystemId> = catalog
                .load_sectors(&keys, sector_size, view)
                .unwrap()
                .iter()
                .map(|s| s.id)
                .collect();
            loaded.sort_unstable();

            let mut scanned: Vec<SystemId> = systems
                .iter()
                .filter(|s| view.admits(s))
                .filter(|s| keys.contains(&SectorKey::of(&s.position, sector_size)))
                .map(|s| s.id)
                .collect();
            scanned.sort_unstable();

            assert!(!scanned.is_empty());
            assert_eq!(loaded, scanned);
        }
        assert_eq!(catalog.load_requests(), 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = InMemoryCatalog::new(vec![
            StarSystem::new(1, "A", Position::default()),
            StarSystem::new(1, "B", Position::default()),
        ]);
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn unknown_name_carries_suggestions() {
        let catalog = sample();
        let error = resolve_name(&catalog, "Alpah").expect_err("unknown");
        match error {
            Error::UnknownSystem { suggestions, .. } => {
                assert_eq!(suggestions.first().map(String::as_str), Some("Alpha"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
