//! Sector-partitioned proximity cache over a [`Catalog`].
//!
//! Space is cut into cubes of a fixed edge length. A radius query touches
//! every sector overlapping the query's bounding cube: cached sectors are
//! served directly, and all missing sectors are fetched from the catalog in a
//! single batch. Sectors that sit idle longer than the configured threshold
//! are dropped during the next miss.
//!
//! # Concurrency
//!
//! The sector map is an immutable snapshot behind an [`ArcSwap`]. The hit path
//! loads the current snapshot without locking and only updates atomic
//! timestamps and counters, so rayon workers can query in parallel. Miss
//! handling (batch load, insert, eviction) is serialized by a single mutex per
//! store, re-checks the latest snapshot once the mutex is held, and publishes
//! a new snapshot. The catalog is immutable, so a sector evicted while another
//! thread still reads it only costs a reload.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Catalog, CatalogView};
use crate::error::Result;
use crate::system::{Position, StarSystem};

/// Default sector edge length.
pub const DEFAULT_SECTOR_SIZE: f64 = 100.0;

/// Default idle time after which a cached sector is evicted (2 hours).
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(2 * 60 * 60);

/// Grid coordinates of a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorKey {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl SectorKey {
    /// Sector containing `position` for the given edge length.
    pub fn of(position: &Position, sector_size: f64) -> Self {
        Self {
            x: (position.x / sector_size).floor() as i64,
            y: (position.y / sector_size).floor() as i64,
            z: (position.z / sector_size).floor() as i64,
        }
    }

    /// Lowest corner of the sector.
    pub fn origin(&self, sector_size: f64) -> Position {
        Position::new(
            self.x as f64 * sector_size,
            self.y as f64 * sector_size,
            self.z as f64 * sector_size,
        )
    }

    pub(crate) fn min_corner(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    pub(crate) fn max_corner(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }

    /// Every key in the inclusive box spanned by `lo` and `hi`.
    fn span(lo: SectorKey, hi: SectorKey) -> impl Iterator<Item = SectorKey> {
        (lo.x..=hi.x).flat_map(move |x| {
            (lo.y..=hi.y).flat_map(move |y| (lo.z..=hi.z).map(move |z| SectorKey { x, y, z }))
        })
    }
}

/// Millisecond clock used for sector idle tracking.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Monotonic wall clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Tuning for a [`SpatialStore`] instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialStoreConfig {
    /// Sector edge length.
    pub sector_size: f64,
    /// Seconds a sector may stay untouched before eviction.
    pub idle_threshold_secs: u64,
}

impl Default for SpatialStoreConfig {
    fn default() -> Self {
        Self {
            sector_size: DEFAULT_SECTOR_SIZE,
            idle_threshold_secs: DEFAULT_IDLE_THRESHOLD.as_secs(),
        }
    }
}

/// Snapshot of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub cached_sectors: usize,
}

struct Sector {
    systems: Vec<Arc<StarSystem>>,
    last_touched: AtomicU64,
}

impl Sector {
    fn touch(&self, now: u64) {
        self.last_touched.fetch_max(now, Ordering::Relaxed);
    }
}

/// Sector cache answering "systems within `r` of `p`" for one catalog view.
pub struct SpatialStore {
    catalog: Arc<dyn Catalog>,
    view: CatalogView,
    sector_size: f64,
    idle_threshold_ms: u64,
    clock: Arc<dyn Clock>,
    sectors: ArcSwap<HashMap<SectorKey, Arc<Sector>>>,
    miss_lock: Mutex<()>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SpatialStore {
    pub fn new(catalog: Arc<dyn Catalog>, view: CatalogView, config: SpatialStoreConfig) -> Self {
        Self::with_clock(catalog, view, config, Arc::new(SystemClock::default()))
    }

    pub fn with_clock(
        catalog: Arc<dyn Catalog>,
        view: CatalogView,
        config: SpatialStoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sector_size = if config.sector_size.is_finite() && config.sector_size > 0.0 {
            config.sector_size
        } else {
            DEFAULT_SECTOR_SIZE
        };

        Self {
            catalog,
            view,
            sector_size,
            idle_threshold_ms: config.idle_threshold_secs.saturating_mul(1000),
            clock,
            sectors: ArcSwap::from_pointee(HashMap::new()),
            miss_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn view(&self) -> CatalogView {
        self.view
    }

    pub fn sector_size(&self) -> f64 {
        self.sector_size
    }

    /// Systems strictly within `radius` of `point`, in no particular order.
    pub fn get_neighbors(&self, point: Position, radius: f64) -> Result<Vec<Arc<StarSystem>>> {
        if !radius.is_finite() || radius <= 0.0 {
            return Ok(Vec::new());
        }

        let lo = SectorKey::of(&point.offset(-radius), self.sector_size);
        let hi = SectorKey::of(&point.offset(radius), self.sector_size);
        let now = self.clock.now_millis();

        let mut touched: Vec<Arc<Sector>> = Vec::new();
        let mut missing: Vec<SectorKey> = Vec::new();
        {
            let sectors = self.sectors.load();
            for key in SectorKey::span(lo, hi) {
                match sectors.get(&key) {
                    Some(sector) => {
                        sector.touch(now);
                        touched.push(Arc::clone(sector));
                    }
                    None => missing.push(key),
                }
            }
        }
        self.hits.fetch_add(touched.len() as u64, Ordering::Relaxed);

        if !missing.is_empty() {
            touched.extend(self.load_missing(&missing, now)?);
        }

        let squared_radius = radius * radius;
        Ok(touched
            .iter()
            .flat_map(|sector| sector.systems.iter())
            .filter(|system| system.position.distance_squared(&point) < squared_radius)
            .cloned()
            .collect())
    }

    /// Same set as [`get_neighbors`](Self::get_neighbors), closest first.
    pub fn nearest(&self, point: Position, radius: f64) -> Result<Vec<Arc<StarSystem>>> {
        let mut systems = self.get_neighbors(point, radius)?;
        systems.sort_by(|a, b| {
            a.position
                .distance_squared(&point)
                .total_cmp(&b.position.distance_squared(&point))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(systems)
    }

    fn load_missing(&self, keys: &[SectorKey], now: u64) -> Result<Vec<Arc<Sector>>> {
        let _guard = self.miss_lock.lock();

        // Another worker may have loaded some of these while we waited.
        let current = self.sectors.load_full();
        let mut served = Vec::with_capacity(keys.len());
        let mut to_load = Vec::new();
        for key in keys {
            match current.get(key) {
                Some(sector) => {
                    sector.touch(now);
                    served.push(Arc::clone(sector));
                }
                None => to_load.push(*key),
            }
        }
        self.hits.fetch_add(served.len() as u64, Ordering::Relaxed);

        if to_load.is_empty() {
            return Ok(served);
        }

        let loaded = self
            .catalog
            .load_sectors(&to_load, self.sector_size, self.view)?;
        self.misses.fetch_add(to_load.len() as u64, Ordering::Relaxed);

        let mut grouped: HashMap<SectorKey, Vec<Arc<StarSystem>>> =
            to_load.iter().map(|key| (*key, Vec::new())).collect();
        for system in loaded {
            let key = SectorKey::of(&system.position, self.sector_size);
            if let Some(members) = grouped.get_mut(&key) {
                members.push(Arc::new(system));
            }
        }

        let mut sectors = HashMap::clone(&current);
        for (key, systems) in grouped {
            let sector = Arc::new(Sector {
                systems,
                last_touched: AtomicU64::new(now),
            });
            sectors.insert(key, Arc::clone(&sector));
            served.push(sector);
        }

        let before = sectors.len();
        let threshold = self.idle_threshold_ms;
        sectors.retain(|_, sector| {
            now.saturating_sub(sector.last_touched.load(Ordering::Relaxed)) <= threshold
        });

        debug!(
            view = %self.view,
            loaded = to_load.len(),
            evicted = before - sectors.len(),
            cached = sectors.len(),
            "spatial store cache miss"
        );
        self.sectors.store(Arc::new(sectors));

        Ok(served)
    }

    /// Keys of the currently cached sectors, sorted.
    pub fn cached_sectors(&self) -> Vec<SectorKey> {
        let mut keys: Vec<SectorKey> = self.sectors.load().keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cached_sectors: self.sectors.load().len(),
        }
    }
}

impl fmt::Debug for SpatialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpatialStore")
            .field("view", &self.view)
            .field("sector_size", &self.sector_size)
            .field("stats", &self.stats())
            .finish()
    }
}

/// The three store instances used by a route search.
#[derive(Debug, Clone)]
pub struct SpatialStores {
    pub all: Arc<SpatialStore>,
    pub neutron: Arc<SpatialStore>,
    pub scoopable: Arc<SpatialStore>,
}

impl SpatialStores {
    pub fn new(catalog: Arc<dyn Catalog>, config: SpatialStoreConfig) -> Self {
        Self::with_clock(catalog, config, Arc::new(SystemClock::default()))
    }

    pub fn with_clock(
        catalog: Arc<dyn Catalog>,
        config: SpatialStoreConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let build = |view| {
            Arc::new(SpatialStore::with_clock(
                Arc::clone(&catalog),
                view,
                config,
                Arc::clone(&clock),
            ))
        };
        Self {
            all: build(CatalogView::All),
            neutron: build(CatalogView::NeutronOnly),
            scoopable: build(CatalogView::ScoopableOnly),
        }
    }

    pub fn stats(&self) -> Vec<(CatalogView, CacheStats)> {
        vec![
            (CatalogView::All, self.all.stats()),
            (CatalogView::NeutronOnly, self.neutron.stats()),
            (CatalogView::ScoopableOnly, self.scoopable.stats()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sector_key_floors_negative_coordinates() {
        let key = SectorKey::of(&Position::new(-0.5, 99.9, 100.0), 100.0);
        assert_eq!(key, SectorKey { x: -1, y: 0, z: 1 });
    }

    #[test]
    fn span_is_inclusive() {
        let lo = SectorKey { x: -1, y: 0, z: 0 };
        let hi = SectorKey { x: 0, y: 1, z: 0 };
        assert_eq!(SectorKey::span(lo, hi).count(), 4);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(3));
        assert_eq!(clock.now_millis(), 3000);
    }
}
