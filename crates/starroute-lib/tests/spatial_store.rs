mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{in_memory, star};
use starroute_lib::{
    Catalog, CatalogView, ManualClock, Position, SectorKey, SpatialStore, SpatialStoreConfig,
    StarSystem, SystemFeatures,
};

fn grid() -> Vec<StarSystem> {
    let mut systems = Vec::new();
    let mut id = 1;
    for x in 0..6 {
        for y in 0..3 {
            systems.push(star(
                id,
                &format!("G{x}-{y}"),
                f64::from(x) * 90.0 + 5.0,
                f64::from(y) * 45.0 + 5.0,
                50.0,
            ));
            id += 1;
        }
    }
    systems
}

fn sorted_ids(systems: &[Arc<StarSystem>]) -> Vec<i64> {
    let mut ids: Vec<i64> = systems.iter().map(|s| s.id).collect();
    ids.sort_unstable();
    ids
}

#[test]
fn cold_and_warm_queries_agree_with_catalog() {
    let catalog = in_memory(grid());
    let store = SpatialStore::new(
        catalog.clone(),
        CatalogView::All,
        SpatialStoreConfig::default(),
    );
    let point = Position::new(140.0, 60.0, 50.0);

    let cold = store.get_neighbors(point, 120.0).expect("cold query");
    let warm = store.get_neighbors(point, 120.0).expect("warm query");
    let mut direct: Vec<i64> = catalog
        .neighbors(point, 120.0, CatalogView::All)
        .expect("direct query")
        .iter()
        .map(|s| s.id)
        .collect();
    direct.sort_unstable();

    assert!(!direct.is_empty());
    assert_eq!(sorted_ids(&cold), direct);
    assert_eq!(sorted_ids(&warm), direct);

    let stats = store.stats();
    assert_eq!(stats.misses as usize, stats.cached_sectors);
    assert_eq!(stats.hits, stats.misses);
    assert_eq!(catalog.load_requests(), 1);
}

#[test]
fn neighbours_are_strictly_inside_radius() {
    let catalog = in_memory(vec![
        star(1, "Origin", 0.0, 0.0, 0.0),
        star(2, "Edge", 10.0, 0.0, 0.0),
        star(3, "Inside", 9.5, 0.0, 0.0),
    ]);
    let store = SpatialStore::new(catalog, CatalogView::All, SpatialStoreConfig::default());

    let found = store
        .get_neighbors(Position::default(), 10.0)
        .expect("query");
    assert_eq!(sorted_ids(&found), vec![1, 3]);
    assert!(store
        .get_neighbors(Position::default(), 0.0)
        .expect("zero radius")
        .is_empty());
}

#[test]
fn views_filter_by_nearby_body() {
    let neutron = SystemFeatures {
        neutron: Some(0.0),
        ..SystemFeatures::default()
    };
    let far_neutron = SystemFeatures {
        neutron: Some(1.0e7),
        ..SystemFeatures::default()
    };
    let catalog = in_memory(vec![
        star(1, "Plain", 0.0, 0.0, 0.0),
        star(2, "Pulsar", 5.0, 0.0, 0.0).with_features(neutron),
        star(3, "Distant", 6.0, 0.0, 0.0).with_features(far_neutron),
    ]);
    let store = SpatialStore::new(
        catalog,
        CatalogView::NeutronOnly,
        SpatialStoreConfig::default(),
    );

    let found = store.get_neighbors(Position::default(), 20.0).expect("query");
    assert_eq!(sorted_ids(&found), vec![2]);
}

#[test]
fn nearest_orders_by_distance() {
    let catalog = in_memory(vec![
        star(1, "Far", 30.0, 0.0, 0.0),
        star(2, "Near", 3.0, 0.0, 0.0),
        star(3, "Mid", 0.0, 12.0, 0.0),
    ]);
    let store = SpatialStore::new(catalog, CatalogView::All, SpatialStoreConfig::default());

    let found = store.nearest(Position::default(), 50.0).expect("query");
    let ids: Vec<i64> = found.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![2, 3, 1]);
}

#[test]
fn idle_sectors_are_evicted_on_next_miss() {
    let catalog = in_memory(vec![
        star(1, "A", 50.0, 50.0, 50.0),
        star(2, "B", 250.0, 50.0, 50.0),
        star(3, "C", 450.0, 50.0, 50.0),
    ]);
    let clock = Arc::new(ManualClock::new());
    let config = SpatialStoreConfig {
        sector_size: 100.0,
        idle_threshold_secs: 3600,
    };
    let store = SpatialStore::with_clock(catalog, CatalogView::All, config, clock.clone());

    store
        .get_neighbors(Position::new(50.0, 50.0, 50.0), 10.0)
        .expect("first");
    clock.advance(Duration::from_secs(1800));
    store
        .get_neighbors(Position::new(250.0, 50.0, 50.0), 10.0)
        .expect("second");
    assert_eq!(store.cached_sectors().len(), 2);

    clock.advance(Duration::from_secs(2000));
    store
        .get_neighbors(Position::new(450.0, 50.0, 50.0), 10.0)
        .expect("third");

    assert_eq!(
        store.cached_sectors(),
        vec![
            SectorKey { x: 2, y: 0, z: 0 },
            SectorKey { x: 4, y: 0, z: 0 },
        ]
    );
}

#[test]
fn touched_sectors_survive_eviction() {
    let catalog = in_memory(vec![
        star(1, "A", 50.0, 50.0, 50.0),
        star(2, "B", 250.0, 50.0, 50.0),
    ]);
    let clock = Arc::new(ManualClock::new());
    let config = SpatialStoreConfig {
        sector_size: 100.0,
        idle_threshold_secs: 60,
    };
    let store = SpatialStore::with_clock(catalog, CatalogView::All, config, clock.clone());
    let home = Position::new(50.0, 50.0, 50.0);

    store.get_neighbors(home, 10.0).expect("load");
    clock.advance(Duration::from_secs(50));
    store.get_neighbors(home, 10.0).expect("hit refreshes");
    clock.advance(Duration::from_secs(50));
    store
        .get_neighbors(Position::new(250.0, 50.0, 50.0), 10.0)
        .expect("miss triggers eviction");

    assert_eq!(store.cached_sectors().len(), 2);
}

#[test]
fn missing_sectors_load_in_one_batch() {
    let catalog = in_memory(vec![
        star(1, "Low", 99.0, 99.0, 99.0),
        star(2, "High", 101.0, 101.0, 101.0),
    ]);
    let store = SpatialStore::new(
        catalog.clone(),
        CatalogView::All,
        SpatialStoreConfig::default(),
    );

    let found = store
        .get_neighbors(Position::new(100.0, 100.0, 100.0), 5.0)
        .expect("query");

    assert_eq!(sorted_ids(&found), vec![1, 2]);
    assert_eq!(store.cached_sectors().len(), 8);
    assert_eq!(store.stats().misses, 8);
    assert_eq!(catalog.load_requests(), 1);
}

#[test]
fn parallel_queries_see_consistent_results() {
    use rayon::prelude::*;

    let catalog = in_memory(grid());
    let store = SpatialStore::new(catalog, CatalogView::All, SpatialStoreConfig::default());
    let point = Position::new(200.0, 50.0, 50.0);
    let expected = sorted_ids(&store.get_neighbors(point, 150.0).expect("baseline"));

    let results: Vec<Vec<i64>> = (0..32)
        .into_par_iter()
        .map(|_| sorted_ids(&store.get_neighbors(point, 150.0).expect("query")))
        .collect();
    assert!(results.iter().all(|ids| *ids == expected));
}
