//! starroute library entry points.
//!
//! This crate computes minimal-time jump routes between two star systems.
//! The route graph is implicit: vertices are systems reached with a fuel
//! interval and a boost/refuel context, and edges are generated lazily from
//! proximity queries against a sector-cached star catalog. Callers supply a
//! [`Catalog`] implementation and a [`RunConfig`], then call [`plan_route`].
//!

pub mod catalog;
pub mod config;
pub mod constraints;
pub mod db;
pub mod error;
pub mod refuel;
pub mod routing;
pub mod ship;
pub mod spatial;
pub mod system;

pub use catalog::{resolve_id, resolve_name, Catalog, CatalogView, InMemoryCatalog};
pub use config::{RunConfig, SearchConfig, SystemRef};
pub use constraints::{ConstraintDescriptor, ConstraintSet, EdgeConstraint, RouteGeometry};
pub use db::{write_systems, SqliteCatalog};
pub use error::{Error, Result};
pub use refuel::{Interval, RefuelKind, RefuelProfile};
pub use routing::{
    plan_route, plan_route_with_stores, Edge, Node, NodeHandler, NodeKey, PathStep, Pathfinder,
    RefuelStarFinder, RoutePlan, RouteWaypoint, WaypointQuery,
};
pub use ship::{BoostKind, FsdSpec, JumpTimeModel, Ship, ShipCatalog, ShipPerformanceModel};
pub use spatial::{
    CacheStats, Clock, ManualClock, SectorKey, SpatialStore, SpatialStoreConfig, SpatialStores,
    SystemClock,
};
pub use system::{Position, StarSystem, SystemFeatures, SystemId, PLACEHOLDER_SYSTEM_ID};
