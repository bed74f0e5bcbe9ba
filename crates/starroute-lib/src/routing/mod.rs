//! Route planning over the implicit jump graph.
//!
//! This module provides:
//! - [`NodeHandler`] - Lazy edge generation for search vertices
//! - [`RefuelStarFinder`] - Scoop stop placement for two-jump refuel edges
//! - [`Pathfinder`] - A* driver with lazy stale-entry skipping
//! - [`RoutePlan`] - Planned route result
//! - [`plan_route`] - Main entry point for computing routes
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use starroute_lib::{plan_route, RunConfig, SqliteCatalog};
//!
//! let catalog = Arc::new(SqliteCatalog::open("systems.db")?);
//! let config = RunConfig::from_path("run.json".as_ref())?;
//! let plan = plan_route(catalog, &config)?;
//! println!("{} jumps in {:.0} s", plan.jumps, plan.total_time);
//! ```

mod handler;
mod node;
mod pathfinder;
mod refuel_finder;

pub use handler::{HandlerOptions, NodeHandler};
pub use node::{fuel_bucket, Edge, Node, NodeKey, RefuelStop};
pub use pathfinder::{PathStep, Pathfinder, SearchOutcome, SearchStats};
pub use refuel_finder::{RefuelStarFinder, WaypointQuery, WAYPOINT_SEARCH_RADIUS};

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::catalog::{Catalog, CatalogView};
use crate::config::RunConfig;
use crate::constraints::{ConstraintSet, RouteGeometry};
use crate::error::{Error, Result};
use crate::refuel::{Interval, RefuelKind};
use crate::ship::{BoostKind, ShipPerformanceModel};
use crate::spatial::{CacheStats, SpatialStores};
use crate::system::{Position, StarSystem, SystemId};

/// One stop of a planned route.
///
/// `boost` and `refuel` describe the jump that arrived here; a refuel is
/// performed at the previous stop before that jump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteWaypoint {
    pub system_id: SystemId,
    pub name: String,
    pub position: Position,
    pub boost: BoostKind,
    pub refuel: RefuelKind,
    /// Fuel interval on arrival; `None` for intermediate refuel stops.
    pub fuel: Option<Interval<f64>>,
    /// Elapsed seconds since departure.
    pub time: f64,
    /// Synthesized stop with no catalog counterpart.
    pub placeholder: bool,
}

impl RouteWaypoint {
    fn new(system: &StarSystem, boost: BoostKind, refuel: RefuelKind, time: f64) -> Self {
        Self {
            system_id: system.id,
            name: system.name.clone(),
            position: system.position,
            boost,
            refuel,
            fuel: None,
            time,
            placeholder: system.is_placeholder(),
        }
    }
}

/// Planned route returned by the library.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    pub waypoints: Vec<RouteWaypoint>,
    pub total_time: f64,
    pub jumps: u32,
    pub cache: Vec<(CatalogView, CacheStats)>,
    pub search: SearchStats,
}

impl RoutePlan {
    /// Number of waypoints with no catalog counterpart.
    pub fn placeholder_count(&self) -> usize {
        self.waypoints.iter().filter(|w| w.placeholder).count()
    }
}

/// Compute a minimal-time route for `config` against `catalog`.
pub fn plan_route(catalog: Arc<dyn Catalog>, config: &RunConfig) -> Result<RoutePlan> {
    let stores = SpatialStores::new(Arc::clone(&catalog), config.spatial);
    plan_route_with_stores(catalog, config, stores)
}

/// Like [`plan_route`], reusing caller-owned spatial stores.
pub fn plan_route_with_stores(
    catalog: Arc<dyn Catalog>,
    config: &RunConfig,
    stores: SpatialStores,
) -> Result<RoutePlan> {
    config.validate()?;
    let start = Arc::new(config.start.resolve(catalog.as_ref())?);
    let goal = Arc::new(config.goal.resolve(catalog.as_ref())?);

    let geometry = RouteGeometry {
        start: start.position,
        goal: goal.position,
        goal_id: goal.id,
    };
    let constraints = ConstraintSet::resolve(geometry, &config.constraints, catalog.as_ref())?;

    let performance = Arc::new(ShipPerformanceModel::new(&config.ship));
    if performance.max_range() <= 0.0 {
        warn!(
            fuel_capacity = config.ship.fuel_capacity,
            "ship cannot jump with any fuel level"
        );
    }

    let handler = NodeHandler::new(
        stores,
        Arc::clone(&performance),
        constraints,
        config.edge_profiles(),
        Arc::clone(&goal),
        HandlerOptions {
            synthesis: config.synthesis,
            refuel_waypoints: config.refuel_waypoints,
            search: config.search.clone(),
        },
    );

    let mut starts: Vec<Node> = config
        .initial_profiles()
        .map(|profile| {
            Node::start(
                Arc::clone(&start),
                profile.fuel.min,
                profile.fuel.max,
                goal.id,
            )
        })
        .collect();
    if starts.is_empty() {
        let full = config.ship.fuel_capacity;
        starts.push(Node::start(Arc::clone(&start), full, full, goal.id));
    }

    info!(
        start = %start.name,
        goal = %goal.name,
        distance = start.distance_to(&goal),
        max_range = performance.max_range(),
        "planning route"
    );

    let outcome = Pathfinder::new(&handler).search(starts)?;
    if outcome.path.is_empty() {
        info!(expanded = outcome.stats.expanded, "no route found");
        return Err(Error::RouteNotFound {
            start: start.name.clone(),
            goal: goal.name.clone(),
        });
    }

    let plan = build_plan(&outcome, handler.stores());
    info!(
        jumps = plan.jumps,
        total_time = plan.total_time,
        waypoints = plan.waypoints.len(),
        placeholders = plan.placeholder_count(),
        expanded = outcome.stats.expanded,
        "route planned"
    );
    Ok(plan)
}

fn build_plan(outcome: &SearchOutcome, stores: &SpatialStores) -> RoutePlan {
    let mut waypoints = Vec::with_capacity(outcome.path.len());
    let mut jumps = 0;
    let mut departed = 0.0;

    for step in &outcome.path {
        if let Some(edge) = &step.edge {
            if let Some(stop) = &edge.waypoint {
                waypoints.push(RouteWaypoint::new(
                    &stop.system,
                    edge.departure_boost,
                    RefuelKind::None,
                    departed + stop.elapsed,
                ));
            }
        }

        let node = &step.node;
        let mut waypoint = RouteWaypoint::new(&node.system, node.boost, node.refuel, step.time);
        waypoint.fuel = Some(Interval::new(node.fuel_min, node.fuel_max));
        waypoints.push(waypoint);

        jumps += step.edge.as_ref().map_or(0, |edge| edge.jumps);
        departed = step.time;
    }

    RoutePlan {
        total_time: departed,
        waypoints,
        jumps,
        cache: stores.stats(),
        search: outcome.stats,
    }
}
