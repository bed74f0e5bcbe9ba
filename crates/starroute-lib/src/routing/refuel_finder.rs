//! Placement of the scoop stop on two-jump refuel edges.

use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::ship::{BoostKind, ShipPerformanceModel};
use crate::spatial::SpatialStore;
use crate::system::{Position, StarSystem};

/// Radius searched around the ideal waypoint.
pub const WAYPOINT_SEARCH_RADIUS: f64 = 50.0;

const FIRST_LEG_WEIGHT: f64 = 0.25;
const SECOND_LEG_WEIGHT: f64 = 0.75;

/// A two-jump refuel edge awaiting its intermediate stop.
#[derive(Debug, Clone, Copy)]
pub struct WaypointQuery<'a> {
    pub origin: &'a StarSystem,
    pub destination: &'a StarSystem,
    pub first_boost: BoostKind,
    pub second_boost: BoostKind,
    /// Departure fuel bounds of the first leg.
    pub fuel: [f64; 2],
    /// Refuel target bounds, i.e. departure fuel of the second leg.
    pub target: [f64; 2],
}

/// Finds a real scoopable star between two systems, or synthesizes one.
#[derive(Debug, Clone)]
pub struct RefuelStarFinder {
    store: Arc<SpatialStore>,
    performance: Arc<ShipPerformanceModel>,
}

impl RefuelStarFinder {
    /// `store` should be the scoopable-only view.
    pub fn new(store: Arc<SpatialStore>, performance: Arc<ShipPerformanceModel>) -> Self {
        Self { store, performance }
    }

    /// Point between origin and destination where the stop should ideally be.
    pub fn ideal_point(&self, query: &WaypointQuery<'_>) -> Position {
        let from = query.origin.position;
        let to = query.destination.position;
        let distance = query.origin.distance_to(query.destination);
        if distance <= 0.0 {
            return from;
        }

        let first_reach = self.reach(query.first_boost, query.fuel);
        let second_reach = self.reach(query.second_boost, query.target);
        let t1 = first_reach / distance;
        let t2 = (distance - second_reach) / distance;
        let fraction = (FIRST_LEG_WEIGHT * t1 + SECOND_LEG_WEIGHT * t2).clamp(0.0, 1.0);
        from.lerp(&to, fraction)
    }

    /// First scoopable star near the ideal point with both legs feasible.
    ///
    /// Falls back to a placeholder at the ideal point so the route stays
    /// displayable.
    pub fn find(&self, query: &WaypointQuery<'_>) -> Result<Arc<StarSystem>> {
        let ideal = self.ideal_point(query);
        let candidates = self.store.nearest(ideal, WAYPOINT_SEARCH_RADIUS)?;

        let found = candidates.into_iter().find(|candidate| {
            candidate.id != query.origin.id
                && candidate.id != query.destination.id
                && query
                    .fuel
                    .iter()
                    .all(|&fuel| self.leg_feasible(query.origin, candidate, query.first_boost, fuel))
                && query.target.iter().all(|&fuel| {
                    self.leg_feasible(candidate, query.destination, query.second_boost, fuel)
                })
        });

        Ok(match found {
            Some(system) => system,
            None => {
                warn!(
                    origin = %query.origin.name,
                    destination = %query.destination.name,
                    x = ideal.x,
                    y = ideal.y,
                    z = ideal.z,
                    "no scoopable star near ideal refuel point; using placeholder"
                );
                Arc::new(StarSystem::placeholder(ideal))
            }
        })
    }

    /// Whether a jump from `from` to `to` with `fuel` aboard is possible.
    pub fn leg_feasible(
        &self,
        from: &StarSystem,
        to: &StarSystem,
        boost: BoostKind,
        fuel: f64,
    ) -> bool {
        let distance = from.distance_to(to);
        let factor = boost.factor();
        if distance >= factor * self.performance.jump_range(fuel) {
            return false;
        }
        let remaining = fuel - self.performance.fuel_cost(fuel, distance / factor);
        remaining >= self.performance.ship().fuel_floor()
    }

    fn reach(&self, boost: BoostKind, fuel: [f64; 2]) -> f64 {
        fuel.iter()
            .map(|&f| boost.factor() * self.performance.jump_range(f))
            .fold(f64::INFINITY, f64::min)
    }
}
