//! Search vertices and edges of the implicit route graph.

use std::sync::Arc;

use serde::Serialize;

use crate::refuel::RefuelKind;
use crate::ship::BoostKind;
use crate::system::{StarSystem, SystemId};

/// Fuel buckets per unit of `sqrt(fuel)`.
const FUEL_BUCKETS_PER_ROOT: f64 = 4.0;

/// Search vertex: a system reached with a fuel interval and a boost/refuel context.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub system: Arc<StarSystem>,
    pub fuel_min: f64,
    pub fuel_max: f64,
    /// Boost used on the jump that arrived here.
    pub boost: BoostKind,
    /// Refuel performed before the jump that arrived here.
    pub refuel: RefuelKind,
    /// Jump count of the arriving edge (0 for start vertices).
    pub jumps: u32,
    pub is_goal: bool,
}

impl Node {
    /// Start vertex holding `[fuel_min, fuel_max]` in the tank.
    pub fn start(system: Arc<StarSystem>, fuel_min: f64, fuel_max: f64, goal: SystemId) -> Self {
        let is_goal = system.id == goal;
        Self {
            system,
            fuel_min,
            fuel_max,
            boost: BoostKind::None,
            refuel: RefuelKind::Initial,
            jumps: 0,
            is_goal,
        }
    }

    pub fn is_start(&self) -> bool {
        self.refuel == RefuelKind::Initial
    }

    pub fn average_fuel(&self) -> f64 {
        (self.fuel_min + self.fuel_max) / 2.0
    }

    pub fn key(&self) -> NodeKey {
        NodeKey {
            system_id: self.system.id,
            fuel_bucket: fuel_bucket(self.average_fuel()),
            boost: self.boost,
            refuel: self.refuel,
        }
    }
}

/// Identity of a search vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeKey {
    pub system_id: SystemId,
    pub fuel_bucket: u32,
    pub boost: BoostKind,
    pub refuel: RefuelKind,
}

/// Quantize a fuel level; buckets are narrower near an empty tank.
pub fn fuel_bucket(fuel: f64) -> u32 {
    if !fuel.is_finite() || fuel <= 0.0 {
        return 0;
    }
    (fuel.sqrt() * FUEL_BUCKETS_PER_ROOT).floor() as u32
}

/// Edge between two search vertices. Cost is elapsed time in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: Node,
    pub to: Node,
    pub cost: f64,
    pub jumps: u32,
    /// Boost used on the first leg of the edge.
    pub departure_boost: BoostKind,
    /// Refuel stop between the two legs of a two-jump edge.
    pub waypoint: Option<RefuelStop>,
}

/// Scoop star visited partway along a two-jump edge.
#[derive(Debug, Clone, PartialEq)]
pub struct RefuelStop {
    pub system: Arc<StarSystem>,
    /// Time from the edge's departure until arrival at the stop.
    pub elapsed: f64,
}

impl Edge {
    pub fn is_multi_jump(&self) -> bool {
        self.jumps > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::Position;

    fn node(fuel_min: f64, fuel_max: f64) -> Node {
        let system = Arc::new(StarSystem::new(1, "A", Position::default()));
        Node::start(system, fuel_min, fuel_max, 2)
    }

    #[test]
    fn buckets_are_finer_near_empty_tank() {
        assert_eq!(fuel_bucket(0.0), 0);
        assert_eq!(fuel_bucket(1.0), 4);
        assert_ne!(fuel_bucket(1.0), fuel_bucket(2.0));
        assert_eq!(fuel_bucket(57.0), fuel_bucket(58.0));
        assert_eq!(fuel_bucket(f64::NAN), 0);
    }

    #[test]
    fn key_uses_average_fuel() {
        assert_eq!(node(30.0, 34.0).key(), node(32.0, 32.0).key());
        assert_ne!(node(2.0, 2.0).key(), node(32.0, 32.0).key());
    }

    #[test]
    fn start_vertices_are_marked() {
        let start = node(10.0, 10.0);
        assert!(start.is_start());
        assert!(!start.is_goal);
        assert_eq!(start.jumps, 0);
    }
}
