//! Route-shape constraints pruning candidate destinations and finished edges.
//!
//! Constraints are configured as data ([`ConstraintDescriptor`]) and resolved
//! against the catalog once, before any search work starts. Every constraint
//! takes part in one or both of two checks:
//!
//! - [`ConstraintSet::valid_before`] runs on raw (origin, candidate) pairs and
//!   keeps the branching factor bounded before any edge is built.
//! - [`ConstraintSet::valid_after`] runs on fully built edges.
//!
//! All active constraints are ANDed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{resolve_name, Catalog};
use crate::error::{Error, Result};
use crate::routing::Edge;
use crate::system::{Position, StarSystem, SystemId};

/// Constraint as written in the run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintDescriptor {
    /// Candidates must lie within this angle of the direction to the goal.
    GoalCone { max_angle_deg: f64 },
    /// Candidates must stay within `radius` of the straight start-goal line.
    GuideCylinder { radius: f64 },
    /// Jumps leaving a neutron-capable system must cover at least this much.
    MinNeutronJump { min_distance: f64 },
    /// Systems that must never be used as a destination.
    ExcludeSystems { names: Vec<String> },
    /// Composite edges may not exceed this many jumps.
    MaxJumps { max: u32 },
    /// Arrivals at `system` must keep at least `min_fuel`.
    FuelThreshold { system: String, min_fuel: f64 },
}

impl ConstraintDescriptor {
    /// Resolve names and validate parameters.
    pub fn resolve(&self, catalog: &dyn Catalog) -> Result<EdgeConstraint> {
        match self {
            ConstraintDescriptor::GoalCone { max_angle_deg } => {
                if !(0.0..=180.0).contains(max_angle_deg) {
                    return Err(Error::invalid_config(format!(
                        "goal_cone angle must be within [0, 180], got {max_angle_deg}"
                    )));
                }
                Ok(EdgeConstraint::GoalCone {
                    cos_limit: max_angle_deg.to_radians().cos(),
                })
            }
            ConstraintDescriptor::GuideCylinder { radius } => {
                require_non_negative("guide_cylinder radius", *radius)?;
                Ok(EdgeConstraint::GuideCylinder { radius: *radius })
            }
            ConstraintDescriptor::MinNeutronJump { min_distance } => {
                require_non_negative("min_neutron_jump distance", *min_distance)?;
                Ok(EdgeConstraint::MinNeutronJump {
                    min_distance: *min_distance,
                })
            }
            ConstraintDescriptor::ExcludeSystems { names } => {
                let ids = names
                    .iter()
                    .map(|name| resolve_name(catalog, name).map(|system| system.id))
                    .collect::<Result<HashSet<_>>>()?;
                Ok(EdgeConstraint::ExcludeSystems { ids })
            }
            ConstraintDescriptor::MaxJumps { max } => {
                if *max == 0 {
                    return Err(Error::invalid_config("max_jumps must be at least 1"));
                }
                Ok(EdgeConstraint::MaxJumps { max: *max })
            }
            ConstraintDescriptor::FuelThreshold { system, min_fuel } => {
                require_non_negative("fuel_threshold min_fuel", *min_fuel)?;
                let system = resolve_name(catalog, system)?;
                Ok(EdgeConstraint::FuelThreshold {
                    system: system.id,
                    min_fuel: *min_fuel,
                })
            }
        }
    }
}

fn require_non_negative(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::invalid_config(format!(
            "{field} must be finite and non-negative, got {value}"
        )))
    }
}

/// Resolved constraint ready for evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeConstraint {
    GoalCone { cos_limit: f64 },
    GuideCylinder { radius: f64 },
    MinNeutronJump { min_distance: f64 },
    ExcludeSystems { ids: HashSet<SystemId> },
    MaxJumps { max: u32 },
    FuelThreshold { system: SystemId, min_fuel: f64 },
}

/// Start and goal of the route being planned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteGeometry {
    pub start: Position,
    pub goal: Position,
    pub goal_id: SystemId,
}

impl EdgeConstraint {
    fn valid_before(&self, geometry: &RouteGeometry, from: &StarSystem, to: &StarSystem) -> bool {
        match self {
            EdgeConstraint::GoalCone { cos_limit } => {
                if to.id == geometry.goal_id {
                    return true;
                }
                let heading = to.position.sub(&from.position);
                let goal = geometry.goal.sub(&from.position);
                let (heading_len, goal_len) = (norm(heading), norm(goal));
                if heading_len == 0.0 || goal_len == 0.0 {
                    return true;
                }
                dot(heading, goal) / (heading_len * goal_len) >= *cos_limit
            }
            EdgeConstraint::GuideCylinder { radius } => {
                distance_to_segment(&to.position, &geometry.start, &geometry.goal) <= *radius
            }
            EdgeConstraint::MinNeutronJump { min_distance } => {
                to.id == geometry.goal_id
                    || !from.features.has_neutron()
                    || from.distance_to(to) >= *min_distance
            }
            EdgeConstraint::ExcludeSystems { ids } => !ids.contains(&to.id),
            EdgeConstraint::MaxJumps { .. } | EdgeConstraint::FuelThreshold { .. } => true,
        }
    }

    fn valid_after(&self, edge: &Edge) -> bool {
        match self {
            EdgeConstraint::MaxJumps { max } => edge.jumps <= *max,
            EdgeConstraint::FuelThreshold { system, min_fuel } => {
                edge.to.system.id != *system || edge.to.fuel_min >= *min_fuel
            }
            _ => true,
        }
    }
}

/// All constraints active for a run.
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    geometry: RouteGeometry,
    constraints: Vec<EdgeConstraint>,
}

impl ConstraintSet {
    pub fn new(geometry: RouteGeometry, constraints: Vec<EdgeConstraint>) -> Self {
        Self {
            geometry,
            constraints,
        }
    }

    /// Resolve every descriptor, failing on the first inconsistency.
    pub fn resolve(
        geometry: RouteGeometry,
        descriptors: &[ConstraintDescriptor],
        catalog: &dyn Catalog,
    ) -> Result<Self> {
        let constraints = descriptors
            .iter()
            .map(|descriptor| descriptor.resolve(catalog))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(geometry, constraints))
    }

    pub fn geometry(&self) -> &RouteGeometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn valid_before(&self, from: &StarSystem, to: &StarSystem) -> bool {
        self.constraints
            .iter()
            .all(|c| c.valid_before(&self.geometry, from, to))
    }

    pub fn valid_after(&self, edge: &Edge) -> bool {
        self.constraints.iter().all(|c| c.valid_after(edge))
    }
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: [f64; 3]) -> f64 {
    dot(a, a).sqrt()
}

fn distance_to_segment(point: &Position, start: &Position, end: &Position) -> f64 {
    let segment = end.sub(start);
    let length_sq = dot(segment, segment);
    if length_sq == 0.0 {
        return point.distance_to(start);
    }
    let t = (dot(point.sub(start), segment) / length_sq).clamp(0.0, 1.0);
    point.distance_to(&start.lerp(end, t))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::refuel::RefuelKind;
    use crate::routing::Node;
    use crate::ship::BoostKind;
    use crate::system::SystemFeatures;

    fn geometry() -> RouteGeometry {
        RouteGeometry {
            start: Position::new(0.0, 0.0, 0.0),
            goal: Position::new(100.0, 0.0, 0.0),
            goal_id: 99,
        }
    }

    fn at(id: SystemId, x: f64, y: f64) -> StarSystem {
        StarSystem::new(id, format!("S{id}"), Position::new(x, y, 0.0))
    }

    #[test]
    fn goal_cone_prunes_backward_candidates() {
        let set = ConstraintSet::new(
            geometry(),
            vec![EdgeConstraint::GoalCone {
                cos_limit: 45f64.to_radians().cos(),
            }],
        );
        let origin = at(1, 0.0, 0.0);
        assert!(set.valid_before(&origin, &at(2, 10.0, 5.0)));
        assert!(!set.valid_before(&origin, &at(3, 10.0, 20.0)));
        assert!(!set.valid_before(&origin, &at(4, -10.0, 0.0)));
    }

    #[test]
    fn guide_cylinder_measures_distance_to_segment() {
        let set = ConstraintSet::new(
            geometry(),
            vec![EdgeConstraint::GuideCylinder { radius: 10.0 }],
        );
        let origin = at(1, 0.0, 0.0);
        assert!(set.valid_before(&origin, &at(2, 50.0, 9.0)));
        assert!(!set.valid_before(&origin, &at(3, 50.0, 11.0)));
        assert!(!set.valid_before(&origin, &at(4, 115.0, 0.0)));
    }

    #[test]
    fn min_neutron_jump_only_applies_to_neutron_origins() {
        let set = ConstraintSet::new(
            geometry(),
            vec![EdgeConstraint::MinNeutronJump { min_distance: 30.0 }],
        );
        let plain = at(1, 0.0, 0.0);
        let neutron = at(2, 0.0, 0.0).with_features(SystemFeatures {
            neutron: Some(0.0),
            ..SystemFeatures::default()
        });
        let near = at(3, 10.0, 0.0);
        assert!(set.valid_before(&plain, &near));
        assert!(!set.valid_before(&neutron, &near));
        assert!(set.valid_before(&neutron, &at(4, 40.0, 0.0)));
    }

    #[test]
    fn excluded_systems_are_never_destinations() {
        let set = ConstraintSet::new(
            geometry(),
            vec![EdgeConstraint::ExcludeSystems {
                ids: HashSet::from([7]),
            }],
        );
        assert!(!set.valid_before(&at(1, 0.0, 0.0), &at(7, 5.0, 0.0)));
        assert!(set.valid_before(&at(1, 0.0, 0.0), &at(8, 5.0, 0.0)));
    }

    fn edge_to(to: StarSystem, jumps: u32, fuel_min: f64) -> Edge {
        let from = Node::start(Arc::new(at(1, 0.0, 0.0)), 64.0, 64.0, 99);
        let to = Node {
            system: Arc::new(to),
            fuel_min,
            fuel_max: fuel_min + 4.0,
            boost: BoostKind::None,
            refuel: RefuelKind::Scoop,
            jumps,
            is_goal: false,
        };
        Edge {
            from,
            to,
            cost: 100.0,
            jumps,
            departure_boost: BoostKind::None,
            waypoint: None,
        }
    }

    #[test]
    fn max_jumps_caps_composite_edges() {
        let set = ConstraintSet::new(geometry(), vec![EdgeConstraint::MaxJumps { max: 2 }]);
        assert!(set.valid_after(&edge_to(at(2, 30.0, 0.0), 1, 40.0)));
        assert!(set.valid_after(&edge_to(at(2, 60.0, 0.0), 2, 40.0)));
        assert!(!set.valid_after(&edge_to(at(2, 90.0, 0.0), 3, 40.0)));
        // Only checked after the edge is built.
        assert!(set.valid_before(&at(1, 0.0, 0.0), &at(2, 90.0, 0.0)));
    }

    #[test]
    fn fuel_threshold_applies_to_named_system_at_min_fuel() {
        let set = ConstraintSet::new(
            geometry(),
            vec![EdgeConstraint::FuelThreshold {
                system: 5,
                min_fuel: 20.0,
            }],
        );
        assert!(set.valid_after(&edge_to(at(5, 30.0, 0.0), 1, 20.0)));
        assert!(set.valid_after(&edge_to(at(5, 30.0, 0.0), 1, 35.0)));
        // Max fuel clears the threshold but the min bound does not.
        assert!(!set.valid_after(&edge_to(at(5, 30.0, 0.0), 1, 18.0)));
        assert!(set.valid_after(&edge_to(at(6, 30.0, 0.0), 1, 2.0)));
    }

    #[test]
    fn descriptors_resolve_names_and_reject_bad_parameters() {
        let catalog = crate::catalog::InMemoryCatalog::new(vec![at(5, 30.0, 0.0)])
            .expect("catalog");
        let resolved = ConstraintDescriptor::FuelThreshold {
            system: "S5".to_string(),
            min_fuel: 12.0,
        }
        .resolve(&catalog)
        .expect("known system");
        assert_eq!(
            resolved,
            EdgeConstraint::FuelThreshold {
                system: 5,
                min_fuel: 12.0
            }
        );
        assert!(matches!(
            ConstraintDescriptor::MaxJumps { max: 0 }.resolve(&catalog),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            ConstraintDescriptor::FuelThreshold {
                system: "Nowhere".to_string(),
                min_fuel: 1.0,
            }
            .resolve(&catalog),
            Err(Error::UnknownSystem { .. })
        ));
    }
}
