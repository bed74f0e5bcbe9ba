//! Star system records served by the catalog.

use serde::{Deserialize, Serialize};

/// Numeric identifier for a star system.
pub type SystemId = i64;

/// Identifier reserved for synthesized refuel waypoints.
pub const PLACEHOLDER_SYSTEM_ID: SystemId = -1;

/// Nearby bodies further than this are ignored for boosting and refuelling.
pub const NEARBY_BODY_RANGE: f64 = 100.0;

/// Cartesian coordinates for a star system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Calculate the Euclidean distance to another position.
    pub fn distance_to(&self, other: &Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    pub fn distance_squared(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Point at fraction `t` along the segment from `self` to `other`.
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    pub(crate) fn offset(&self, delta: f64) -> Self {
        Self {
            x: self.x + delta,
            y: self.y + delta,
            z: self.z + delta,
        }
    }

    pub(crate) fn sub(&self, other: &Self) -> [f64; 3] {
        [self.x - other.x, self.y - other.y, self.z - other.z]
    }
}

/// Distances to notable bodies near the arrival star.
///
/// `None` means the body is absent; `Some(0.0)` means it is the arrival star
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemFeatures {
    pub neutron: Option<f64>,
    pub scoopable: Option<f64>,
    pub station: Option<f64>,
    pub white_dwarf: Option<f64>,
}

impl SystemFeatures {
    pub fn has_neutron(&self) -> bool {
        within_range(self.neutron)
    }

    pub fn has_scoopable(&self) -> bool {
        within_range(self.scoopable)
    }

    pub fn has_station(&self) -> bool {
        within_range(self.station)
    }

    pub fn has_white_dwarf(&self) -> bool {
        within_range(self.white_dwarf)
    }
}

fn within_range(distance: Option<f64>) -> bool {
    distance.is_some_and(|d| d <= NEARBY_BODY_RANGE)
}

/// Star system as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSystem {
    pub id: SystemId,
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub features: SystemFeatures,
}

impl StarSystem {
    pub fn new(id: SystemId, name: impl Into<String>, position: Position) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            features: SystemFeatures::default(),
        }
    }

    pub fn with_features(mut self, features: SystemFeatures) -> Self {
        self.features = features;
        self
    }

    /// Synthesized stand-in for a refuel stop that has no catalog match.
    ///
    /// Carries a virtual scoopable body so the route stays displayable.
    pub fn placeholder(position: Position) -> Self {
        Self {
            id: PLACEHOLDER_SYSTEM_ID,
            name: "<refuel waypoint>".to_string(),
            position,
            features: SystemFeatures {
                scoopable: Some(0.0),
                ..SystemFeatures::default()
            },
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id == PLACEHOLDER_SYSTEM_ID
    }

    pub fn distance_to(&self, other: &StarSystem) -> f64 {
        self.position.distance_to(&other.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distant_bodies_are_ignored() {
        let features = SystemFeatures {
            neutron: Some(250.0),
            scoopable: Some(0.0),
            station: None,
            white_dwarf: Some(100.0),
        };
        assert!(!features.has_neutron());
        assert!(features.has_scoopable());
        assert!(!features.has_station());
        assert!(features.has_white_dwarf());
    }

    #[test]
    fn placeholder_is_scoopable_and_flagged() {
        let waypoint = StarSystem::placeholder(Position::new(1.0, 2.0, 3.0));
        assert!(waypoint.is_placeholder());
        assert!(waypoint.features.has_scoopable());
        assert_eq!(waypoint.position, Position::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn lerp_walks_the_segment() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(10.0, -10.0, 4.0);
        assert_eq!(a.lerp(&b, 0.5), Position::new(5.0, -5.0, 2.0));
        assert_eq!(a.lerp(&b, 1.0), b);
    }
}
