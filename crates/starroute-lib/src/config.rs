//! Run configuration for a single route computation.
//!
//! Configurations are plain serde structs read from JSON. Tuning sections
//! fall back to their [`Default`] impls when omitted:
//!
//! ```json
//! {
//!   "ship": { "dry_mass": 936.0, "fuel_capacity": 64.0, "scoop_rate": 1.2,
//!             "fsd": { "fuel_power": 2.0, "fuel_multiplier": 0.02,
//!                      "max_fuel_per_jump": 8.0, "optimised_mass": 2000.0 } },
//!   "start": "Sol",
//!   "goal": 42,
//!   "refuel_profiles": [ { "kind": "scoop", "fuel": { "min": 32.0, "max": 64.0 } } ],
//!   "constraints": [ { "kind": "goal_cone", "max_angle_deg": 60.0 } ],
//!   "synthesis": true
//! }
//! ```

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{resolve_id, resolve_name, Catalog};
use crate::constraints::ConstraintDescriptor;
use crate::error::{Error, Result};
use crate::refuel::{RefuelKind, RefuelProfile};
use crate::ship::Ship;
use crate::spatial::SpatialStoreConfig;
use crate::system::{StarSystem, SystemId};

/// Reference to a catalog system by name or numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SystemRef {
    Id(SystemId),
    Name(String),
}

impl SystemRef {
    pub fn resolve(&self, catalog: &dyn Catalog) -> Result<StarSystem> {
        match self {
            SystemRef::Id(id) => resolve_id(catalog, *id),
            SystemRef::Name(name) => resolve_name(catalog, name),
        }
    }
}

impl From<&str> for SystemRef {
    fn from(name: &str) -> Self {
        SystemRef::Name(name.to_string())
    }
}

impl From<SystemId> for SystemRef {
    fn from(id: SystemId) -> Self {
        SystemRef::Id(id)
    }
}

impl fmt::Display for SystemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemRef::Id(id) => write!(f, "#{id}"),
            SystemRef::Name(name) => f.write_str(name),
        }
    }
}

/// Candidate generation tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Grow the search radius while fewer candidates than this are found.
    pub min_candidates: usize,
    /// Sample down to this many candidates per origin system.
    pub max_candidates: usize,
    /// Radius multiplier applied per growth step.
    pub radius_growth: f64,
    /// Radius growth stops at this multiple of the initial radius.
    pub max_radius_factor: f64,
    /// Seed for candidate sampling.
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_candidates: 12,
            max_candidates: 200,
            radius_growth: 1.5,
            max_radius_factor: 4.0,
            seed: 0,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_candidates == 0 {
            return Err(Error::invalid_config("max_candidates must be at least 1"));
        }
        if !(self.radius_growth.is_finite() && self.radius_growth > 1.0) {
            return Err(Error::invalid_config(format!(
                "radius_growth must be greater than 1, got {}",
                self.radius_growth
            )));
        }
        if !(self.max_radius_factor.is_finite() && self.max_radius_factor >= 1.0) {
            return Err(Error::invalid_config(format!(
                "max_radius_factor must be at least 1, got {}",
                self.max_radius_factor
            )));
        }
        if self.min_candidates > self.max_candidates {
            warn!(
                min = self.min_candidates,
                max = self.max_candidates,
                "min_candidates exceeds max_candidates; sampling will cap growth"
            );
        }
        Ok(())
    }
}

/// Everything a single route computation needs besides the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub ship: Ship,
    pub start: SystemRef,
    pub goal: SystemRef,
    /// Ordered refuel profiles; `initial` entries seed the search.
    #[serde(default)]
    pub refuel_profiles: Vec<RefuelProfile>,
    #[serde(default)]
    pub constraints: Vec<ConstraintDescriptor>,
    /// Allow synthesis range boosts anywhere.
    #[serde(default)]
    pub synthesis: bool,
    /// Place real scoop stars on two-jump refuel edges.
    #[serde(default = "enabled")]
    pub refuel_waypoints: bool,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub spatial: SpatialStoreConfig,
}

fn enabled() -> bool {
    true
}

impl RunConfig {
    /// Minimal configuration: full tank, no refuelling, no constraints.
    pub fn new(ship: Ship, start: impl Into<SystemRef>, goal: impl Into<SystemRef>) -> Self {
        Self {
            ship,
            start: start.into(),
            goal: goal.into(),
            refuel_profiles: Vec::new(),
            constraints: Vec::new(),
            synthesis: false,
            refuel_waypoints: true,
            search: SearchConfig::default(),
            spatial: SpatialStoreConfig::default(),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Check ship, profiles and tuning before any catalog work.
    pub fn validate(&self) -> Result<()> {
        self.ship.validate()?;
        for profile in &self.refuel_profiles {
            profile.validate(self.ship.fuel_capacity)?;
            if profile.kind.is_scoop() && !self.ship.can_scoop() {
                warn!(
                    kind = %profile.kind,
                    "scoop profile configured for a ship without a fuel scoop"
                );
            }
        }
        self.search.validate()
    }

    /// Starting fuel intervals from the `initial` profiles.
    pub fn initial_profiles(&self) -> impl Iterator<Item = &RefuelProfile> {
        self.refuel_profiles
            .iter()
            .filter(|profile| profile.kind == RefuelKind::Initial)
    }

    /// Profiles usable on edges, led by the implicit plain jump.
    pub fn edge_profiles(&self) -> Vec<RefuelProfile> {
        std::iter::once(RefuelProfile::plain())
            .chain(
                self.refuel_profiles
                    .iter()
                    .filter(|profile| profile.kind.refuels())
                    .copied(),
            )
            .collect()
    }
}
