//! Refuel kinds and the profiles that configure refuelling edges.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How (and whether) fuel is taken on before a jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefuelKind {
    None,
    /// Fuel state the route starts with; never a real refuel.
    Initial,
    Scoop,
    ScoopHeatsink,
    Station,
}

impl RefuelKind {
    pub fn is_scoop(self) -> bool {
        matches!(self, RefuelKind::Scoop | RefuelKind::ScoopHeatsink)
    }

    /// Kinds that actually add fuel during the route.
    pub fn refuels(self) -> bool {
        matches!(
            self,
            RefuelKind::Scoop | RefuelKind::ScoopHeatsink | RefuelKind::Station
        )
    }
}

impl fmt::Display for RefuelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            RefuelKind::None => "none",
            RefuelKind::Initial => "initial",
            RefuelKind::Scoop => "scoop",
            RefuelKind::ScoopHeatsink => "scoop_heatsink",
            RefuelKind::Station => "station",
        };
        f.write_str(value)
    }
}

/// Closed interval used for fuel targets and jump counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Interval<T> {
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// One configured way of refuelling (or starting) a leg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefuelProfile {
    pub kind: RefuelKind,
    /// Fuel held after refuelling, or the starting fuel for `Initial`.
    pub fuel: Interval<f64>,
    /// Jumps the composite edge may span.
    #[serde(default = "single_jump")]
    pub jumps: Interval<u32>,
    /// Fraction of the ideal range assumed for jumps onto unknown stars.
    #[serde(default = "full_range")]
    pub range_derate: f64,
}

fn single_jump() -> Interval<u32> {
    Interval::new(1, 1)
}

fn full_range() -> f64 {
    1.0
}

impl RefuelProfile {
    /// Plain jump without refuelling.
    pub fn plain() -> Self {
        Self {
            kind: RefuelKind::None,
            fuel: Interval::new(0.0, 0.0),
            jumps: single_jump(),
            range_derate: full_range(),
        }
    }

    /// Starting fuel interval for the route.
    pub fn initial(min: f64, max: f64) -> Self {
        Self {
            kind: RefuelKind::Initial,
            fuel: Interval::new(min, max),
            jumps: single_jump(),
            range_derate: full_range(),
        }
    }

    pub fn scoop(min: f64, max: f64, max_jumps: u32, range_derate: f64) -> Self {
        Self {
            kind: RefuelKind::Scoop,
            fuel: Interval::new(min, max),
            jumps: Interval::new(1, max_jumps.max(1)),
            range_derate,
        }
    }

    pub fn station(min: f64, max: f64) -> Self {
        Self {
            kind: RefuelKind::Station,
            fuel: Interval::new(min, max),
            jumps: single_jump(),
            range_derate: full_range(),
        }
    }

    /// Whether this profile may produce composite multi-jump edges.
    pub fn allows_multi_jump(&self) -> bool {
        self.kind.is_scoop() && self.jumps.max >= 2
    }

    /// Check the profile against the ship's tank.
    pub fn validate(&self, fuel_capacity: f64) -> Result<()> {
        if self.kind == RefuelKind::None {
            return Ok(());
        }
        let fuel = self.fuel;
        if !fuel.min.is_finite() || !fuel.max.is_finite() || fuel.min < 0.0 || fuel.min > fuel.max
        {
            return Err(Error::invalid_config(format!(
                "{} profile has an invalid fuel interval [{}, {}]",
                self.kind, fuel.min, fuel.max
            )));
        }
        if fuel.max > fuel_capacity {
            return Err(Error::invalid_config(format!(
                "{} profile fuel {} exceeds tank capacity {}",
                self.kind, fuel.max, fuel_capacity
            )));
        }
        if self.jumps.min == 0 || self.jumps.min > self.jumps.max {
            return Err(Error::invalid_config(format!(
                "{} profile has an invalid jump interval [{}, {}]",
                self.kind, self.jumps.min, self.jumps.max
            )));
        }
        if !(self.range_derate > 0.0 && self.range_derate <= 1.0) {
            return Err(Error::invalid_config(format!(
                "{} profile range_derate must be in (0, 1], got {}",
                self.kind, self.range_derate
            )));
        }
        Ok(())
    }
}
