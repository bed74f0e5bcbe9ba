use std::fmt;

use serde::{Deserialize, Serialize};

/// Range boost applied to a jump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostKind {
    None,
    Synthesis,
    Neutron,
    WhiteDwarf,
}

impl BoostKind {
    pub const ALL: [BoostKind; 4] = [
        BoostKind::None,
        BoostKind::Synthesis,
        BoostKind::Neutron,
        BoostKind::WhiteDwarf,
    ];

    /// Jump-range multiplier granted by the boost.
    pub fn factor(self) -> f64 {
        match self {
            BoostKind::None => 1.0,
            BoostKind::Synthesis => 2.0,
            BoostKind::Neutron => 4.0,
            BoostKind::WhiteDwarf => 1.5,
        }
    }

    /// Boosts drawn from a stellar body near the departure star.
    pub fn needs_body(self) -> bool {
        matches!(self, BoostKind::Neutron | BoostKind::WhiteDwarf)
    }
}

impl fmt::Display for BoostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            BoostKind::None => "none",
            BoostKind::Synthesis => "synthesis",
            BoostKind::Neutron => "neutron",
            BoostKind::WhiteDwarf => "white_dwarf",
        };
        f.write_str(value)
    }
}
