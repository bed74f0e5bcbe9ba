//! Elapsed-time model for a single jump.
//!
//! A jump is costed as witch-space transit, then the boost's own charge,
//! cooldown and handling overhead, then any supercruise to the boosting body,
//! then any refuelling. Terms are added in that order.

use super::boost::BoostKind;
use super::constants::{
    FSD_CHARGE_TIME, FSD_COOLDOWN_TIME, HEATSINK_DEPLOY_TIME, HEATSINK_SCOOP_FACTOR,
    NEUTRON_OVERHEAD, PARALLEL_ACTIVITY_BUDGET, STATION_REFUEL_TIME, SUPERCRUISE_LOG_FACTOR,
    SUPERCRUISE_MIN_TIME, SUPERCRUISE_ZERO_DISTANCE_TIME, SYNTHESIS_OVERHEAD, WHITE_DWARF_OVERHEAD,
    WITCH_SPACE_TIME,
};
use crate::refuel::RefuelKind;
use crate::system::StarSystem;

/// Per-jump time model for one ship.
#[derive(Debug, Clone)]
pub struct JumpTimeModel {
    scoop_rate: f64,
    fast: [f64; 4],
}

impl JumpTimeModel {
    pub fn new(scoop_rate: f64) -> Self {
        let fast = BoostKind::ALL.map(|boost| WITCH_SPACE_TIME + boost_overhead(boost));
        Self { scoop_rate, fast }
    }

    /// Time for one jump, or `None` when the combination is infeasible.
    ///
    /// `origin` is the departure system when known; idealized intermediate
    /// stars pass `None`.
    pub fn time(
        &self,
        origin: Option<&StarSystem>,
        boost: BoostKind,
        refuel: RefuelKind,
        refuel_amount: Option<f64>,
    ) -> Option<f64> {
        let refuelling = refuel.refuels() && refuel_amount.is_some();
        if !refuelling && !boost.needs_body() {
            return Some(self.fast[boost as usize]);
        }

        let mut time = WITCH_SPACE_TIME + boost_overhead(boost);

        if boost.needs_body() {
            let features = origin?.features;
            let distance = match boost {
                BoostKind::Neutron => features.neutron,
                _ => features.white_dwarf,
            }?;
            time += supercruise_time(distance);
        }

        if let Some(amount) = refuel_amount.filter(|_| refuelling) {
            time += self.refuel_time(origin, refuel, amount)?;
        }

        Some(time)
    }

    fn refuel_time(&self, origin: Option<&StarSystem>, refuel: RefuelKind, amount: f64) -> Option<f64> {
        let amount = amount.max(0.0);
        match refuel {
            RefuelKind::Scoop | RefuelKind::ScoopHeatsink => {
                if self.scoop_rate <= 0.0 {
                    return None;
                }
                let (rate, extra) = if refuel == RefuelKind::ScoopHeatsink {
                    (self.scoop_rate * HEATSINK_SCOOP_FACTOR, HEATSINK_DEPLOY_TIME)
                } else {
                    (self.scoop_rate, 0.0)
                };
                // Idealized stars are assumed to be the scoopable arrival star.
                let body = match origin {
                    Some(system) => system.features.scoopable?,
                    None => 0.0,
                };
                let scoop = amount / rate;
                let mut time = scoop + extra + supercruise_time(body);
                if scoop < PARALLEL_ACTIVITY_BUDGET {
                    time += FSD_CHARGE_TIME;
                }
                Some(time)
            }
            RefuelKind::Station => {
                let body = origin?.features.station?;
                Some(supercruise_time(body) + STATION_REFUEL_TIME)
            }
            RefuelKind::None | RefuelKind::Initial => Some(0.0),
        }
    }

    /// Cheapest possible jump with `boost`, ignoring refuelling.
    pub fn minimum_time(&self, boost: BoostKind) -> f64 {
        let mut time = self.fast[boost as usize];
        if boost.needs_body() {
            time += SUPERCRUISE_ZERO_DISTANCE_TIME.min(SUPERCRUISE_MIN_TIME);
        }
        time
    }
}

fn boost_overhead(boost: BoostKind) -> f64 {
    let handling = match boost {
        BoostKind::None => 0.0,
        BoostKind::Synthesis => SYNTHESIS_OVERHEAD,
        BoostKind::Neutron => NEUTRON_OVERHEAD,
        BoostKind::WhiteDwarf => WHITE_DWARF_OVERHEAD,
    };
    FSD_CHARGE_TIME + FSD_COOLDOWN_TIME + handling
}

/// Supercruise time to a body `distance` away from the arrival star.
pub fn supercruise_time(distance: f64) -> f64 {
    if distance >= 1.0 {
        SUPERCRUISE_MIN_TIME.max(SUPERCRUISE_LOG_FACTOR * distance.ln())
    } else {
        SUPERCRUISE_ZERO_DISTANCE_TIME
    }
}
