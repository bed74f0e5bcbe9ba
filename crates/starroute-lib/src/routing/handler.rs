//! Lazy edge generation for the implicit route graph.
//!
//! For a vertex the handler gathers candidate destinations from the spatial
//! stores, then tries every candidate × boost × refuel profile combination at
//! the vertex's minimum and maximum fuel. Both constructions must succeed and
//! agree on whether the edge is a single jump or a multi-jump refuel chain;
//! the slower of the two is kept as the edge cost.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use super::node::{Edge, Node, RefuelStop};
use super::refuel_finder::{RefuelStarFinder, WaypointQuery};
use crate::config::SearchConfig;
use crate::constraints::ConstraintSet;
use crate::error::Result;
use crate::refuel::{RefuelKind, RefuelProfile};
use crate::ship::{BoostKind, JumpTimeModel, ShipPerformanceModel};
use crate::spatial::SpatialStores;
use crate::system::{StarSystem, SystemId};

/// Spreads origin ids across the seed space.
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Search-wide switches for edge generation.
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    pub synthesis: bool,
    pub refuel_waypoints: bool,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    Min,
    Max,
}

impl Bound {
    fn pick(self, min: f64, max: f64) -> f64 {
        match self {
            Bound::Min => min,
            Bound::Max => max,
        }
    }
}

/// One fuel bound's view of a candidate edge.
#[derive(Debug, Clone)]
struct Construction {
    time: f64,
    fuel_after: f64,
    jumps: u32,
    arrival_boost: BoostKind,
    waypoint: Option<RefuelStop>,
}

impl Construction {
    fn is_multi_jump(&self) -> bool {
        self.jumps > 1
    }
}

/// Produces the outgoing edges of search vertices.
pub struct NodeHandler {
    stores: SpatialStores,
    performance: Arc<ShipPerformanceModel>,
    timing: JumpTimeModel,
    constraints: ConstraintSet,
    profiles: Vec<RefuelProfile>,
    goal: Arc<StarSystem>,
    options: HandlerOptions,
    finder: RefuelStarFinder,
    candidate_cache: Mutex<HashMap<SystemId, Arc<Vec<Arc<StarSystem>>>>>,
}

impl NodeHandler {
    /// `profiles` are the edge profiles, led by the plain jump.
    pub fn new(
        stores: SpatialStores,
        performance: Arc<ShipPerformanceModel>,
        constraints: ConstraintSet,
        profiles: Vec<RefuelProfile>,
        goal: Arc<StarSystem>,
        options: HandlerOptions,
    ) -> Self {
        let timing = JumpTimeModel::new(performance.ship().scoop_rate);
        let finder = RefuelStarFinder::new(Arc::clone(&stores.scoopable), Arc::clone(&performance));
        Self {
            stores,
            performance,
            timing,
            constraints,
            profiles,
            goal,
            options,
            finder,
            candidate_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn goal(&self) -> &Arc<StarSystem> {
        &self.goal
    }

    pub fn stores(&self) -> &SpatialStores {
        &self.stores
    }

    pub fn performance(&self) -> &ShipPerformanceModel {
        &self.performance
    }

    pub fn timing(&self) -> &JumpTimeModel {
        &self.timing
    }

    /// Boost kinds usable when departing `system`, cheapest first.
    pub fn available_boosts(&self, system: &StarSystem) -> Vec<BoostKind> {
        let mut boosts = vec![BoostKind::None];
        if self.options.synthesis {
            boosts.push(BoostKind::Synthesis);
        }
        // Reaching the cone of a neutron star or white dwarf requires a scoop.
        if self.performance.ship().can_scoop() {
            if system.features.has_neutron() {
                boosts.push(BoostKind::Neutron);
            }
            if system.features.has_white_dwarf() {
                boosts.push(BoostKind::WhiteDwarf);
            }
        }
        boosts
    }

    /// Boost kinds that may appear anywhere on a route.
    pub fn usable_boosts(&self) -> Vec<BoostKind> {
        BoostKind::ALL
            .into_iter()
            .filter(|boost| match boost {
                BoostKind::None => true,
                BoostKind::Synthesis => self.options.synthesis,
                BoostKind::Neutron | BoostKind::WhiteDwarf => self.performance.ship().can_scoop(),
            })
            .collect()
    }

    /// Lower bound on seconds per unit distance, used by the A* heuristic.
    pub fn min_time_per_distance(&self) -> f64 {
        let max_range = self.performance.max_range();
        if max_range <= 0.0 {
            return 0.0;
        }
        self.usable_boosts()
            .into_iter()
            .map(|boost| self.timing.minimum_time(boost) / (boost.factor() * max_range))
            .fold(f64::INFINITY, f64::min)
    }

    /// Destinations considered from `origin`, computed once per system.
    pub fn candidates(&self, origin: &StarSystem) -> Result<Arc<Vec<Arc<StarSystem>>>> {
        let cached = self.candidate_cache.lock().get(&origin.id).cloned();
        if let Some(list) = cached {
            return Ok(list);
        }

        let list = Arc::new(self.collect_candidates(origin)?);
        Ok(Arc::clone(
            self.candidate_cache
                .lock()
                .entry(origin.id)
                .or_insert(list),
        ))
    }

    fn collect_candidates(&self, origin: &StarSystem) -> Result<Vec<Arc<StarSystem>>> {
        let strongest = self
            .available_boosts(origin)
            .into_iter()
            .map(BoostKind::factor)
            .fold(1.0, f64::max);
        let initial = self.performance.max_range() * strongest;
        if initial <= 0.0 {
            return Ok(Vec::new());
        }

        let search = &self.options.search;
        let limit = initial * search.max_radius_factor;
        let mut radius = initial;
        let found = loop {
            let found = self.query_candidates(origin, radius)?;
            if found.len() >= search.min_candidates || radius >= limit {
                break found;
            }
            let next = (radius * search.radius_growth).min(limit);
            debug!(
                origin = %origin.name,
                found = found.len(),
                radius = next,
                "growing candidate radius"
            );
            radius = next;
        };

        if found.len() > search.max_candidates {
            return Ok(self.sample_candidates(origin, found));
        }
        Ok(found)
    }

    fn query_candidates(&self, origin: &StarSystem, radius: f64) -> Result<Vec<Arc<StarSystem>>> {
        let point = origin.position;
        let mut by_id: BTreeMap<SystemId, Arc<StarSystem>> = BTreeMap::new();
        let all = self.stores.all.get_neighbors(point, radius)?;
        let neutron = self.stores.neutron.get_neighbors(point, radius)?;
        for system in all.into_iter().chain(neutron) {
            by_id.entry(system.id).or_insert(system);
        }
        if origin.distance_to(&self.goal) < radius {
            by_id
                .entry(self.goal.id)
                .or_insert_with(|| Arc::clone(&self.goal));
        }
        by_id.remove(&origin.id);

        Ok(by_id
            .into_values()
            .filter(|candidate| self.constraints.valid_before(origin, candidate))
            .collect())
    }

    /// Seeded sample of at most `max_candidates` systems.
    ///
    /// The goal is always kept; neutron-capable systems fill the remaining
    /// room before plain ones.
    fn sample_candidates(
        &self,
        origin: &StarSystem,
        found: Vec<Arc<StarSystem>>,
    ) -> Vec<Arc<StarSystem>> {
        let total = found.len();
        let cap = self.options.search.max_candidates;
        let (mut kept, rest): (Vec<_>, Vec<_>) = found
            .into_iter()
            .partition(|system| system.id == self.goal.id);
        let (neutron, plain): (Vec<_>, Vec<_>) = rest
            .into_iter()
            .partition(|system| system.features.has_neutron());

        let seed = self.options.search.seed ^ (origin.id as u64).wrapping_mul(SEED_MIX);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for pool in [neutron, plain] {
            let room = cap.saturating_sub(kept.len());
            if pool.len() <= room {
                kept.extend(pool);
            } else {
                kept.extend(pool.choose_multiple(&mut rng, room).cloned());
            }
        }
        kept.sort_by_key(|system| system.id);

        debug!(
            origin = %origin.name,
            total,
            kept = kept.len(),
            "sampled candidate list"
        );
        kept
    }

    /// Every feasible edge leaving `node` that passes the constraints.
    pub fn edges(&self, node: &Node) -> Result<Vec<Edge>> {
        let candidates = self.candidates(&node.system)?;
        let boosts = self.available_boosts(&node.system);

        let built = candidates
            .par_iter()
            .map(|candidate| self.edges_to(node, candidate, &boosts))
            .collect::<Result<Vec<_>>>()?;

        Ok(built
            .into_iter()
            .flatten()
            .filter(|edge| self.constraints.valid_after(edge))
            .collect())
    }

    fn edges_to(
        &self,
        node: &Node,
        candidate: &Arc<StarSystem>,
        boosts: &[BoostKind],
    ) -> Result<Vec<Edge>> {
        let mut edges = Vec::new();
        for &boost in boosts {
            for profile in &self.profiles {
                if let Some(edge) = self.build_edge(node, candidate, boost, profile)? {
                    edges.push(edge);
                }
            }
        }
        Ok(edges)
    }

    fn build_edge(
        &self,
        node: &Node,
        to: &Arc<StarSystem>,
        boost: BoostKind,
        profile: &RefuelProfile,
    ) -> Result<Option<Edge>> {
        let (Some(mut low), Some(mut high)) = (
            self.construct(node, Bound::Min, to, boost, profile),
            self.construct(node, Bound::Max, to, boost, profile),
        ) else {
            return Ok(None);
        };
        if low.is_multi_jump() != high.is_multi_jump() {
            return Ok(None);
        }

        if self.options.refuel_waypoints && low.jumps == 2 && high.jumps == 2 {
            let query = WaypointQuery {
                origin: &node.system,
                destination: to,
                first_boost: boost,
                second_boost: low.arrival_boost,
                fuel: [node.fuel_min, node.fuel_max],
                target: [profile.fuel.min, profile.fuel.max],
            };
            let waypoint = self.finder.find(&query)?;
            let placed = |fuel: f64, target: f64| {
                self.via_waypoint(&node.system, &waypoint, to, &query, profile.kind, fuel, target)
            };
            match (
                placed(node.fuel_min, profile.fuel.min),
                placed(node.fuel_max, profile.fuel.max),
            ) {
                (Some(l), Some(h)) => {
                    low = l;
                    high = h;
                }
                _ => return Ok(None),
            }
        }

        let fuel_min = low.fuel_after.min(high.fuel_after);
        let fuel_max = low.fuel_after.max(high.fuel_after);
        let worse = if high.time > low.time { high } else { low };

        Ok(Some(Edge {
            from: node.clone(),
            to: Node {
                system: Arc::clone(to),
                fuel_min,
                fuel_max,
                boost: worse.arrival_boost,
                refuel: profile.kind,
                jumps: worse.jumps,
                is_goal: to.id == self.goal.id,
            },
            cost: worse.time,
            jumps: worse.jumps,
            departure_boost: boost,
            waypoint: worse.waypoint,
        }))
    }

    fn construct(
        &self,
        node: &Node,
        bound: Bound,
        to: &StarSystem,
        boost: BoostKind,
        profile: &RefuelProfile,
    ) -> Option<Construction> {
        let origin = node.system.as_ref();
        let fuel = bound.pick(node.fuel_min, node.fuel_max);
        let distance = origin.distance_to(to);

        if !profile.kind.refuels() {
            return self.single_jump(origin, distance, boost, fuel, RefuelKind::None, None);
        }

        let target = bound.pick(profile.fuel.min, profile.fuel.max);
        if profile.jumps.min <= 1 {
            let single = self.refuel_jump(node, distance, boost, profile.kind, fuel, target);
            if single.is_some() {
                return single;
            }
        }
        if profile.allows_multi_jump() {
            return self.multi_jump(origin, distance, boost, profile, fuel, target);
        }
        None
    }

    fn single_jump(
        &self,
        origin: &StarSystem,
        distance: f64,
        boost: BoostKind,
        fuel: f64,
        refuel: RefuelKind,
        refuel_amount: Option<f64>,
    ) -> Option<Construction> {
        let factor = boost.factor();
        if distance >= factor * self.performance.jump_range(fuel) {
            return None;
        }
        let time = self.timing.time(Some(origin), boost, refuel, refuel_amount)?;
        let remaining = fuel - self.performance.fuel_cost(fuel, distance / factor);
        if remaining < self.performance.ship().fuel_floor() {
            return None;
        }
        Some(Construction {
            time,
            fuel_after: remaining,
            jumps: 1,
            arrival_boost: boost,
            waypoint: None,
        })
    }

    /// Refuel at the origin up to `target`, then jump.
    fn refuel_jump(
        &self,
        node: &Node,
        distance: f64,
        boost: BoostKind,
        kind: RefuelKind,
        fuel: f64,
        target: f64,
    ) -> Option<Construction> {
        if node.is_start() || target <= fuel {
            return None;
        }
        let origin = node.system.as_ref();
        let has_body = match kind {
            RefuelKind::Station => origin.features.has_station(),
            _ => origin.features.has_scoopable(),
        };
        if !has_body {
            return None;
        }
        self.single_jump(origin, distance, boost, target, kind, Some(target - fuel))
    }

    /// First leg at the current fuel, then scoop-and-jump legs at `target`.
    fn multi_jump(
        &self,
        origin: &StarSystem,
        distance: f64,
        boost: BoostKind,
        profile: &RefuelProfile,
        fuel: f64,
        target: f64,
    ) -> Option<Construction> {
        let first_reach = boost.factor() * self.performance.jump_range(fuel);
        let remainder = distance - first_reach;
        if first_reach <= 0.0 || remainder <= 0.0 {
            return None;
        }

        let relay = relay_boost(boost);
        let per_jump = profile.range_derate * self.performance.jump_range(target) * relay.factor();
        if per_jump <= 0.0 {
            return None;
        }
        let chain = (remainder / per_jump).ceil() + 1.0;
        if !chain.is_finite() || chain > f64::from(profile.jumps.max) {
            return None;
        }
        let jumps = chain as u32;
        if !profile.jumps.contains(jumps) {
            return None;
        }

        let first_time = self.timing.time(Some(origin), boost, RefuelKind::None, None)?;
        let after_first =
            (fuel - self.performance.fuel_cost(fuel, first_reach / boost.factor())).max(0.0);

        let leg = remainder / f64::from(jumps - 1);
        let leg_cost = self.performance.fuel_cost(target, leg / relay.factor());
        let arrival = target - leg_cost;
        if arrival < self.performance.ship().fuel_floor() {
            return None;
        }

        let relay_time = self
            .timing
            .time(None, relay, profile.kind, Some(leg_cost))?;
        let refuel_time = self
            .timing
            .time(None, relay, profile.kind, Some(target - after_first))?;

        Some(Construction {
            time: first_time + f64::from(jumps - 2) * relay_time + refuel_time,
            fuel_after: arrival,
            jumps,
            arrival_boost: relay,
            waypoint: None,
        })
    }

    /// Two-jump edge through a concrete refuel stop.
    #[allow(clippy::too_many_arguments)]
    fn via_waypoint(
        &self,
        origin: &StarSystem,
        waypoint: &Arc<StarSystem>,
        to: &StarSystem,
        query: &WaypointQuery<'_>,
        kind: RefuelKind,
        fuel: f64,
        target: f64,
    ) -> Option<Construction> {
        let floor = self.performance.ship().fuel_floor();
        let (first, second) = (query.first_boost, query.second_boost);

        let first_distance = origin.distance_to(waypoint);
        if first_distance >= first.factor() * self.performance.jump_range(fuel) {
            return None;
        }
        let after_first =
            fuel - self.performance.fuel_cost(fuel, first_distance / first.factor());
        if after_first < floor {
            return None;
        }

        let second_distance = waypoint.distance_to(to);
        if second_distance >= second.factor() * self.performance.jump_range(target) {
            return None;
        }
        let arrival =
            target - self.performance.fuel_cost(target, second_distance / second.factor());
        if arrival < floor {
            return None;
        }

        let first_time = self.timing.time(Some(origin), first, RefuelKind::None, None)?;
        let second_time = self
            .timing
            .time(Some(waypoint), second, kind, Some(target - after_first))?;

        Some(Construction {
            time: first_time + second_time,
            fuel_after: arrival,
            jumps: 2,
            arrival_boost: second,
            waypoint: Some(RefuelStop {
                system: Arc::clone(waypoint),
                elapsed: first_time,
            }),
        })
    }
}

impl std::fmt::Debug for NodeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandler")
            .field("goal", &self.goal.name)
            .field("profiles", &self.profiles.len())
            .field("constraints", &self.constraints.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Boost available on the relay legs of a multi-jump edge.
fn relay_boost(first: BoostKind) -> BoostKind {
    match first {
        BoostKind::Synthesis => BoostKind::Synthesis,
        _ => BoostKind::None,
    }
}
