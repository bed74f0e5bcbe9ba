//! A* driver over the implicit graph produced by [`NodeHandler`].

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;
use tracing::debug;

use super::handler::NodeHandler;
use super::node::{Edge, Node, NodeKey};
use crate::error::Result;
use crate::system::Position;

/// One vertex of a finished route.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStep {
    pub node: Node,
    /// Edge that arrived here; `None` for the start vertex.
    pub edge: Option<Edge>,
    /// Elapsed time since departure.
    pub time: f64,
}

/// Counters describing how much of the graph a search touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub expanded: usize,
    pub stale_skipped: usize,
    pub edges_generated: usize,
}

/// Result of a search: the path (empty when no route exists) and counters.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub path: Vec<PathStep>,
    pub stats: SearchStats,
}

/// A* search from one or more start vertices to the handler's goal.
pub struct Pathfinder<'a> {
    handler: &'a NodeHandler,
    goal_position: Position,
    time_per_distance: f64,
}

impl<'a> Pathfinder<'a> {
    pub fn new(handler: &'a NodeHandler) -> Self {
        Self {
            handler,
            goal_position: handler.goal().position,
            time_per_distance: handler.min_time_per_distance(),
        }
    }

    /// Admissible estimate of the remaining time from `node`.
    pub fn heuristic(&self, node: &Node) -> f64 {
        node.system.position.distance_to(&self.goal_position) * self.time_per_distance
    }

    pub fn search(&self, starts: Vec<Node>) -> Result<SearchOutcome> {
        let mut stats = SearchStats::default();
        let mut frontier = BinaryHeap::new();
        let mut g_score: HashMap<NodeKey, f64> = HashMap::new();
        let mut nodes: HashMap<NodeKey, Node> = HashMap::new();
        let mut came_from: HashMap<NodeKey, Edge> = HashMap::new();
        let mut seq = 0u64;

        for node in starts {
            let key = node.key();
            if g_score.contains_key(&key) {
                continue;
            }
            g_score.insert(key, 0.0);
            frontier.push(FrontierEntry::new(self.heuristic(&node), seq, 0.0, key));
            seq += 1;
            nodes.insert(key, node);
        }

        while let Some(entry) = frontier.pop() {
            let best = g_score.get(&entry.key).copied().unwrap_or(f64::INFINITY);
            if entry.g > best {
                stats.stale_skipped += 1;
                continue;
            }
            let Some(current) = nodes.get(&entry.key).cloned() else {
                continue;
            };

            if current.is_goal {
                debug!(
                    expanded = stats.expanded,
                    stale = stats.stale_skipped,
                    edges = stats.edges_generated,
                    "goal reached"
                );
                return Ok(SearchOutcome {
                    path: reconstruct(&came_from, &g_score, current),
                    stats,
                });
            }

            stats.expanded += 1;
            let edges = self.handler.edges(&current)?;
            stats.edges_generated += edges.len();

            for edge in edges {
                let key = edge.to.key();
                let tentative = entry.g + edge.cost;
                if tentative < g_score.get(&key).copied().unwrap_or(f64::INFINITY) {
                    g_score.insert(key, tentative);
                    let estimate = tentative + self.heuristic(&edge.to);
                    frontier.push(FrontierEntry::new(estimate, seq, tentative, key));
                    seq += 1;
                    nodes.insert(key, edge.to.clone());
                    came_from.insert(key, edge);
                }
            }
        }

        debug!(
            expanded = stats.expanded,
            stale = stats.stale_skipped,
            edges = stats.edges_generated,
            "frontier exhausted"
        );
        Ok(SearchOutcome {
            path: Vec::new(),
            stats,
        })
    }
}

fn reconstruct(
    came_from: &HashMap<NodeKey, Edge>,
    g_score: &HashMap<NodeKey, f64>,
    goal: Node,
) -> Vec<PathStep> {
    let mut path = Vec::new();
    let mut current = goal;
    // Bounded walk: every predecessor link was set by a strictly cheaper arrival.
    for _ in 0..=came_from.len() {
        let key = current.key();
        let time = g_score.get(&key).copied().unwrap_or(0.0);
        match came_from.get(&key) {
            Some(edge) => {
                let previous = edge.from.clone();
                path.push(PathStep {
                    node: current,
                    edge: Some(edge.clone()),
                    time,
                });
                current = previous;
            }
            None => {
                path.push(PathStep {
                    node: current,
                    edge: None,
                    time,
                });
                break;
            }
        }
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug)]
struct FrontierEntry {
    estimate: FloatOrd,
    seq: u64,
    g: f64,
    key: NodeKey,
}

impl FrontierEntry {
    fn new(estimate: f64, seq: u64, g: f64, key: NodeKey) -> Self {
        Self {
            estimate: FloatOrd(estimate),
            seq,
            g,
            key,
        }
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap pops the lowest estimate, oldest first.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
