//! Layered arrangement of the canvas after structural batch changes.
//!
//! Ranks are assigned by longest path over all edges (embedding and
//! relation alike) so owned sub-entities and related services fan out from
//! the core, bottom-to-top. A collision pass then nudges any remaining
//! overlapping nodes apart.

mod collision;

pub use collision::resolve_collisions;

use crate::config::LayoutConfig;
use crate::graph::CanvasGraph;
use crate::model::{NodeId, Point, Size};
use std::collections::{HashMap, HashSet, VecDeque};

/// Arrange the whole graph, then resolve residual overlaps.
pub fn arrange(graph: &mut CanvasGraph, config: &LayoutConfig) {
    let ranks = assign_ranks(graph);
    place(graph, config, &ranks);
    resolve_collisions(graph, config);
}

/// Longest-path rank per node. Relation edges can close cycles, so ordering
/// uses a Kahn variant that breaks them: cycle members land at their
/// earliest valid position.
fn assign_ranks(graph: &CanvasGraph) -> HashMap<NodeId, usize> {
    let order = kahn_with_cycle_handling(graph);
    let mut ranks: HashMap<NodeId, usize> = HashMap::new();

    for id in &order {
        let rank = *ranks.entry(id.clone()).or_insert(0);
        for succ in graph.successors(id) {
            let entry = ranks.entry(succ).or_insert(0);
            *entry = (*entry).max(rank + 1);
        }
    }
    ranks
}

fn kahn_with_cycle_handling(graph: &CanvasGraph) -> Vec<NodeId> {
    let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
    let mut result = Vec::new();
    let mut queue = VecDeque::new();
    let mut visited = HashSet::new();

    for id in graph.node_ids() {
        let degree = graph.in_degree(&id);
        if degree == 0 {
            queue.push_back(id.clone());
        }
        in_degree.insert(id, degree);
    }

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id.clone()) {
            continue;
        }
        for succ in graph.successors(&id) {
            if let Some(degree) = in_degree.get_mut(&succ) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 && !visited.contains(&succ) {
                    queue.push_back(succ);
                }
            }
        }
        result.push(id);
    }

    // Remaining nodes are part of cycles
    for id in graph.node_ids() {
        if !visited.contains(&id) {
            result.push(id);
        }
    }

    result
}

/// Rank direction bottom-to-top: rank 0 sits at y = 0, every further rank
/// one band higher. Nodes inside a rank spread along x.
fn place(graph: &mut CanvasGraph, config: &LayoutConfig, ranks: &HashMap<NodeId, usize>) {
    let mut by_rank: HashMap<usize, Vec<NodeId>> = HashMap::new();
    for id in graph.node_ids() {
        let rank = ranks.get(&id).copied().unwrap_or(0);
        by_rank.entry(rank).or_default().push(id);
    }

    for (rank, mut ids) in by_rank {
        // Stable intra-rank order regardless of map iteration.
        ids.sort();
        let y = -(rank as f64) * (config.node_height + config.rank_separation);
        for (i, id) in ids.iter().enumerate() {
            let x = i as f64 * (config.node_width + config.node_separation);
            if let Some(node) = graph.node_mut(id) {
                node.position = Point { x, y };
                node.size = Size {
                    width: config.node_width,
                    height: config.node_height,
                };
            }
        }
    }
}
