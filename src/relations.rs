//! Bidirectional relation bookkeeping and loose-element detection.
//!
//! The tracker mirrors every interactive connect/disconnect into the
//! per-node relation maps and keeps the advisory "loose" flag for nodes whose
//! inter-service relations drop to an under-connected level. Loose state
//! never blocks further edits.

use crate::config::LoosePolicy;
use crate::graph::CanvasGraph;
use crate::model::{NodeId, NodeKind, RelationDef};
use std::collections::{HashMap, HashSet};

/// Minimum-cardinality requirement copied from a service model at append
/// time, with a live connection counter.
#[derive(Debug, Clone)]
pub struct RelationRequirement {
    pub attribute: String,
    pub related_type: String,
    pub lower: u32,
    pub satisfied: u32,
}

/// Loose-flag transition produced by a tracker operation; the canvas turns
/// these into notification-bus events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LooseChange {
    Set(NodeId),
    Clear(NodeId),
}

#[derive(Debug, Default)]
pub struct RelationTracker {
    requirements: HashMap<NodeId, Vec<RelationRequirement>>,
    loose: HashSet<NodeId>,
}

impl RelationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the minimum-cardinality relations of a freshly appended node.
    /// Only relations with a lower bound above zero are tracked.
    pub fn register(&mut self, node: &NodeId, relations: &[RelationDef]) {
        let requirements: Vec<RelationRequirement> = relations
            .iter()
            .filter(|r| r.lower_limit > 0)
            .map(|r| RelationRequirement {
                attribute: r.attribute_name.clone(),
                related_type: r.entity_type.clone(),
                lower: r.lower_limit,
                satisfied: 0,
            })
            .collect();
        if !requirements.is_empty() {
            self.requirements.insert(node.clone(), requirements);
        }
    }

    /// Drop all state for a removed node.
    pub fn unregister(&mut self, node: &NodeId) -> Option<LooseChange> {
        self.requirements.remove(node);
        if self.loose.remove(node) {
            Some(LooseChange::Clear(node.clone()))
        } else {
            None
        }
    }

    pub fn is_loose(&self, node: &NodeId) -> bool {
        self.loose.contains(node)
    }

    pub fn requirements_for(&self, node: &NodeId) -> &[RelationRequirement] {
        self.requirements
            .get(node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record `attribute` in both relation maps and clear loose flags on the
    /// now-connected pair.
    pub fn connect(
        &mut self,
        graph: &mut CanvasGraph,
        a: &NodeId,
        b: &NodeId,
        attribute: &str,
    ) -> Vec<LooseChange> {
        if let Some(node) = graph.node_mut(a) {
            node.relations.insert(b.clone(), attribute.to_string());
        }
        if let Some(node) = graph.node_mut(b) {
            node.relations.insert(a.clone(), attribute.to_string());
        }
        self.adjust_counters(graph, a, b, 1);

        let mut changes = Vec::new();
        for id in [a, b] {
            if self.loose.remove(id) {
                changes.push(LooseChange::Clear(id.clone()));
            }
        }
        changes
    }

    /// Remove the mapping on both sides and re-evaluate loose state. Call
    /// after the relation edge itself has been taken out of the graph.
    pub fn disconnect(
        &mut self,
        graph: &mut CanvasGraph,
        a: &NodeId,
        b: &NodeId,
        policy: LoosePolicy,
    ) -> Vec<LooseChange> {
        if let Some(node) = graph.node_mut(a) {
            node.relations.remove(b);
        }
        if let Some(node) = graph.node_mut(b) {
            node.relations.remove(a);
        }
        self.adjust_counters(graph, a, b, -1);

        let mut changes = Vec::new();
        for id in [a, b] {
            changes.extend(self.reevaluate(graph, id, policy));
        }
        changes
    }

    fn reevaluate(
        &mut self,
        graph: &CanvasGraph,
        node: &NodeId,
        policy: LoosePolicy,
    ) -> Option<LooseChange> {
        if !graph.contains(node) {
            return None;
        }
        let should_flag = match policy {
            LoosePolicy::ExactlyOneRemaining => remaining_relations(graph, node) == 1,
            LoosePolicy::BelowLowerBound => self
                .requirements
                .get(node)
                .is_some_and(|reqs| reqs.iter().any(|r| r.satisfied < r.lower)),
        };

        if should_flag && self.loose.insert(node.clone()) {
            Some(LooseChange::Set(node.clone()))
        } else if !should_flag && self.loose.remove(node) {
            Some(LooseChange::Clear(node.clone()))
        } else {
            None
        }
    }

    /// Bump the satisfied counter of the requirement on each side that
    /// matches the other side's type.
    fn adjust_counters(&mut self, graph: &CanvasGraph, a: &NodeId, b: &NodeId, delta: i64) {
        for (node, other) in [(a, b), (b, a)] {
            let Some(other_type) = graph.node(other).map(|n| n.schema_name.clone()) else {
                continue;
            };
            if let Some(reqs) = self.requirements.get_mut(node) {
                for req in reqs.iter_mut().filter(|r| r.related_type == other_type) {
                    req.satisfied = (req.satisfied as i64 + delta).max(0) as u32;
                }
            }
        }
    }
}

/// Count the neighbors of `node` that act as its remaining inter-service
/// relations: everything except embedding ancestors/descendants and core
/// nodes it holds no relation entry for.
pub fn remaining_relations(graph: &CanvasGraph, node: &NodeId) -> usize {
    let Some(this) = graph.node(node) else {
        return 0;
    };
    graph
        .neighbors(node)
        .iter()
        .filter(|neighbor| {
            if graph.is_embedding_kin(node, neighbor) {
                return false;
            }
            match graph.node(neighbor) {
                Some(n) => n.kind != NodeKind::Core || this.relations.contains_key(&n.id),
                None => false,
            }
        })
        .count()
}
