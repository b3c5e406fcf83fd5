use crate::error::CanvasError;
use crate::model::{CanvasEdge, EdgeKind, EntityNode, NodeId, Rect};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, VecDeque};

/// The node+edge arena for the composition canvas. All structural queries
/// (neighbors, cells in an area, lookup by id) go through here; external
/// collaborators only ever hold `NodeId`s.
#[derive(Debug, Default)]
pub struct CanvasGraph {
    graph: DiGraph<EntityNode, CanvasEdge>,
    node_indices: HashMap<NodeId, NodeIndex>,
}

impl CanvasGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: EntityNode) -> Result<NodeId, CanvasError> {
        if self.node_indices.contains_key(&node.id) {
            return Err(CanvasError::DuplicateNode(node.id));
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id.clone(), idx);
        Ok(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_indices.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&EntityNode> {
        self.node_indices
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut EntityNode> {
        self.node_indices
            .get(id)
            .and_then(|idx| self.graph.node_weight_mut(*idx))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &EntityNode> {
        self.graph.node_weights()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.graph.node_weights().map(|n| n.id.clone()).collect()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId, &CanvasEdge)> {
        self.graph.edge_indices().filter_map(|e| {
            let (a, b) = self.graph.edge_endpoints(e)?;
            Some((
                &self.graph[a].id,
                &self.graph[b].id,
                self.graph.edge_weight(e)?,
            ))
        })
    }

    pub fn connect(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        edge: CanvasEdge,
    ) -> Result<(), CanvasError> {
        let from = self.index_of(source)?;
        let to = self.index_of(target)?;
        self.graph.add_edge(from, to, edge);
        Ok(())
    }

    /// Edge between two nodes in either direction.
    pub fn edge_between(&self, a: &NodeId, b: &NodeId) -> Option<&CanvasEdge> {
        let ia = *self.node_indices.get(a)?;
        let ib = *self.node_indices.get(b)?;
        self.graph
            .find_edge(ia, ib)
            .or_else(|| self.graph.find_edge(ib, ia))
            .and_then(|e| self.graph.edge_weight(e))
    }

    pub fn remove_edge_between(&mut self, a: &NodeId, b: &NodeId) -> Option<CanvasEdge> {
        let ia = *self.node_indices.get(a)?;
        let ib = *self.node_indices.get(b)?;
        let edge = self
            .graph
            .find_edge(ia, ib)
            .or_else(|| self.graph.find_edge(ib, ia))?;
        self.graph.remove_edge(edge)
    }

    /// Removes a node and returns it. Edges touching it go with it; relation
    /// map entries on former neighbors are the caller's responsibility.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<EntityNode> {
        let idx = self.node_indices.remove(id)?;
        let node = self.graph.remove_node(idx)?;
        // petgraph swap-removes: the node that held the last index now sits
        // at `idx`, so its side-table entry must be rewritten.
        if let Some(moved) = self.graph.node_weight(idx) {
            self.node_indices.insert(moved.id.clone(), idx);
        }
        Some(node)
    }

    /// All neighbors regardless of edge direction or kind, deduplicated.
    pub fn neighbors(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for neighbor in self.graph.neighbors_undirected(*idx) {
            let nid = self.graph[neighbor].id.clone();
            if !out.contains(&nid) {
                out.push(nid);
            }
        }
        out
    }

    /// Targets of outgoing edges, any kind.
    pub fn successors(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(*idx, Direction::Outgoing)
            .map(|n| self.graph[n].id.clone())
            .collect()
    }

    pub fn in_degree(&self, id: &NodeId) -> usize {
        match self.node_indices.get(id) {
            Some(idx) => self
                .graph
                .neighbors_directed(*idx, Direction::Incoming)
                .count(),
            None => 0,
        }
    }

    /// Directly embedded children (outgoing embedding edges).
    pub fn embedded_children(&self, id: &NodeId) -> Vec<NodeId> {
        let Some(idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*idx, Direction::Outgoing)
            .filter(|e| e.weight().kind == EdgeKind::Embedding)
            .map(|e| self.graph[e.target()].id.clone())
            .collect()
    }

    /// Every embedded node reachable below `id`, breadth-first.
    pub fn embedded_descendants(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<NodeId> = self.embedded_children(id).into();
        while let Some(next) = queue.pop_front() {
            queue.extend(self.embedded_children(&next));
            out.push(next);
        }
        out
    }

    /// Owner ids from `id` up to its core root, nearest first.
    pub fn owner_chain(&self, id: &NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = id.clone();
        while let Some(owner) = self.node(&current).and_then(|n| n.owner.clone()) {
            // A cycle here would mean a broken ownership tree; stop rather
            // than spin.
            if chain.contains(&owner) || owner == *id {
                break;
            }
            chain.push(owner.clone());
            current = owner;
        }
        chain
    }

    /// True when one node is an embedding ancestor or descendant of the other.
    pub fn is_embedding_kin(&self, a: &NodeId, b: &NodeId) -> bool {
        self.owner_chain(a).contains(b) || self.owner_chain(b).contains(a)
    }

    /// Cells whose bounding box intersects `area`.
    pub fn nodes_in(&self, area: &Rect) -> Vec<NodeId> {
        self.graph
            .node_weights()
            .filter(|n| n.bounds().intersects(area))
            .map(|n| n.id.clone())
            .collect()
    }

    fn index_of(&self, id: &NodeId) -> Result<NodeIndex, CanvasError> {
        self.node_indices
            .get(id)
            .copied()
            .ok_or_else(|| CanvasError::NodeNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn make_node(id: &str) -> EntityNode {
        EntityNode::core(NodeId::from(id), "svc", id, Map::new())
    }

    fn make_embedded(id: &str, owner: &str) -> EntityNode {
        EntityNode::embedded(
            NodeId::from(id),
            "child",
            NodeId::from(owner),
            Map::new(),
            true,
            true,
        )
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut graph = CanvasGraph::new();
        let id = graph.insert(make_node("a")).unwrap();
        assert!(graph.contains(&id));
        assert_eq!(graph.node(&id).unwrap().name, "a");
        assert!(matches!(
            graph.insert(make_node("a")),
            Err(CanvasError::DuplicateNode(_))
        ));
    }

    #[test]
    fn test_remove_node_fixes_side_table() {
        let mut graph = CanvasGraph::new();
        let a = graph.insert(make_node("a")).unwrap();
        let b = graph.insert(make_node("b")).unwrap();
        let c = graph.insert(make_node("c")).unwrap();

        // Removing the first node forces petgraph's swap-remove to move the
        // last node into its slot.
        graph.remove_node(&a);
        assert!(!graph.contains(&a));
        assert_eq!(graph.node(&b).unwrap().name, "b");
        assert_eq!(graph.node(&c).unwrap().name, "c");
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_edge_between_is_direction_agnostic() {
        let mut graph = CanvasGraph::new();
        let a = graph.insert(make_node("a")).unwrap();
        let b = graph.insert(make_node("b")).unwrap();
        graph.connect(&a, &b, CanvasEdge::relation(true)).unwrap();

        assert!(graph.edge_between(&a, &b).is_some());
        assert!(graph.edge_between(&b, &a).is_some());
        assert!(graph.remove_edge_between(&b, &a).is_some());
        assert!(graph.edge_between(&a, &b).is_none());
    }

    #[test]
    fn test_embedding_descendants_and_kin() {
        let mut graph = CanvasGraph::new();
        let core = graph.insert(make_node("core")).unwrap();
        let child = graph.insert(make_embedded("core/child[0]", "core")).unwrap();
        let grandchild = graph
            .insert(make_embedded("core/child[0]/leaf[0]", "core/child[0]"))
            .unwrap();
        let other = graph.insert(make_node("other")).unwrap();

        graph
            .connect(&core, &child, CanvasEdge::embedding(false))
            .unwrap();
        graph
            .connect(&child, &grandchild, CanvasEdge::embedding(false))
            .unwrap();

        assert_eq!(graph.embedded_descendants(&core), vec![
            child.clone(),
            grandchild.clone()
        ]);
        assert!(graph.is_embedding_kin(&core, &grandchild));
        assert!(graph.is_embedding_kin(&grandchild, &core));
        assert!(!graph.is_embedding_kin(&core, &other));
    }
}
