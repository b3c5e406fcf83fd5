use crate::config::LayoutConfig;
use crate::graph::CanvasGraph;
use crate::model::NodeId;

/// Push overlapping nodes apart. Each node is scanned against every other
/// node and shifted down by `collision_shift` until its bounding box is
/// clear; shifts are monotonic and the canvas is unbounded downward, so the
/// pass terminates.
pub fn resolve_collisions(graph: &mut CanvasGraph, config: &LayoutConfig) {
    let ids = graph.node_ids();
    for id in &ids {
        while overlaps_any(graph, id) {
            if let Some(node) = graph.node_mut(id) {
                node.position.y += config.collision_shift;
            } else {
                break;
            }
        }
    }
}

fn overlaps_any(graph: &CanvasGraph, id: &NodeId) -> bool {
    let Some(rect) = graph.node(id).map(|n| n.bounds()) else {
        return false;
    };
    graph
        .nodes()
        .any(|other| other.id != *id && other.bounds().intersects(&rect))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityNode, Point, Size};
    use serde_json::Map;

    fn stacked_graph(count: usize) -> CanvasGraph {
        let mut graph = CanvasGraph::new();
        for i in 0..count {
            let mut node = EntityNode::core(
                NodeId::from(format!("n{}", i)),
                "svc",
                &format!("n{}", i),
                Map::new(),
            );
            node.position = Point { x: 0.0, y: 0.0 };
            node.size = Size {
                width: 100.0,
                height: 60.0,
            };
            graph.insert(node).unwrap();
        }
        graph
    }

    fn assert_no_overlap(graph: &CanvasGraph) {
        let nodes: Vec<_> = graph.nodes().collect();
        for (i, a) in nodes.iter().enumerate() {
            for b in nodes.iter().skip(i + 1) {
                assert!(
                    !a.bounds().intersects(&b.bounds()),
                    "{} overlaps {}",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn test_two_stacked_nodes_separate() {
        let mut graph = stacked_graph(2);
        resolve_collisions(&mut graph, &LayoutConfig::default());
        assert_no_overlap(&graph);
    }

    #[test]
    fn test_two_hundred_stacked_nodes_separate() {
        let mut graph = stacked_graph(200);
        resolve_collisions(&mut graph, &LayoutConfig::default());
        assert_no_overlap(&graph);
    }

    #[test]
    fn test_non_overlapping_nodes_do_not_move() {
        let mut graph = stacked_graph(2);
        graph.node_mut(&NodeId::from("n1")).unwrap().position = Point { x: 500.0, y: 0.0 };
        resolve_collisions(&mut graph, &LayoutConfig::default());
        assert_eq!(
            graph.node(&NodeId::from("n0")).unwrap().position,
            Point { x: 0.0, y: 0.0 }
        );
        assert_eq!(
            graph.node(&NodeId::from("n1")).unwrap().position,
            Point { x: 500.0, y: 0.0 }
        );
    }
}
