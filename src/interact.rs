//! Gesture entry points binding pointer input to the validator, tracker,
//! and layout pipeline. The hosting console translates raw pointer events
//! into these calls and reacts to the notification bus.

use crate::canvas::Canvas;
use crate::events::{CanvasEvent, OrderAction};
use crate::model::{EdgeKind, NodeId};
use crate::rules;

/// Contextual drag-to-connect affordance attached to a selected node:
/// the entity types a drag from this node may legally target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halo {
    pub node: NodeId,
    pub connectable_types: Vec<String>,
}

/// Transient decoration for a hovered link: endpoint name labels (shown
/// only when neither endpoint is a private entity) and a removal tool for
/// editable relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHover {
    pub labels: Option<(String, String)>,
    pub removal_tool: bool,
}

impl Canvas {
    /// Pointer-up on a node: sends it to the property side panel and
    /// returns the halo, gated by the rule table for the node's type.
    pub fn select(&mut self, node: &NodeId) -> Option<Halo> {
        let schema_name = self.graph.node(node)?.schema_name.clone();
        self.bus.emit(CanvasEvent::SendCellToSidebar {
            node: Some(node.clone()),
        });

        let mut connectable_types = Vec::new();
        for rule in self.rules.rules_for(&schema_name) {
            if rule.kind == EdgeKind::Relation && !connectable_types.contains(&rule.related_type) {
                connectable_types.push(rule.related_type.clone());
            }
        }
        Some(Halo {
            node: node.clone(),
            connectable_types,
        })
    }

    /// Pointer over a link between `a` and `b`.
    pub fn hover_link(&self, a: &NodeId, b: &NodeId) -> Option<LinkHover> {
        self.graph.edge_between(a, b)?;
        let na = self.graph.node(a)?;
        let nb = self.graph.node(b)?;

        let marker = &self.config.private_marker;
        let labels = if na.display_name.starts_with(marker) || nb.display_name.starts_with(marker)
        {
            None
        } else {
            Some((na.display_name.clone(), nb.display_name.clone()))
        };

        Some(LinkHover {
            labels,
            removal_tool: rules::can_remove(&self.graph, &self.rules, a, b),
        })
    }

    /// Drop of a drag from one node's magnet onto another node. Validator
    /// gated; on success the relation is registered on both sides and any
    /// loose flag on the now-connected side is cleared.
    pub fn drag_connect(&mut self, source: &NodeId, target: &NodeId) -> bool {
        self.connect(source, target)
    }

    /// Click on a link's removal tool. On success the relation is dropped
    /// from both sides, loose flags are re-evaluated, and the dependent
    /// summary of the affected node is refreshed.
    pub fn remove_link(&mut self, a: &NodeId, b: &NodeId) -> bool {
        if !self.disconnect(a, b) {
            return false;
        }
        self.bus.emit(CanvasEvent::UpdateServiceOrderItems {
            node: a.clone(),
            action: OrderAction::Update,
        });
        true
    }

    /// Click on empty canvas space.
    pub fn blank_click(&mut self) {
        self.bus.emit(CanvasEvent::SendCellToSidebar { node: None });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;
    use crate::model::{
        EmbeddedEntityDef, Instance, InstanceWithRelations, Modifier, RelationDef, ServiceModel,
    };
    use serde_json::json;

    fn models() -> Vec<ServiceModel> {
        vec![
            ServiceModel {
                name: "database".to_string(),
                attributes: vec![],
                embedded_entities: vec![EmbeddedEntityDef {
                    name: "tablespace".to_string(),
                    modifier: Modifier::ReadWrite,
                    embedded_entities: vec![],
                    inter_service_relations: vec![],
                }],
                inter_service_relations: vec![RelationDef {
                    entity_type: "backup".to_string(),
                    attribute_name: "backupRef".to_string(),
                    lower_limit: 0,
                    upper_limit: 1,
                    modifier: Modifier::ReadWriteRemovable,
                }],
            },
            ServiceModel {
                name: "backup".to_string(),
                attributes: vec![],
                embedded_entities: vec![],
                inter_service_relations: vec![],
            },
        ]
    }

    fn canvas_with_pair() -> Canvas {
        let mut canvas = Canvas::new(models(), CanvasConfig::default());
        canvas
            .append(&InstanceWithRelations {
                instance: Instance {
                    id: "db-1".to_string(),
                    name: "db-1".to_string(),
                    service_type: "database".to_string(),
                    attributes: json!({ "backupRef": "bk-1" })
                        .as_object()
                        .cloned()
                        .unwrap(),
                },
                inter_service_relations: vec![Instance {
                    id: "bk-1".to_string(),
                    name: "bk-1".to_string(),
                    service_type: "backup".to_string(),
                    attributes: Default::default(),
                }],
            })
            .unwrap();
        canvas.drain_events();
        canvas
    }

    #[test]
    fn test_select_emits_sidebar_event_and_halo() {
        let mut canvas = canvas_with_pair();
        let halo = canvas.select(&NodeId::from("db-1")).unwrap();

        assert_eq!(halo.connectable_types, vec!["backup".to_string()]);
        let events = canvas.drain_events();
        assert_eq!(events, vec![CanvasEvent::SendCellToSidebar {
            node: Some(NodeId::from("db-1")),
        }]);
    }

    #[test]
    fn test_blank_click_clears_sidebar() {
        let mut canvas = canvas_with_pair();
        canvas.blank_click();
        assert_eq!(canvas.drain_events(), vec![CanvasEvent::SendCellToSidebar {
            node: None
        }]);
    }

    #[test]
    fn test_hover_link_labels_and_tool() {
        let canvas = canvas_with_pair();
        let hover = canvas
            .hover_link(&NodeId::from("db-1"), &NodeId::from("bk-1"))
            .unwrap();

        assert_eq!(
            hover.labels,
            Some(("db-1".to_string(), "bk-1".to_string()))
        );
        // rw+ rule: removable even though bk-1 is edit-blocked.
        assert!(hover.removal_tool);
    }

    #[test]
    fn test_hover_link_hides_private_names() {
        let mut canvas = canvas_with_pair();
        canvas
            .graph
            .node_mut(&NodeId::from("bk-1"))
            .unwrap()
            .display_name = "_internal".to_string();

        let hover = canvas
            .hover_link(&NodeId::from("db-1"), &NodeId::from("bk-1"))
            .unwrap();
        assert!(hover.labels.is_none());
    }

    #[test]
    fn test_remove_link_updates_summary() {
        let mut canvas = canvas_with_pair();
        let db = NodeId::from("db-1");
        let bk = NodeId::from("bk-1");

        assert!(canvas.remove_link(&db, &bk));
        assert!(canvas.graph().edge_between(&db, &bk).is_none());
        assert!(canvas.graph().node(&db).unwrap().relations.is_empty());

        let events = canvas.drain_events();
        assert!(events.contains(&CanvasEvent::UpdateServiceOrderItems {
            node: db,
            action: OrderAction::Update,
        }));
    }

    #[test]
    fn test_drag_connect_round_trip() {
        let mut canvas = canvas_with_pair();
        let db = NodeId::from("db-1");
        let bk = NodeId::from("bk-1");

        assert!(canvas.remove_link(&db, &bk));
        assert!(canvas.drag_connect(&db, &bk));
        assert_eq!(
            canvas.graph().node(&db).unwrap().relations.get(&bk).unwrap(),
            "backupRef"
        );
        // Duplicate connects are denied.
        assert!(!canvas.drag_connect(&db, &bk));
    }
}
