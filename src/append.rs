//! Recursive entity-node construction from resolved backend data.
//!
//! One append builds the core node, its embedded-entity tree, and every
//! related instance not yet on the canvas, wires the edges, updates the
//! relation tracker, and runs one layout pass over the whole graph.

use crate::canvas::Canvas;
use crate::error::CanvasError;
use crate::events::{CanvasEvent, OrderAction, StencilAction};
use crate::model::{
    CanvasEdge, EmbeddedEntityDef, EntityNode, Instance, InstanceWithRelations, NodeId, NodeKind,
    RelationDef, ServiceModel,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Outcome of one append: the core node id, everything created, and
/// non-fatal data problems encountered along the way.
#[derive(Debug, Clone)]
pub struct AppendReport {
    pub core: NodeId,
    pub created: Vec<NodeId>,
    pub warnings: Vec<String>,
}

impl Canvas {
    /// Append one instance (with its related instances) to the canvas.
    ///
    /// Fails with [`CanvasError::UnknownServiceModel`] if any involved type
    /// has no service model; the check runs before any mutation, so a
    /// failed append never leaves a partial graph. Unresolvable relation
    /// attributes are skipped per relation and reported as warnings.
    pub fn append(&mut self, input: &InstanceWithRelations) -> Result<AppendReport, CanvasError> {
        let core_model = self
            .model_for(&input.instance.service_type)
            .cloned()
            .ok_or_else(|| CanvasError::UnknownServiceModel(input.instance.service_type.clone()))?;

        let mut related_models: HashMap<String, ServiceModel> = HashMap::new();
        for related in &input.inter_service_relations {
            let model = self
                .model_for(&related.service_type)
                .cloned()
                .ok_or_else(|| CanvasError::UnknownServiceModel(related.service_type.clone()))?;
            related_models.insert(related.id.clone(), model);
        }

        // Ids that relation attributes may legally reference.
        let mut known: HashSet<String> = input
            .inter_service_relations
            .iter()
            .map(|r| r.id.clone())
            .collect();
        known.insert(input.instance.id.clone());
        for id in self.graph.node_ids() {
            known.insert(id.as_str().to_string());
        }

        let mut report = AppendReport {
            core: NodeId::from(input.instance.id.as_str()),
            created: Vec::new(),
            warnings: Vec::new(),
        };

        let core_id =
            self.build_instance(&input.instance, &core_model, NodeKind::Core, &known, &mut report)?;

        for related in &input.inter_service_relations {
            let related_id = NodeId::from(related.id.as_str());
            let already_present = self.graph.contains(&related_id);
            if !already_present {
                let model = &related_models[&related.id];
                self.build_instance(related, model, NodeKind::Related, &known, &mut report)?;
                // A related instance placed from the palette disables its
                // stencil entry.
                self.bus.emit(CanvasEvent::UpdateStencil {
                    type_name: related.service_type.clone(),
                    action: StencilAction::Disable,
                });
            }
            self.connect_appended(&core_id, &related_id);
            if already_present {
                // A symmetric relation may be stored on either side; the
                // reused node's own entries can reference nodes that only
                // now have both endpoints present.
                self.reconcile_recorded_relations(&related_id);
            }
        }

        // Freshly built nodes, embedded children included, may carry relation
        // entries whose edges do not exist yet.
        let created = report.created.clone();
        for id in &created {
            self.reconcile_recorded_relations(id);
        }

        self.run_layout();
        self.bus.emit(CanvasEvent::UpdateServiceOrderItems {
            node: core_id.clone(),
            action: OrderAction::Add,
        });

        for warning in &report.warnings {
            eprintln!("Warning: {}", warning);
        }
        Ok(report)
    }

    fn build_instance(
        &mut self,
        instance: &Instance,
        model: &ServiceModel,
        kind: NodeKind,
        known: &HashSet<String>,
        report: &mut AppendReport,
    ) -> Result<NodeId, CanvasError> {
        let id = NodeId::from(instance.id.as_str());
        if self.graph.contains(&id) {
            return Ok(id);
        }

        let mut relations = HashMap::new();
        record_relations(
            &mut relations,
            &id,
            &model.inter_service_relations,
            &instance.attributes,
            known,
            report,
        );

        // Deep-clone the attribute payload at construction time so nodes
        // never share mutable state with the input.
        let mut node = match kind {
            NodeKind::Related => {
                EntityNode::related(id.clone(), &model.name, &instance.name, instance.attributes.clone())
            }
            _ => EntityNode::core(id.clone(), &model.name, &instance.name, instance.attributes.clone()),
        };
        node.relations = relations;
        let editable = node.editable;

        self.graph.insert(node)?;
        self.tracker.register(&id, &model.inter_service_relations);
        report.created.push(id.clone());

        self.build_embedded(
            &id,
            &model.embedded_entities,
            &instance.attributes,
            editable,
            known,
            report,
        )?;
        Ok(id)
    }

    /// One embedded node per array element (one for a scalar), skipping
    /// read-only embedding definitions entirely.
    fn build_embedded(
        &mut self,
        owner: &NodeId,
        defs: &[EmbeddedEntityDef],
        attributes: &Map<String, Value>,
        editable: bool,
        known: &HashSet<String>,
        report: &mut AppendReport,
    ) -> Result<(), CanvasError> {
        for def in defs {
            if def.modifier.is_read_only() {
                continue;
            }
            let Some(value) = attributes.get(&def.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let elements: Vec<&Value> = match value {
                Value::Array(items) => items.iter().collect(),
                other => vec![other],
            };

            for (index, element) in elements.into_iter().enumerate() {
                let child_id = NodeId::embedded(owner, &def.name, index);
                let child_attributes = match element {
                    Value::Object(map) => map.clone(),
                    other => {
                        let mut map = Map::new();
                        map.insert("value".to_string(), other.clone());
                        map
                    }
                };

                let mut relations = HashMap::new();
                record_relations(
                    &mut relations,
                    &child_id,
                    &def.inter_service_relations,
                    &child_attributes,
                    known,
                    report,
                );

                let mut child = EntityNode::embedded(
                    child_id.clone(),
                    &def.name,
                    owner.clone(),
                    child_attributes.clone(),
                    def.modifier.allows_free_removal(),
                    editable,
                );
                child.relations = relations;

                self.graph.insert(child)?;
                self.tracker.register(&child_id, &def.inter_service_relations);
                self.graph.connect(
                    owner,
                    &child_id,
                    CanvasEdge::embedding(def.modifier.allows_free_removal()),
                )?;
                report.created.push(child_id.clone());

                self.build_embedded(
                    &child_id,
                    &def.embedded_entities,
                    &child_attributes,
                    editable,
                    known,
                    report,
                )?;
            }
        }
        Ok(())
    }

    /// Connect two appended nodes with the relation edge described by the
    /// rule table. Duplicates are skipped, not errors.
    fn connect_appended(&mut self, a: &NodeId, b: &NodeId) {
        if a == b || self.graph.edge_between(a, b).is_some() {
            return;
        }
        let Some((attribute, removable)) = self.relation_edge_for(a, b) else {
            return;
        };
        if self
            .graph
            .connect(a, b, CanvasEdge::relation(removable))
            .is_ok()
        {
            let changes = self.tracker.connect(&mut self.graph, a, b, &attribute);
            self.emit_loose(changes);
        }
    }

    /// Materialize edges for relation entries recorded before both endpoints
    /// existed, in either direction.
    fn reconcile_recorded_relations(&mut self, id: &NodeId) {
        let recorded: Vec<NodeId> = self
            .graph
            .node(id)
            .map(|n| n.relations.keys().cloned().collect())
            .unwrap_or_default();
        for other in recorded {
            if self.graph.contains(&other) {
                self.connect_appended(id, &other);
            }
        }

        // Entries stored only on the other side.
        for other in self.graph.node_ids() {
            if other == *id {
                continue;
            }
            let points_here = self
                .graph
                .node(&other)
                .is_some_and(|n| n.relations.contains_key(id));
            if points_here {
                self.connect_appended(&other, id);
            }
        }
    }
}

fn record_relations(
    relations: &mut HashMap<NodeId, String>,
    node_id: &NodeId,
    defs: &[RelationDef],
    attributes: &Map<String, Value>,
    known: &HashSet<String>,
    report: &mut AppendReport,
) {
    for def in defs {
        let Some(value) = attributes.get(&def.attribute_name) else {
            continue;
        };
        for target in relation_ids(value) {
            if known.contains(&target) {
                relations.insert(NodeId::from(target.as_str()), def.attribute_name.clone());
            } else {
                report.warnings.push(format!(
                    "Relation attribute '{}' on {} references unresolvable instance '{}'",
                    def.attribute_name, node_id, target
                ));
            }
        }
    }
}

fn relation_ids(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
