use crate::config::CanvasConfig;
use crate::error::CanvasError;
use crate::events::{CanvasEvent, LooseAction, NotificationBus, OrderAction, StencilAction};
use crate::graph::CanvasGraph;
use crate::layout;
use crate::model::{CanvasEdge, EdgeKind, NodeId, NodeKind, ServiceModel};
use crate::relations::{LooseChange, RelationTracker};
use crate::rules::{self, ConnectionRuleTable};

/// The composition canvas: graph arena, relation tracker, rule table, and
/// notification bus behind one synchronous surface. Every mutating
/// operation fully updates nodes, edges, and the tracker before returning,
/// so no intermediate state is observable by a later event.
pub struct Canvas {
    pub(crate) graph: CanvasGraph,
    pub(crate) tracker: RelationTracker,
    pub(crate) bus: NotificationBus,
    pub(crate) rules: ConnectionRuleTable,
    pub(crate) models: Vec<ServiceModel>,
    pub(crate) config: CanvasConfig,
}

impl Canvas {
    pub fn new(models: Vec<ServiceModel>, config: CanvasConfig) -> Self {
        let rules = ConnectionRuleTable::derive(&models);
        Self {
            graph: CanvasGraph::new(),
            tracker: RelationTracker::new(),
            bus: NotificationBus::new(),
            rules,
            models,
            config,
        }
    }

    pub fn graph(&self) -> &CanvasGraph {
        &self.graph
    }

    pub fn rules(&self) -> &ConnectionRuleTable {
        &self.rules
    }

    pub fn tracker(&self) -> &RelationTracker {
        &self.tracker
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn models(&self) -> &[ServiceModel] {
        &self.models
    }

    pub fn model_for(&self, type_name: &str) -> Option<&ServiceModel> {
        ServiceModel::lookup(&self.models, type_name)
    }

    pub fn drain_events(&mut self) -> Vec<CanvasEvent> {
        self.bus.drain()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&CanvasEvent) + 'static) {
        self.bus.subscribe(subscriber);
    }

    /// Interactive connect: validator-gated, then recorded on both sides.
    /// Returns false on denial; denial is not an error.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> bool {
        if !rules::can_connect(&self.graph, &self.rules, source, target) {
            return false;
        }
        let Some((attribute, removable)) = self.relation_edge_for(source, target) else {
            return false;
        };
        if self
            .graph
            .connect(source, target, CanvasEdge::relation(removable))
            .is_err()
        {
            return false;
        }
        let changes = self.tracker.connect(&mut self.graph, source, target, &attribute);
        self.emit_loose(changes);
        true
    }

    /// Interactive removal of a relation edge. Returns false when removal is
    /// not legal for this pair.
    pub fn disconnect(&mut self, a: &NodeId, b: &NodeId) -> bool {
        if !rules::can_remove(&self.graph, &self.rules, a, b) {
            return false;
        }
        self.graph.remove_edge_between(a, b);
        let changes = self
            .tracker
            .disconnect(&mut self.graph, a, b, self.config.loose_policy);
        self.emit_loose(changes);
        true
    }

    /// Delete a node, cascading to its embedded descendants. Dangling
    /// relation entries on surviving nodes are removed synchronously.
    /// Returns the ids actually removed.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Vec<NodeId>, CanvasError> {
        if !self.graph.contains(id) {
            return Err(CanvasError::NodeNotFound(id.clone()));
        }
        let mut doomed = vec![id.clone()];
        doomed.extend(self.graph.embedded_descendants(id));
        let was_loose: Vec<NodeId> = doomed
            .iter()
            .filter(|d| self.tracker.is_loose(d))
            .cloned()
            .collect();

        // Detach relations first so loose flags on surviving partners update.
        // Doomed nodes never flicker: their own transitions are suppressed
        // here and a previously-loose one gets a single Clear after removal.
        for d in &doomed {
            for neighbor in self.graph.neighbors(d) {
                if doomed.contains(&neighbor) {
                    continue;
                }
                let is_relation = self
                    .graph
                    .edge_between(d, &neighbor)
                    .is_some_and(|e| e.kind == EdgeKind::Relation);
                if is_relation {
                    self.graph.remove_edge_between(d, &neighbor);
                    let mut changes = self.tracker.disconnect(
                        &mut self.graph,
                        d,
                        &neighbor,
                        self.config.loose_policy,
                    );
                    changes.retain(|change| {
                        let node = match change {
                            LooseChange::Set(n) | LooseChange::Clear(n) => n,
                        };
                        !doomed.contains(node)
                    });
                    self.emit_loose(changes);
                }
            }
        }

        for d in &doomed {
            if let Some(node) = self.graph.remove_node(d) {
                let _ = self.tracker.unregister(d);
                if node.kind == NodeKind::Related {
                    self.bus.emit(CanvasEvent::UpdateStencil {
                        type_name: node.schema_name,
                        action: StencilAction::Enable,
                    });
                }
            }
        }

        for d in was_loose {
            self.bus.emit(CanvasEvent::LooseElement {
                node: d,
                action: LooseAction::Clear,
            });
        }

        // Sweep stale relation entries that were recorded before any edge
        // existed and therefore never became neighbors.
        for survivor in self.graph.node_ids() {
            if let Some(node) = self.graph.node_mut(&survivor) {
                for d in &doomed {
                    node.relations.remove(d);
                }
            }
        }

        self.bus.emit(CanvasEvent::UpdateServiceOrderItems {
            node: id.clone(),
            action: OrderAction::Remove,
        });
        Ok(doomed)
    }

    /// Edit one attribute value in place (driven by the property side
    /// panel). Denied for nodes that are not editable.
    pub fn set_attribute(&mut self, id: &NodeId, name: &str, value: serde_json::Value) -> bool {
        let updated = match self.graph.node_mut(id) {
            Some(node) if node.editable => {
                node.attributes.insert(name.to_string(), value);
                true
            }
            _ => false,
        };
        if updated {
            self.bus.emit(CanvasEvent::UpdateServiceOrderItems {
                node: id.clone(),
                action: OrderAction::Update,
            });
        }
        updated
    }

    pub fn run_layout(&mut self) {
        layout::arrange(&mut self.graph, &self.config.layout);
    }

    /// Attribute name and removability for a relation edge between two
    /// present nodes, from the matched rule.
    pub(crate) fn relation_edge_for(&self, a: &NodeId, b: &NodeId) -> Option<(String, bool)> {
        let na = self.graph.node(a)?;
        let nb = self.graph.node(b)?;
        let rule = self
            .rules
            .relation_rule_between(&na.schema_name, &nb.schema_name)?;
        let attribute = na
            .relations
            .get(b)
            .cloned()
            .unwrap_or_else(|| rule.attribute_name.clone());
        let removable =
            rule.modifier.allows_free_removal() || (na.editable && nb.editable);
        Some((attribute, removable))
    }

    pub(crate) fn emit_loose(&mut self, changes: Vec<LooseChange>) {
        for change in changes {
            let event = match change {
                LooseChange::Set(node) => CanvasEvent::LooseElement {
                    node,
                    action: LooseAction::Set,
                },
                LooseChange::Clear(node) => CanvasEvent::LooseElement {
                    node,
                    action: LooseAction::Clear,
                },
            };
            self.bus.emit(event);
        }
    }
}
