//! Declarative connection rules derived from the service models, plus the
//! pure validation functions that gate interactive connect/disconnect.

use crate::graph::CanvasGraph;
use crate::model::{EdgeKind, EmbeddedEntityDef, Modifier, NodeId, RelationDef, ServiceModel};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ConnectionRule {
    pub related_type: String,
    pub kind: EdgeKind,
    pub attribute_name: String,
    pub modifier: Modifier,
}

/// Entity type name -> legal connections for that type. Derived once per
/// service-model set and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRuleTable {
    rules: HashMap<String, Vec<ConnectionRule>>,
}

impl ConnectionRuleTable {
    pub fn derive(models: &[ServiceModel]) -> Self {
        let mut table = Self::default();
        for model in models {
            table.add_entity_rules(
                &model.name,
                &model.embedded_entities,
                &model.inter_service_relations,
            );
        }
        table
    }

    fn add_entity_rules(
        &mut self,
        type_name: &str,
        embedded: &[EmbeddedEntityDef],
        relations: &[RelationDef],
    ) {
        let entry = self.rules.entry(type_name.to_string()).or_default();

        for def in embedded {
            entry.push(ConnectionRule {
                related_type: def.name.clone(),
                kind: EdgeKind::Embedding,
                attribute_name: def.name.clone(),
                modifier: def.modifier,
            });
        }
        for rel in relations {
            entry.push(ConnectionRule {
                related_type: rel.entity_type.clone(),
                kind: EdgeKind::Relation,
                attribute_name: rel.attribute_name.clone(),
                modifier: rel.modifier,
            });
        }

        // Embedded definitions carry their own nested entities and relations.
        for def in embedded {
            self.add_entity_rules(&def.name, &def.embedded_entities, &def.inter_service_relations);
        }
    }

    pub fn rules_for(&self, type_name: &str) -> &[ConnectionRule] {
        self.rules.get(type_name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Symmetric lookup: a rule registered for (A,B) also resolves for (B,A).
    pub fn rule_between(&self, a: &str, b: &str) -> Option<&ConnectionRule> {
        self.find(a, b).or_else(|| self.find(b, a))
    }

    /// Symmetric lookup restricted to relation rules. Embedding rules never
    /// legitimize a user-drawn link.
    pub fn relation_rule_between(&self, a: &str, b: &str) -> Option<&ConnectionRule> {
        self.find_relation(a, b).or_else(|| self.find_relation(b, a))
    }

    fn find(&self, from: &str, to: &str) -> Option<&ConnectionRule> {
        self.rules
            .get(from)
            .and_then(|rules| rules.iter().find(|r| r.related_type == to))
    }

    fn find_relation(&self, from: &str, to: &str) -> Option<&ConnectionRule> {
        self.rules.get(from).and_then(|rules| {
            rules
                .iter()
                .find(|r| r.kind == EdgeKind::Relation && r.related_type == to)
        })
    }
}

/// Decide whether a relation edge between two nodes would be legal.
/// Synchronous, no side effects. Denial is an ordinary outcome, not an error.
pub fn can_connect(
    graph: &CanvasGraph,
    table: &ConnectionRuleTable,
    source: &NodeId,
    target: &NodeId,
) -> bool {
    // No self-loops, whatever the rule table says.
    if source == target {
        return false;
    }
    let (Some(src), Some(dst)) = (graph.node(source), graph.node(target)) else {
        return false;
    };
    // No parallel duplicate relation.
    if graph.edge_between(source, target).is_some() {
        return false;
    }
    let Some(rule) = table.relation_rule_between(&src.schema_name, &dst.schema_name) else {
        return false;
    };
    if (src.is_edit_blocked() || dst.is_edit_blocked())
        && !rule.modifier.allows_free_removal()
    {
        return false;
    }
    true
}

/// Decide whether the edge between two nodes may be removed by the user.
/// Embedding edges never qualify; they only disappear with their node.
pub fn can_remove(
    graph: &CanvasGraph,
    table: &ConnectionRuleTable,
    a: &NodeId,
    b: &NodeId,
) -> bool {
    let Some(edge) = graph.edge_between(a, b) else {
        return false;
    };
    if edge.kind == EdgeKind::Embedding || !edge.removable {
        return false;
    }
    let (Some(na), Some(nb)) = (graph.node(a), graph.node(b)) else {
        return false;
    };
    if na.is_edit_blocked() || nb.is_edit_blocked() {
        match table.relation_rule_between(&na.schema_name, &nb.schema_name) {
            Some(rule) => rule.modifier.allows_free_removal(),
            None => false,
        }
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanvasEdge, EntityNode, RelationDef};
    use serde_json::Map;

    fn make_models() -> Vec<ServiceModel> {
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
                    lower_limit: 1,
                    upper_limit: 1,
                    modifier: Modifier::ReadWrite,
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

    fn graph_with(nodes: &[&str]) -> CanvasGraph {
        let mut graph = CanvasGraph::new();
        for name in nodes {
            graph
                .insert(EntityNode::core(NodeId::from(*name), name, name, Map::new()))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_lookup_is_symmetric() {
        let table = ConnectionRuleTable::derive(&make_models());
        assert!(table.rule_between("database", "backup").is_some());
        assert!(table.rule_between("backup", "database").is_some());
        assert!(table.rule_between("backup", "nonexistent").is_none());
    }

    #[test]
    fn test_embedded_rules_are_keyed_by_definition_name() {
        let table = ConnectionRuleTable::derive(&make_models());
        let rule = table.rule_between("database", "tablespace").unwrap();
        assert_eq!(rule.kind, EdgeKind::Embedding);
    }

    #[test]
    fn test_self_loop_always_denied() {
        let table = ConnectionRuleTable::derive(&make_models());
        let graph = graph_with(&["database"]);
        let id = NodeId::from("database");
        assert!(!can_connect(&graph, &table, &id, &id));
    }

    #[test]
    fn test_duplicate_edge_denied() {
        let table = ConnectionRuleTable::derive(&make_models());
        let mut graph = graph_with(&["database", "backup"]);
        let a = NodeId::from("database");
        let b = NodeId::from("backup");

        assert!(can_connect(&graph, &table, &a, &b));
        graph.connect(&a, &b, CanvasEdge::relation(true)).unwrap();
        assert!(!can_connect(&graph, &table, &a, &b));
        // Also denied in the reverse direction
        assert!(!can_connect(&graph, &table, &b, &a));
    }

    #[test]
    fn test_no_rule_denied() {
        let table = ConnectionRuleTable::derive(&make_models());
        let graph = graph_with(&["backup", "unrelated"]);
        assert!(!can_connect(
            &graph,
            &table,
            &NodeId::from("backup"),
            &NodeId::from("unrelated")
        ));
    }

    #[test]
    fn test_edit_blocked_requires_free_modifier() {
        let mut models = make_models();
        let table = ConnectionRuleTable::derive(&models);
        let mut graph = graph_with(&["database"]);
        graph
            .insert(EntityNode::related(
                NodeId::from("backup"),
                "backup",
                "backup",
                Map::new(),
            ))
            .unwrap();

        let a = NodeId::from("database");
        let b = NodeId::from("backup");
        // Related nodes are edit-blocked and the rule is plain rw.
        assert!(!can_connect(&graph, &table, &a, &b));

        // With an rw+ rule the same pair connects.
        models[0].inter_service_relations[0].modifier = Modifier::ReadWriteRemovable;
        let table = ConnectionRuleTable::derive(&models);
        assert!(can_connect(&graph, &table, &a, &b));
    }

    #[test]
    fn test_embedding_rule_never_allows_a_user_connection() {
        let table = ConnectionRuleTable::derive(&make_models());
        let mut graph = graph_with(&["database"]);
        // A tablespace owned by some other core.
        graph
            .insert(EntityNode::embedded(
                NodeId::from("other/tablespace[0]"),
                "tablespace",
                NodeId::from("other"),
                Map::new(),
                true,
                true,
            ))
            .unwrap();

        // The database -> tablespace rule is an embedding rule; it must not
        // open the pair up for a drag-to-connect relation.
        assert!(!can_connect(
            &graph,
            &table,
            &NodeId::from("database"),
            &NodeId::from("other/tablespace[0]")
        ));
        assert!(table.relation_rule_between("database", "tablespace").is_none());
    }

    #[test]
    fn test_removal_gating() {
        let table = ConnectionRuleTable::derive(&make_models());
        let mut graph = graph_with(&["database", "backup"]);
        let a = NodeId::from("database");
        let b = NodeId::from("backup");

        graph.connect(&a, &b, CanvasEdge::relation(true)).unwrap();
        assert!(can_remove(&graph, &table, &a, &b));

        graph.remove_edge_between(&a, &b);
        graph.connect(&a, &b, CanvasEdge::relation(false)).unwrap();
        assert!(!can_remove(&graph, &table, &a, &b));
    }

    #[test]
    fn test_embedding_edges_never_removable() {
        let table = ConnectionRuleTable::derive(&make_models());
        let mut graph = graph_with(&["database"]);
        graph
            .insert(EntityNode::embedded(
                NodeId::from("database/tablespace[0]"),
                "tablespace",
                NodeId::from("database"),
                Map::new(),
                true,
                true,
            ))
            .unwrap();
        let a = NodeId::from("database");
        let b = NodeId::from("database/tablespace[0]");
        graph.connect(&a, &b, CanvasEdge::embedding(true)).unwrap();

        assert!(!can_remove(&graph, &table, &a, &b));
    }
}
