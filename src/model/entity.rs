use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Opaque node identifier. Core and related nodes reuse the backend instance
/// id; embedded nodes derive theirs from the owner id and the embedding
/// attribute. Only ids cross module boundaries — the canvas graph owns every
/// node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// Id for an embedded node: `"{owner}/{attribute}[{index}]"`.
    pub fn embedded(owner: &NodeId, attribute: &str, index: usize) -> Self {
        NodeId(format!("{}/{}[{}]", owner.0, attribute, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Primary service instance being edited.
    Core,
    /// Sub-entity owned by another node; strict tree ownership.
    Embedded,
    /// Another service instance connected through a non-owning relation.
    Related,
}

/// One node on the composition canvas.
#[derive(Debug, Clone)]
pub struct EntityNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub display_name: String,
    /// Name of the service model or embedded-entity definition this node was
    /// built from; keys the connection rule table.
    pub schema_name: String,
    pub attributes: Map<String, Value>,
    /// Owning node id; present only for `Embedded` nodes.
    pub owner: Option<NodeId>,
    /// Related node id -> relation attribute name.
    pub relations: HashMap<NodeId, String>,
    pub removable: bool,
    pub editable: bool,
    pub position: Point,
    pub size: Size,
}

impl EntityNode {
    pub fn core(id: NodeId, schema_name: &str, name: &str, attributes: Map<String, Value>) -> Self {
        Self::with_kind(id, NodeKind::Core, schema_name, name, attributes)
    }

    pub fn related(
        id: NodeId,
        schema_name: &str,
        name: &str,
        attributes: Map<String, Value>,
    ) -> Self {
        let mut node = Self::with_kind(id, NodeKind::Related, schema_name, name, attributes);
        node.editable = false;
        node
    }

    pub fn embedded(
        id: NodeId,
        schema_name: &str,
        owner: NodeId,
        attributes: Map<String, Value>,
        removable: bool,
        editable: bool,
    ) -> Self {
        let mut node = Self::with_kind(id, NodeKind::Embedded, schema_name, schema_name, attributes);
        node.owner = Some(owner);
        node.removable = removable;
        node.editable = editable;
        node
    }

    fn with_kind(
        id: NodeId,
        kind: NodeKind,
        schema_name: &str,
        name: &str,
        attributes: Map<String, Value>,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.to_string(),
            display_name: name.to_string(),
            schema_name: schema_name.to_string(),
            attributes,
            owner: None,
            relations: HashMap::new(),
            removable: true,
            editable: true,
            position: Point::default(),
            size: Size::default(),
        }
    }

    /// A node is edit-blocked when structural changes around it require the
    /// freely-editable modifier.
    pub fn is_edit_blocked(&self) -> bool {
        !self.editable
    }

    pub fn bounds(&self) -> Rect {
        Rect {
            x: self.position.x,
            y: self.position.y,
            width: self.size.width,
            height: self.size.height,
        }
    }
}

/// Placement capability a rendering adapter binds to. The canvas core holds
/// plain data records; shape classes live entirely outside it.
pub trait Positionable {
    fn position(&self) -> Point;
    fn set_position(&mut self, position: Point);
    fn size(&self) -> Size;
}

/// Connection capability: identity plus the current relation entries.
pub trait Connectable {
    fn node_id(&self) -> &NodeId;
    fn relation_to(&self, other: &NodeId) -> Option<&str>;
}

/// Attribute access for the property side panel.
pub trait AttributeHolder {
    fn attribute(&self, name: &str) -> Option<&Value>;
    fn set_attribute(&mut self, name: &str, value: Value);
}

impl Positionable for EntityNode {
    fn position(&self) -> Point {
        self.position
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn size(&self) -> Size {
        self.size
    }
}

impl Connectable for EntityNode {
    fn node_id(&self) -> &NodeId {
        &self.id
    }

    fn relation_to(&self, other: &NodeId) -> Option<&str> {
        self.relations.get(other).map(String::as_str)
    }
}

impl AttributeHolder for EntityNode {
    fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    fn set_attribute(&mut self, name: &str, value: Value) {
        self.attributes.insert(name.to_string(), value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Strict overlap test; touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}
