mod edge;
mod entity;
mod instance;
mod schema;

pub use edge::{CanvasEdge, EdgeKind};
pub use entity::{
    AttributeHolder, Connectable, EntityNode, NodeId, NodeKind, Point, Positionable, Rect, Size,
};
pub use instance::{Instance, InstanceWithRelations};
pub use schema::{EmbeddedEntityDef, Modifier, RelationDef, ServiceModel};
