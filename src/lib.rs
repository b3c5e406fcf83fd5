pub mod append;
pub mod canvas;
pub mod config;
pub mod error;
pub mod events;
pub mod graph;
pub mod interact;
pub mod layout;
pub mod model;
pub mod relations;
pub mod rules;

pub use append::AppendReport;
pub use canvas::Canvas;
pub use config::{CanvasConfig, ConfigError, LayoutConfig, LoosePolicy};
pub use error::CanvasError;
pub use events::{CanvasEvent, LooseAction, NotificationBus, OrderAction, StencilAction};
pub use graph::CanvasGraph;
pub use interact::{Halo, LinkHover};
pub use model::{
    AttributeHolder, CanvasEdge, Connectable, EdgeKind, EmbeddedEntityDef, EntityNode, Instance,
    InstanceWithRelations, Modifier, NodeId, NodeKind, Positionable, RelationDef, ServiceModel,
};
pub use relations::{LooseChange, RelationRequirement, RelationTracker};
pub use rules::{ConnectionRule, ConnectionRuleTable, can_connect, can_remove};
