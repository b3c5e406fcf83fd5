use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Ownership edge from an owner node to one of its embedded sub-entities.
    /// Created only as a byproduct of entity construction.
    Embedding,
    /// Typed inter-entity relation; created and removed through the
    /// connection validator.
    Relation,
}

/// Edge weight stored in the canvas graph; endpoints are implied by the
/// graph structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasEdge {
    pub kind: EdgeKind,
    pub removable: bool,
}

impl CanvasEdge {
    pub fn embedding(removable: bool) -> Self {
        Self {
            kind: EdgeKind::Embedding,
            removable,
        }
    }

    pub fn relation(removable: bool) -> Self {
        Self {
            kind: EdgeKind::Relation,
            removable,
        }
    }
}
