use crate::config::ConfigError;
use crate::model::NodeId;
use thiserror::Error;

/// Errors surfaced by canvas operations.
///
/// Validation denials (illegal connection, blocked removal) are not errors —
/// they are ordinary `false`/no-op outcomes of the connection validator.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// No service model matches an instance's declared type. Fatal to the
    /// whole append: no partial graph is committed.
    #[error("No service model found for type: {0}")]
    UnknownServiceModel(String),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
