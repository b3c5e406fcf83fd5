use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One backend instance with its attribute set already resolved to the
/// candidate or active view. All asynchronous fetching happens before this
/// struct reaches the canvas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

/// Append input: the instance to place plus every other instance it is
/// related to, so relation attributes can be resolved locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceWithRelations {
    pub instance: Instance,
    #[serde(default)]
    pub inter_service_relations: Vec<Instance>,
}
