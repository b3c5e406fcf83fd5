use serde::{Deserialize, Serialize};

/// Read-only description of a service type as delivered by the backend.
/// The canvas never mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceModel {
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub embedded_entities: Vec<EmbeddedEntityDef>,
    #[serde(default)]
    pub inter_service_relations: Vec<RelationDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedEntityDef {
    pub name: String,
    pub modifier: Modifier,
    #[serde(default)]
    pub embedded_entities: Vec<EmbeddedEntityDef>,
    #[serde(default)]
    pub inter_service_relations: Vec<RelationDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDef {
    pub entity_type: String,
    pub attribute_name: String,
    #[serde(default)]
    pub lower_limit: u32,
    #[serde(default = "default_upper_limit")]
    pub upper_limit: u32,
    pub modifier: Modifier,
}

fn default_upper_limit() -> u32 {
    1
}

/// Editability marker carried by embedding and relation definitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Modifier {
    /// `"r"`: the definition never materializes as an editable element.
    #[serde(rename = "r")]
    ReadOnly,
    /// `"rw"`: editable while the owning node is editable.
    #[serde(rename = "rw")]
    ReadWrite,
    /// `"rw+"`: editable and freely removable even on blocked nodes.
    #[serde(rename = "rw+")]
    ReadWriteRemovable,
}

impl Modifier {
    pub fn is_read_only(self) -> bool {
        self == Modifier::ReadOnly
    }

    pub fn allows_free_removal(self) -> bool {
        self == Modifier::ReadWriteRemovable
    }
}

impl std::fmt::Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modifier::ReadOnly => write!(f, "r"),
            Modifier::ReadWrite => write!(f, "rw"),
            Modifier::ReadWriteRemovable => write!(f, "rw+"),
        }
    }
}

impl std::str::FromStr for Modifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Modifier::ReadOnly),
            "rw" => Ok(Modifier::ReadWrite),
            "rw+" => Ok(Modifier::ReadWriteRemovable),
            _ => Err(format!("Unknown modifier: {}", s)),
        }
    }
}

impl ServiceModel {
    /// Find the model describing `type_name` in a backend-supplied model set.
    pub fn lookup<'a>(models: &'a [ServiceModel], type_name: &str) -> Option<&'a ServiceModel> {
        models.iter().find(|m| m.name == type_name)
    }
}
