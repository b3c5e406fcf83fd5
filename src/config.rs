use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Canvas-wide tuning knobs. Hosts usually take the defaults; deployments
/// that need different spacing or loose-element semantics load a TOML
/// fragment.
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    pub layout: LayoutConfig,
    pub loose_policy: LoosePolicy,
    /// Names beginning with this marker are treated as private entities and
    /// never surfaced in hover labels.
    pub private_marker: String,
}

#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub node_separation: f64,
    pub rank_separation: f64,
    /// Downward nudge applied per collision-resolution step.
    pub collision_shift: f64,
}

/// Policy deciding when a node is flagged as a loose element after a
/// disconnect. The observed console behavior is `ExactlyOneRemaining`;
/// `BelowLowerBound` follows the schema's declared cardinality instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoosePolicy {
    ExactlyOneRemaining,
    BelowLowerBound,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    layout: Option<RawLayout>,
    loose_policy: Option<LoosePolicy>,
    private_marker: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawLayout {
    node_width: Option<f64>,
    node_height: Option<f64>,
    node_separation: Option<f64>,
    rank_separation: Option<f64>,
    collision_shift: Option<f64>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            loose_policy: LoosePolicy::ExactlyOneRemaining,
            private_marker: "_".to_string(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 100.0,
            node_height: 60.0,
            node_separation: 40.0,
            rank_separation: 80.0,
            collision_shift: 20.0,
        }
    }
}

impl CanvasConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let layout = match raw.layout {
            Some(l) => {
                let d = LayoutConfig::default();
                LayoutConfig {
                    node_width: l.node_width.unwrap_or(d.node_width),
                    node_height: l.node_height.unwrap_or(d.node_height),
                    node_separation: l.node_separation.unwrap_or(d.node_separation),
                    rank_separation: l.rank_separation.unwrap_or(d.rank_separation),
                    // Collision resolution only terminates with a strictly
                    // positive shift.
                    collision_shift: l
                        .collision_shift
                        .filter(|v| *v > 0.0)
                        .unwrap_or(d.collision_shift),
                }
            }
            None => LayoutConfig::default(),
        };

        Ok(Self {
            layout,
            loose_policy: raw.loose_policy.unwrap_or(defaults.loose_policy),
            private_marker: raw.private_marker.unwrap_or(defaults.private_marker),
        })
    }
}
