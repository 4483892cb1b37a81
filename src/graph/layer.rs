//! Layer: a named stratum of nodes sharing high-weight tags

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique identifier for a layer
///
/// Serializes as a plain string ("layer:default" or "layer:<tag-name>")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(String);

impl LayerId {
    /// The id of the always-present fallback layer.
    pub fn default_layer() -> Self {
        Self("layer:default".to_string())
    }

    /// Id for a layer discovered from a tag name.
    pub fn from_tag(tag_name: &str) -> Self {
        Self(format!("layer:{}", tag_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A visual/semantic stratum of the graph.
///
/// Layers are discovered from high-weight tags shared across nodes
/// and fully regenerated on every merge. `node_count` is derived,
/// recomputed on every assignment pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    /// Ordering/position value; the default layer always has the lowest depth
    pub depth: f64,
    /// Tag names that route nodes into this layer; empty for the default layer
    pub member_tag_names: BTreeSet<String>,
    pub color: String,
    pub node_count: usize,
}

impl Layer {
    /// Create the fallback layer at the given depth.
    pub fn fallback(depth: f64, color: impl Into<String>) -> Self {
        Self {
            id: LayerId::default_layer(),
            name: "default".to_string(),
            depth,
            member_tag_names: BTreeSet::new(),
            color: color.into(),
            node_count: 0,
        }
    }

    /// Create a layer routed by a single tag name.
    pub fn for_tag(tag_name: &str, depth: f64, color: impl Into<String>) -> Self {
        let mut members = BTreeSet::new();
        members.insert(tag_name.to_string());
        Self {
            id: LayerId::from_tag(tag_name),
            name: tag_name.to_string(),
            depth,
            member_tag_names: members,
            color: color.into(),
            node_count: 0,
        }
    }

    pub fn contains_tag(&self, tag_name: &str) -> bool {
        self.member_tag_names.contains(tag_name)
    }
}
