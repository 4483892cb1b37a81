//! Node representation in the knowledge graph

use super::layer::LayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a tag was derived from node content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagCategory {
    /// Extracted verbatim from a marker-prefixed token (e.g. `#deadline`)
    ExplicitMarker,
    /// Slug of the entity's type string
    TypeDerived,
    /// Mined from observation text
    KeywordDerived,
}

/// A derived categorical label on a node.
///
/// `name` is always lowercased; `weight` is clamped to 1..=10.
/// `color` is a presentation hint, opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub category: TagCategory,
    pub weight: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>, category: TagCategory, weight: u8) -> Self {
        Self {
            name: name.into(),
            category,
            weight: weight.clamp(1, 10),
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Derived node metadata, recomputed on every merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    /// When the node first entered the graph
    pub created_at: DateTime<Utc>,
    /// When the node's observations last changed
    pub updated_at: DateTime<Utc>,
    /// Overall importance, 1..=10
    pub importance: u8,
    /// Top keyword-derived tag names, bounded
    pub keywords: Vec<String>,
    /// Link degree, clamped to 0..=10
    pub connection_strength: u8,
}

impl NodeMetadata {
    pub fn stamped_now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            importance: 1,
            keywords: Vec::new(),
            connection_strength: 0,
        }
    }
}

/// A node in the graph snapshot.
///
/// Identity is the `name` string — case-sensitive, exact match.
/// `tags` are deduplicated by tag name (first occurrence wins) and
/// `layer_id` always refers to a layer present in the same snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    pub observations: Vec<String>,
    pub tags: Vec<Tag>,
    pub metadata: NodeMetadata,
    pub layer_id: LayerId,
}

impl GraphNode {
    /// Create a node with no tags, assigned to the default layer.
    pub fn new(name: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
            observations: Vec::new(),
            tags: Vec::new(),
            metadata: NodeMetadata::stamped_now(),
            layer_id: LayerId::default_layer(),
        }
    }

    pub fn with_observations(mut self, observations: Vec<String>) -> Self {
        self.observations = observations;
        self
    }

    /// All observation text joined for mining, newline-separated.
    pub fn observation_text(&self) -> String {
        self.observations.join("\n")
    }

    /// Tag names in tag order.
    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.name.as_str())
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_weight_is_clamped() {
        let tag = Tag::new("huge", TagCategory::KeywordDerived, 14);
        assert_eq!(tag.weight, 10);
        let tag = Tag::new("tiny", TagCategory::KeywordDerived, 0);
        assert_eq!(tag.weight, 1);
    }

    #[test]
    fn new_node_lands_in_default_layer() {
        let node = GraphNode::new("A", "Project");
        assert_eq!(node.layer_id, LayerId::default_layer());
        assert!(node.tags.is_empty());
    }

    #[test]
    fn observation_text_joins_with_newlines() {
        let node = GraphNode::new("A", "Project")
            .with_observations(vec!["first".into(), "second".into()]);
        assert_eq!(node.observation_text(), "first\nsecond");
    }
}
