//! GraphSnapshot: the complete, internally consistent graph state

use super::layer::{Layer, LayerId};
use super::link::GraphLink;
use super::node::GraphNode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Errors that can occur in graph operations
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("link '{relation_type}' references unknown node: {endpoint}")]
    DanglingLink {
        endpoint: String,
        relation_type: String,
    },

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Snapshot summary counts, used by the CLI and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotStats {
    pub nodes: usize,
    pub links: usize,
    pub layers: usize,
    pub inter_layer_links: usize,
}

/// The complete graph state at one point in time.
///
/// Invariants, enforced by the merge engine before a snapshot is published:
/// - every link endpoint resolves to a node in `nodes`
/// - `tag_index` is fully derived from `nodes`, rebuilt on every merge
/// - every node's `layer_id` refers to a layer in `layers`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub layers: Vec<Layer>,
    /// Tag name → names of nodes carrying that tag, in node order
    pub tag_index: BTreeMap<String, Vec<String>>,
}

impl GraphSnapshot {
    /// An empty snapshot with no layers.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Look up a node by its name (exact, case-sensitive).
    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    /// Look up a layer by id.
    pub fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    /// Check that every link endpoint resolves to a node in this snapshot.
    ///
    /// The first dangling endpoint fails the whole snapshot; callers must
    /// not publish a snapshot that fails this check.
    pub fn validate_links(&self) -> GraphResult<()> {
        let names: HashSet<&str> = self.nodes.iter().map(|n| n.name.as_str()).collect();
        for link in &self.links {
            for endpoint in [&link.source, &link.target] {
                if !names.contains(endpoint.name()) {
                    return Err(GraphError::DanglingLink {
                        endpoint: endpoint.name().to_string(),
                        relation_type: link.relation_type.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Rebuild `tag_index` from scratch off the current node set.
    ///
    /// Never patched incrementally — node order determines entry order.
    pub fn rebuild_tag_index(&mut self) {
        let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for node in &self.nodes {
            for tag in &node.tags {
                index
                    .entry(tag.name.clone())
                    .or_default()
                    .push(node.name.clone());
            }
        }
        self.tag_index = index;
    }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            nodes: self.nodes.len(),
            links: self.links.len(),
            layers: self.layers.len(),
            inter_layer_links: self.links.iter().filter(|l| l.is_inter_layer).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_validates() {
        let snapshot = GraphSnapshot::empty();
        assert!(snapshot.validate_links().is_ok());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn dangling_link_fails_validation() {
        let mut snapshot = GraphSnapshot::empty();
        snapshot.nodes.push(GraphNode::new("A", "Project"));
        snapshot.links.push(GraphLink::by_name("A", "Ghost", "haunts"));

        let err = snapshot.validate_links().unwrap_err();
        match err {
            GraphError::DanglingLink { endpoint, relation_type } => {
                assert_eq!(endpoint, "Ghost");
                assert_eq!(relation_type, "haunts");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tag_index_rebuilds_from_nodes() {
        use crate::graph::{Tag, TagCategory};

        let mut snapshot = GraphSnapshot::empty();
        let mut a = GraphNode::new("A", "Project");
        a.tags.push(Tag::new("rust", TagCategory::KeywordDerived, 5));
        let mut b = GraphNode::new("B", "Project");
        b.tags.push(Tag::new("rust", TagCategory::KeywordDerived, 5));
        b.tags.push(Tag::new("async", TagCategory::KeywordDerived, 5));
        snapshot.nodes.push(a);
        snapshot.nodes.push(b);

        snapshot.rebuild_tag_index();
        assert_eq!(snapshot.tag_index["rust"], vec!["A", "B"]);
        assert_eq!(snapshot.tag_index["async"], vec!["B"]);

        // Rebuild after node removal drops stale entries
        snapshot.nodes.retain(|n| n.name != "B");
        snapshot.rebuild_tag_index();
        assert_eq!(snapshot.tag_index["rust"], vec!["A"]);
        assert!(!snapshot.tag_index.contains_key("async"));
    }
}
