//! Link representation — directed labeled edges between named nodes

use serde::{Deserialize, Serialize};

/// One end of a link.
///
/// Endpoints arrive from the producer as bare names and are resolved
/// exactly once, during merge validation. Code past that boundary can
/// rely on `Resolved` and never re-checks the node set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "state", content = "name", rename_all = "lowercase")]
pub enum LinkEndpoint {
    /// Raw name as supplied, not yet checked against the node set
    ByName(String),
    /// Name verified to resolve to a node in the same snapshot
    Resolved(String),
}

impl LinkEndpoint {
    pub fn name(&self) -> &str {
        match self {
            Self::ByName(n) | Self::Resolved(n) => n,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Mark this endpoint as resolved, keeping the name.
    pub fn resolve(&mut self) {
        if let Self::ByName(n) = self {
            *self = Self::Resolved(std::mem::take(n));
        }
    }
}

/// A directed labeled edge in the snapshot.
///
/// Identity is the (source, target, relation_type) triple; duplicates
/// by this triple collapse to one, existing wins. `strength` and `tags`
/// are derived from the endpoints' shared tags on every merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: LinkEndpoint,
    pub target: LinkEndpoint,
    pub relation_type: String,
    /// True if the endpoints resolve to different layers
    pub is_inter_layer: bool,
    /// Count of tags shared by the endpoints, clamped 1..=10
    pub strength: u8,
    /// The shared tag names
    pub tags: Vec<String>,
}

impl GraphLink {
    /// Create an unresolved link with default derived fields.
    pub fn by_name(
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: impl Into<String>,
    ) -> Self {
        Self {
            source: LinkEndpoint::ByName(source.into()),
            target: LinkEndpoint::ByName(target.into()),
            relation_type: relation_type.into(),
            is_inter_layer: false,
            strength: 1,
            tags: Vec::new(),
        }
    }

    /// The identity triple used for deduplication.
    pub fn key(&self) -> LinkKey {
        LinkKey {
            source: self.source.name().to_string(),
            target: self.target.name().to_string(),
            relation_type: self.relation_type.clone(),
        }
    }
}

/// Key for deduplicating links by their identity triple.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct LinkKey {
    pub source: String,
    pub target: String,
    pub relation_type: String,
}
