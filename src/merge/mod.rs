//! Graph merge engine — folds extracted fragments into a running snapshot
//!
//! Merging is consistency-over-incremental-efficiency by design: after the
//! node and link unions, layers are fully regenerated over the merged node
//! set, every link's derived fields are recomputed, and the tag index is
//! rebuilt from scratch. A snapshot that fails endpoint validation is
//! rejected wholesale — the caller's previous snapshot stays authoritative.

use crate::extract::ExtractedFragment;
use crate::graph::{
    GraphError, GraphLink, GraphNode, GraphResult, GraphSnapshot, LinkKey, TagCategory,
};
use crate::layers::LayerEngine;
use crate::mining::TagMiner;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Upper bound on the `keywords` metadata list.
const MAX_KEYWORDS: usize = 10;

/// Tag weight threshold that counts toward node importance.
const STRONG_TAG_WEIGHT: u8 = 7;

/// Merges incoming graph fragments into snapshots.
///
/// Holds the tag miner and layer engine so every merge recomputes derived
/// data with one consistent configuration.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    miner: TagMiner,
    layers: LayerEngine,
}

impl MergeEngine {
    pub fn new(miner: TagMiner, layers: LayerEngine) -> Self {
        Self { miner, layers }
    }

    pub fn miner(&self) -> &TagMiner {
        &self.miner
    }

    /// Build an (unenriched) snapshot from an extracted fragment.
    ///
    /// Duplicate entity names within one fragment union their observations,
    /// first-seen order preserved. Links stay unresolved until merge.
    pub fn snapshot_from_fragment(&self, fragment: &ExtractedFragment) -> GraphSnapshot {
        let mut order: Vec<String> = Vec::new();
        let mut by_name: HashMap<String, GraphNode> = HashMap::new();

        for entity in &fragment.entities {
            match by_name.get_mut(&entity.name) {
                Some(node) => {
                    for obs in &entity.observations {
                        if !node.observations.contains(obs) {
                            node.observations.push(obs.clone());
                        }
                    }
                }
                None => {
                    order.push(entity.name.clone());
                    by_name.insert(
                        entity.name.clone(),
                        GraphNode::new(&entity.name, &entity.entity_type)
                            .with_observations(entity.observations.clone()),
                    );
                }
            }
        }

        let mut nodes: Vec<GraphNode> = order
            .into_iter()
            .map(|name| by_name.remove(&name).expect("ordered name present"))
            .collect();
        for node in &mut nodes {
            node.tags = self.miner.mine(&node.observation_text(), &node.node_type);
        }

        let links = fragment
            .relations
            .iter()
            .map(|r| GraphLink::by_name(&r.source, &r.target, &r.relation_type))
            .collect();

        GraphSnapshot {
            nodes,
            links,
            layers: Vec::new(),
            tag_index: Default::default(),
        }
    }

    /// Extract-then-merge convenience used by the ingestion pipeline.
    pub fn ingest_fragment(
        &self,
        existing: &GraphSnapshot,
        fragment: &ExtractedFragment,
    ) -> GraphResult<GraphSnapshot> {
        let incoming = self.snapshot_from_fragment(fragment);
        self.merge(existing, &incoming)
    }

    /// Fold `incoming` into `existing`, producing a fresh validated snapshot.
    ///
    /// Node merge: observation lists union with duplicate removal in
    /// first-seen order; tags and metadata are recomputed from the unioned
    /// text (stale tags from removed text cannot survive); `created_at` is
    /// preserved and `updated_at` advances only when observations actually
    /// changed. Link merge: union by identity triple, existing wins.
    pub fn merge(
        &self,
        existing: &GraphSnapshot,
        incoming: &GraphSnapshot,
    ) -> GraphResult<GraphSnapshot> {
        // --- Node union ---
        let mut order: Vec<String> = Vec::new();
        let mut by_name: HashMap<String, GraphNode> = HashMap::new();
        for node in &existing.nodes {
            order.push(node.name.clone());
            by_name.insert(node.name.clone(), node.clone());
        }

        for inc in &incoming.nodes {
            match by_name.get_mut(&inc.name) {
                Some(cur) => {
                    let mut changed = false;
                    for obs in &inc.observations {
                        if !cur.observations.contains(obs) {
                            cur.observations.push(obs.clone());
                            changed = true;
                        }
                    }
                    if changed {
                        cur.tags = self.miner.mine(&cur.observation_text(), &cur.node_type);
                        cur.metadata.updated_at = Utc::now();
                    }
                }
                None => {
                    order.push(inc.name.clone());
                    by_name.insert(inc.name.clone(), inc.clone());
                }
            }
        }

        let mut nodes: Vec<GraphNode> = order
            .into_iter()
            .map(|name| by_name.remove(&name).expect("ordered name present"))
            .collect();

        // --- Link union: existing wins on exact-triple collision ---
        let mut keys: HashSet<LinkKey> = HashSet::new();
        let mut links: Vec<GraphLink> = Vec::new();
        for link in existing.links.iter().chain(incoming.links.iter()) {
            if keys.insert(link.key()) {
                links.push(link.clone());
            }
        }

        // --- Endpoint validation, before anything is published ---
        let names: HashSet<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        for link in &links {
            for endpoint in [&link.source, &link.target] {
                if !names.contains(endpoint.name()) {
                    warn!(
                        endpoint = endpoint.name(),
                        relation = %link.relation_type,
                        "merge rejected: dangling link endpoint"
                    );
                    return Err(GraphError::DanglingLink {
                        endpoint: endpoint.name().to_string(),
                        relation_type: link.relation_type.clone(),
                    });
                }
            }
        }
        for link in &mut links {
            link.source.resolve();
            link.target.resolve();
        }

        // --- Full regeneration of derived state ---
        let layers = self.layers.assign(&mut nodes);
        self.enrich_links(&mut links, &nodes);
        self.recompute_metadata(&mut nodes, &links);

        let mut merged = GraphSnapshot {
            nodes,
            links,
            layers,
            tag_index: Default::default(),
        };
        merged.rebuild_tag_index();

        debug!(
            nodes = merged.nodes.len(),
            links = merged.links.len(),
            layers = merged.layers.len(),
            "merge complete"
        );
        Ok(merged)
    }

    /// Recompute each link's derived fields from its (resolved) endpoints.
    fn enrich_links(&self, links: &mut [GraphLink], nodes: &[GraphNode]) {
        let by_name: HashMap<&str, &GraphNode> =
            nodes.iter().map(|n| (n.name.as_str(), n)).collect();

        for link in links {
            let source = by_name[link.source.name()];
            let target = by_name[link.target.name()];

            link.is_inter_layer = source.layer_id != target.layer_id;
            // Shared tag names in the source node's tag order
            let shared: Vec<String> = source
                .tags
                .iter()
                .filter(|t| target.has_tag(&t.name))
                .map(|t| t.name.clone())
                .collect();
            link.strength = (shared.len() as u8).clamp(1, 10);
            link.tags = shared;
        }
    }

    /// Recompute importance, keyword list, and connection strength.
    fn recompute_metadata(&self, nodes: &mut [GraphNode], links: &[GraphLink]) {
        let mut degree: HashMap<&str, usize> = HashMap::new();
        for link in links {
            *degree.entry(link.source.name()).or_insert(0) += 1;
            *degree.entry(link.target.name()).or_insert(0) += 1;
        }

        for node in nodes {
            let strong = node
                .tags
                .iter()
                .filter(|t| t.weight >= STRONG_TAG_WEIGHT)
                .count();
            node.metadata.importance =
                (node.observations.len() + strong + 1).clamp(1, 10) as u8;

            let mut keyword_tags: Vec<(&String, u8)> = node
                .tags
                .iter()
                .filter(|t| t.category == TagCategory::KeywordDerived)
                .map(|t| (&t.name, t.weight))
                .collect();
            keyword_tags.sort_by(|a, b| b.1.cmp(&a.1));
            node.metadata.keywords = keyword_tags
                .into_iter()
                .take(MAX_KEYWORDS)
                .map(|(name, _)| name.clone())
                .collect();

            node.metadata.connection_strength =
                (*degree.get(node.name.as_str()).unwrap_or(&0)).min(10) as u8;
        }
    }
}
