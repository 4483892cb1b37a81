//! Layer discovery and node assignment
//!
//! Layers are strata of the graph, discovered from high-weight tags shared
//! across nodes. Membership and depth ordering are functions of the entire
//! current node population, so assignment is always a full recompute — never
//! an incremental patch — whenever the node set changes.

use crate::graph::{GraphNode, Layer, LayerId};
use std::collections::HashMap;
use tracing::debug;

/// Minimum tag weight for a tag to seed a layer.
const LAYER_TAG_WEIGHT: u8 = 7;

/// Minimum distinct nodes carrying a tag for it to seed a layer.
const LAYER_MIN_NODES: usize = 2;

/// Immutable layer-engine configuration, injected at construction.
#[derive(Debug, Clone)]
pub struct LayerConfig {
    /// Depth step between consecutive layers; the default layer sits one
    /// step below zero
    pub depth_spacing: f64,
    /// Colors cycled across discovered layers
    pub palette: Vec<String>,
    /// Color of the default layer
    pub default_color: String,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            depth_spacing: 100.0,
            palette: vec![
                "#e63946".to_string(),
                "#f4a261".to_string(),
                "#2a9d8f".to_string(),
                "#457b9d".to_string(),
                "#9b5de5".to_string(),
                "#f15bb5".to_string(),
            ],
            default_color: "#6c757d".to_string(),
        }
    }
}

/// Clusters tags into layers and assigns every node its single best fit.
#[derive(Debug, Clone, Default)]
pub struct LayerEngine {
    config: LayerConfig,
}

impl LayerEngine {
    pub fn new(config: LayerConfig) -> Self {
        Self { config }
    }

    /// Discover layers from the node population and assign each node to
    /// exactly one. Mutates `layer_id` on every node and returns the layer
    /// set, default layer first, then discovered layers in depth order.
    pub fn assign(&self, nodes: &mut [GraphNode]) -> Vec<Layer> {
        let mut layers = self.discover(nodes);

        // Route each node to the layer of its highest-weight matching tag.
        // Ties keep the first match in the node's tag order; no match falls
        // through to the default layer at index 0.
        let by_tag: HashMap<String, usize> = layers
            .iter()
            .enumerate()
            .flat_map(|(i, layer)| layer.member_tag_names.iter().map(move |t| (t.clone(), i)))
            .collect();

        for node in nodes.iter_mut() {
            let mut chosen = 0usize;
            let mut best_weight = 0u8;
            for tag in &node.tags {
                if let Some(&idx) = by_tag.get(tag.name.as_str()) {
                    if tag.weight > best_weight {
                        best_weight = tag.weight;
                        chosen = idx;
                    }
                }
            }
            node.layer_id = layers[chosen].id.clone();
            layers[chosen].node_count += 1;
        }

        debug!(
            layers = layers.len() - 1,
            nodes = nodes.len(),
            "layer assignment complete"
        );
        layers
    }

    /// Discovery pass: one layer per distinct tag name with weight >= 7
    /// carried by at least 2 distinct nodes. Ordered by descending node
    /// count, ties broken by first-discovered order; depths step up from 0.
    fn discover(&self, nodes: &[GraphNode]) -> Vec<Layer> {
        let mut discovery_order: Vec<String> = Vec::new();
        let mut carriers: HashMap<String, usize> = HashMap::new();

        for node in nodes {
            // A node's tags are already deduplicated by name, so each node
            // contributes at most once per tag
            for tag in &node.tags {
                if tag.weight < LAYER_TAG_WEIGHT {
                    continue;
                }
                let count = carriers.entry(tag.name.clone()).or_insert(0);
                if *count == 0 {
                    discovery_order.push(tag.name.clone());
                }
                *count += 1;
            }
        }

        let mut seeds: Vec<(usize, String, usize)> = discovery_order
            .into_iter()
            .enumerate()
            .filter_map(|(discovered, name)| {
                let count = carriers[&name];
                (count >= LAYER_MIN_NODES).then_some((discovered, name, count))
            })
            .collect();
        // Descending node count, ties broken by first-discovered order
        seeds.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));

        let mut layers = Vec::with_capacity(seeds.len() + 1);
        layers.push(Layer::fallback(
            -self.config.depth_spacing,
            self.config.default_color.clone(),
        ));
        for (i, (_, tag_name, _)) in seeds.into_iter().enumerate() {
            let depth = i as f64 * self.config.depth_spacing;
            let color = self.config.palette[i % self.config.palette.len()].clone();
            layers.push(Layer::for_tag(&tag_name, depth, color));
        }
        layers
    }
}
