//! Transport-independent API layer.
//!
//! `GanglionApi` is the single entry point for consumers: the rendering
//! layer calls `load_full_graph`, `find_nodes`, and `ingest`, and observes
//! results through the update notifier. Transports never reach into the
//! merge engine or cache directly.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{ReadStrategy, SnapshotCache, FULL_GRAPH_KEY};
use crate::extract::{extract_fragment, ToolBlock};
use crate::graph::{GraphError, GraphNode, GraphSnapshot};
use crate::merge::MergeEngine;
use crate::notify::{GraphUpdate, UpdateNotifier};

/// The remote producer failed to answer at all.
///
/// A producer that answers but returns no structured data is not an error;
/// that extraction degrades to a valid empty fragment.
#[derive(Debug, Clone, Error)]
#[error("graph source unavailable: {0}")]
pub struct SourceError(pub String);

/// Errors surfaced to API callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The only failure class a merge propagates: publishing the result
    /// would violate a snapshot invariant. The last good snapshot stays
    /// cached and queryable.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// The outbound boundary to the remote tool-result producer.
///
/// How requests are formed, retried, or transported is outside this core;
/// only the returned block contract matters here.
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Ask the producer for the whole graph.
    async fn read_graph(&self) -> Result<Vec<ToolBlock>, SourceError>;

    /// Ask the producer for specific named entities.
    async fn open_nodes(&self, names: &[String]) -> Result<Vec<ToolBlock>, SourceError>;
}

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct GanglionApi {
    source: Arc<dyn GraphSource>,
    merge: Arc<MergeEngine>,
    cache: Arc<SnapshotCache>,
    notifier: UpdateNotifier,
}

impl GanglionApi {
    pub fn new(
        source: Arc<dyn GraphSource>,
        merge: MergeEngine,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        Self {
            source,
            merge: Arc::new(merge),
            cache,
            notifier: UpdateNotifier::default(),
        }
    }

    /// Subscribe to snapshot-replaced and subset-highlighted updates.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<GraphUpdate> {
        self.notifier.subscribe()
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Load the full graph snapshot under the caller's freshness policy.
    pub async fn load_full_graph(
        &self,
        strategy: ReadStrategy,
    ) -> Result<GraphSnapshot, ApiError> {
        match strategy {
            ReadStrategy::CacheFirst => {
                if let Some(snapshot) = self.cache.get(FULL_GRAPH_KEY) {
                    return Ok(snapshot);
                }
                self.refresh_full_graph().await
            }
            ReadStrategy::NetworkFirst => self.refresh_full_graph().await,
            ReadStrategy::StaleWhileRevalidate => {
                match self.cache.get(FULL_GRAPH_KEY) {
                    Some(snapshot) => {
                        // Hand the stale value back now; the refresh races
                        // under a version stamp and loses cleanly if a newer
                        // write lands first
                        let api = self.clone();
                        tokio::spawn(async move {
                            if let Err(e) = api.refresh_full_graph().await {
                                warn!(error = %e, "background revalidation failed");
                            }
                        });
                        Ok(snapshot)
                    }
                    None => self.refresh_full_graph().await,
                }
            }
        }
    }

    /// Look up specific nodes by name, merging whatever the producer
    /// returns and highlighting the names that resolved.
    pub async fn find_nodes(&self, names: &[String]) -> Result<Vec<GraphNode>, ApiError> {
        let stamp = self.cache.next_version();
        let blocks = self.source.open_nodes(names).await?;
        let merged = self.merge_blocks(&blocks, stamp)?;

        let found: Vec<GraphNode> = names
            .iter()
            .filter_map(|name| merged.node(name).cloned())
            .collect();
        let found_names: Vec<String> = found.iter().map(|n| n.name.clone()).collect();
        self.notifier.nodes_highlighted(&found_names);
        Ok(found)
    }

    /// Ingest raw tool blocks directly (one ingestion event end to end).
    pub async fn ingest(&self, blocks: &[ToolBlock]) -> Result<GraphSnapshot, ApiError> {
        let stamp = self.cache.next_version();
        self.merge_blocks(blocks, stamp)
    }

    async fn refresh_full_graph(&self) -> Result<GraphSnapshot, ApiError> {
        // Stamp before the fetch, so a fetch that outlives a later write
        // commits as a no-op instead of clobbering the newer value
        let stamp = self.cache.next_version();
        let blocks = self.source.read_graph().await?;
        self.merge_blocks(&blocks, stamp)
    }

    /// Extract → merge → cache → notify, the single ingestion pipeline.
    fn merge_blocks(&self, blocks: &[ToolBlock], stamp: u64) -> Result<GraphSnapshot, ApiError> {
        // No structured data is a legitimate empty result (capability
        // absence), merged as such
        let fragment = extract_fragment(blocks).unwrap_or_default();
        let existing = self.cache.get(FULL_GRAPH_KEY).unwrap_or_default();
        let merged = self.merge.ingest_fragment(&existing, &fragment)?;

        if self.cache.commit(FULL_GRAPH_KEY, merged.clone(), stamp) {
            info!(
                nodes = merged.nodes.len(),
                links = merged.links.len(),
                "snapshot replaced"
            );
            self.notifier
                .snapshot_replaced(FULL_GRAPH_KEY, Arc::new(merged.clone()));
        }
        Ok(merged)
    }
}
