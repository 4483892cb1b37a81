//! Ganglion: Graph Ingestion, Enrichment, and Synchronization Engine
//!
//! Takes irregular, free-text tool output from an external graph-memory
//! service, extracts structured entities and relations, enriches them with
//! derived tags, importance, and layers, merges them into a running graph
//! snapshot without losing history, and serves that snapshot through a
//! cache with selectable freshness policies.
//!
//! # Pipeline
//!
//! Extraction → tag mining → layer assignment → merge → cache → notify,
//! one direction, one logical pipeline per ingestion event.
//!
//! # Example
//!
//! ```
//! use ganglion::{extract_from_text, MergeEngine, GraphSnapshot};
//!
//! let engine = MergeEngine::default();
//! let fragment = extract_from_text(
//!     r#"{"entities":[{"name":"A","type":"Project","observations":["root #x"]}]}"#,
//! ).unwrap();
//! let snapshot = engine.ingest_fragment(&GraphSnapshot::empty(), &fragment).unwrap();
//! assert!(snapshot.node("A").unwrap().has_tag("x"));
//! ```

mod api;
pub mod cache;
pub mod extract;
mod graph;
pub mod layers;
pub mod merge;
pub mod mining;
pub mod notify;

pub use api::{ApiError, GanglionApi, GraphSource, SourceError};
pub use cache::{
    CacheConfig, CacheMetrics, ReadStrategy, SnapshotCache, FILTERED_GRAPH_KEY, FULL_GRAPH_KEY,
    SEARCH_RESULTS_KEY,
};
pub use extract::{
    extract_fragment, extract_from_text, EntityRecord, ExtractedFragment, RelationRecord,
    ToolBlock,
};
pub use graph::{
    GraphError, GraphLink, GraphNode, GraphResult, GraphSnapshot, Layer, LayerId, LinkEndpoint,
    LinkKey, NodeMetadata, SnapshotStats, Tag, TagCategory,
};
pub use layers::{LayerConfig, LayerEngine};
pub use merge::MergeEngine;
pub use mining::{MinerConfig, TagMiner};
pub use notify::{GraphUpdate, UpdateNotifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
