//! Core graph data structures

mod layer;
mod link;
mod node;
mod snapshot;

pub use layer::{Layer, LayerId};
pub use link::{GraphLink, LinkEndpoint, LinkKey};
pub use node::{GraphNode, NodeMetadata, Tag, TagCategory};
pub use snapshot::{GraphError, GraphResult, GraphSnapshot, SnapshotStats};
