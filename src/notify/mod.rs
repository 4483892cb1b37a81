//! Update notifications published after merge/cache writes
//!
//! Consumers subscribe to a broadcast channel they own the receiving end
//! of; the core never depends on who is listening. Delivery is
//! fire-and-forget — a slow, lagging, or absent observer can never roll
//! back or block the merge and cache write that produced the notification.

use crate::graph::GraphSnapshot;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Upper bound on names carried by a highlight notification.
const MAX_HIGHLIGHTED: usize = 64;

/// A notification published to consumers after a successful update.
#[derive(Debug, Clone)]
pub enum GraphUpdate {
    /// The cached snapshot under `key` was replaced wholesale.
    SnapshotReplaced {
        key: String,
        snapshot: Arc<GraphSnapshot>,
    },
    /// Specific nodes were looked up rather than the whole graph reloaded.
    NodesHighlighted { names: Vec<String> },
}

/// Publishes graph updates over a broadcast channel.
#[derive(Debug, Clone)]
pub struct UpdateNotifier {
    tx: broadcast::Sender<GraphUpdate>,
}

impl Default for UpdateNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl UpdateNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to future updates. Each receiver sees every update
    /// published after its subscription, subject to channel capacity.
    pub fn subscribe(&self) -> broadcast::Receiver<GraphUpdate> {
        self.tx.subscribe()
    }

    /// Publish a snapshot-replaced notification.
    pub fn snapshot_replaced(&self, key: &str, snapshot: Arc<GraphSnapshot>) {
        self.publish(GraphUpdate::SnapshotReplaced {
            key: key.to_string(),
            snapshot,
        });
    }

    /// Publish a subset-highlighted notification, truncated to the bound.
    pub fn nodes_highlighted(&self, names: &[String]) {
        let mut names = names.to_vec();
        names.truncate(MAX_HIGHLIGHTED);
        self.publish(GraphUpdate::NodesHighlighted { names });
    }

    fn publish(&self, update: GraphUpdate) {
        // send() errs only when no receiver exists; fire-and-forget
        let delivered = self.tx.send(update).unwrap_or(0);
        trace!(delivered, "published graph update");
    }
}
