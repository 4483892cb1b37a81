//! Shared test fixtures: scripted graph sources with fetch counting.

use async_trait::async_trait;
use ganglion::{GraphSource, SourceError, ToolBlock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A producer that replays scripted payloads in order and counts fetches.
///
/// The last payload repeats once the script is exhausted. Each call can
/// carry its own delay to simulate a slow remote.
pub struct ScriptedSource {
    payloads: Mutex<Vec<(String, Duration)>>,
    fetches: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(payloads: &[&str]) -> Self {
        assert!(!payloads.is_empty(), "script needs at least one payload");
        Self {
            payloads: Mutex::new(
                payloads
                    .iter()
                    .map(|p| (p.to_string(), Duration::ZERO))
                    .collect(),
            ),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn single(payload: &str) -> Self {
        Self::new(&[payload])
    }

    /// Set the response delay for one scripted call by index.
    pub fn delay_call(self, index: usize, delay: Duration) -> Self {
        self.payloads.lock().unwrap()[index].1 = delay;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    async fn next_blocks(&self) -> Vec<ToolBlock> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let (payload, delay) = {
            let mut payloads = self.payloads.lock().unwrap();
            if payloads.len() > 1 {
                payloads.remove(0)
            } else {
                payloads[0].clone()
            }
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        vec![ToolBlock::text(payload)]
    }
}

#[async_trait]
impl GraphSource for ScriptedSource {
    async fn read_graph(&self) -> Result<Vec<ToolBlock>, SourceError> {
        Ok(self.next_blocks().await)
    }

    async fn open_nodes(&self, _names: &[String]) -> Result<Vec<ToolBlock>, SourceError> {
        Ok(self.next_blocks().await)
    }
}

/// Entity payload helpers used across scenario tests.
#[allow(dead_code)]
pub fn entities_payload(entities: &[(&str, &str, &[&str])]) -> String {
    let entities: Vec<serde_json::Value> = entities
        .iter()
        .map(|(name, entity_type, observations)| {
            serde_json::json!({
                "name": name,
                "type": entity_type,
                "observations": observations,
            })
        })
        .collect();
    serde_json::json!({ "entities": entities }).to_string()
}
