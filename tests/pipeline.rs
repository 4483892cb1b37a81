//! End-to-end ingestion scenarios through the consumer-facing API.

mod common;

use common::ScriptedSource;
use ganglion::{
    GanglionApi, GraphUpdate, MergeEngine, ReadStrategy, SnapshotCache, ToolBlock,
};
use std::sync::Arc;

fn api_with(source: ScriptedSource) -> GanglionApi {
    GanglionApi::new(
        Arc::new(source),
        MergeEngine::default(),
        Arc::new(SnapshotCache::default()),
    )
}

fn api() -> GanglionApi {
    api_with(ScriptedSource::single("{\"entities\":[]}"))
}

// --- Scenario: repeated ingest unions observations and re-mines tags ---

#[tokio::test]
async fn repeated_ingest_merges_entity_history() {
    let api = api();

    let s1 = api
        .ingest(&[ToolBlock::text(
            r#"{"entities":[{"name":"A","type":"Project","observations":["root #x"]}]}"#,
        )])
        .await
        .unwrap();
    let created = s1.node("A").unwrap().metadata.created_at;

    let s2 = api
        .ingest(&[ToolBlock::text(
            r#"{"entities":[{"name":"A","type":"Project","observations":["root #x","extra #y"]}]}"#,
        )])
        .await
        .unwrap();

    let a = s2.node("A").unwrap();
    assert_eq!(a.observations, vec!["root #x", "extra #y"]);
    assert!(a.has_tag("x"));
    assert!(a.has_tag("y"));
    assert!(a.has_tag("project"));
    assert_eq!(a.metadata.created_at, created);
    assert!(a.metadata.updated_at >= created);
}

// --- Scenario: identical relation triples collapse to one link ---

#[tokio::test]
async fn duplicate_relation_triple_yields_one_link() {
    let api = api();
    let payload = r#"{
        "entities":[
            {"name":"A","type":"Person","observations":[]},
            {"name":"B","type":"Person","observations":[]}
        ],
        "relations":[
            {"source":"A","target":"B","relationType":"likes"},
            {"source":"A","target":"B","relationType":"likes"}
        ]
    }"#;

    let s1 = api.ingest(&[ToolBlock::text(payload)]).await.unwrap();
    assert_eq!(s1.links.len(), 1);

    // the same triple arriving in a later ingestion is also dropped
    let s2 = api.ingest(&[ToolBlock::text(payload)]).await.unwrap();
    assert_eq!(s2.links.len(), 1);
    assert_eq!(s2.links[0].relation_type, "likes");
}

// --- Scenario: dangling relation rejects the merge, last-good survives ---

#[tokio::test]
async fn dangling_relation_keeps_last_good_snapshot() {
    let api = api();

    let good = api
        .ingest(&[ToolBlock::text(
            r#"{"entities":[{"name":"A","type":"T","observations":["fine"]}]}"#,
        )])
        .await
        .unwrap();
    assert!(good.has_node("A"));

    let err = api
        .ingest(&[ToolBlock::text(
            r#"{"entities":[],"relations":[{"source":"C","target":"D","relationType":"refs"}]}"#,
        )])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("unknown node"));

    // the cache still serves the prior valid snapshot
    let cached = api
        .load_full_graph(ReadStrategy::CacheFirst)
        .await
        .unwrap();
    assert!(cached.has_node("A"));
    assert!(!cached.nodes.iter().any(|n| n.name == "C"));
    cached.validate_links().unwrap();
}

// --- Capability absence: prose with no JSON is a valid empty result ---

#[tokio::test]
async fn unstructured_output_merges_as_empty() {
    let api = api();
    let snapshot = api
        .ingest(&[ToolBlock::text("The service had nothing to say today.")])
        .await
        .unwrap();
    assert!(snapshot.is_empty());
}

// --- Link resolvability holds for every published snapshot ---

#[tokio::test]
async fn published_snapshots_always_resolve_links() {
    let api = api();
    let payload = r#"{
        "entities":[
            {"name":"A","type":"Service","observations":["core #infra"]},
            {"name":"B","type":"Service","observations":["core #infra"]},
            {"name":"C","type":"Doc","observations":["notes"]}
        ],
        "relations":[
            {"source":"A","target":"B","relationType":"calls"},
            {"source":"B","target":"C","relationType":"documents"}
        ]
    }"#;
    let snapshot = api.ingest(&[ToolBlock::text(payload)]).await.unwrap();

    snapshot.validate_links().unwrap();
    for link in &snapshot.links {
        assert!(link.source.is_resolved());
        assert!(link.target.is_resolved());
    }
    // layer coverage: every node points at a layer in the same snapshot
    for node in &snapshot.nodes {
        assert!(snapshot.layer(&node.layer_id).is_some());
    }
}

// --- Notifications ---

#[tokio::test]
async fn ingest_publishes_snapshot_replaced() {
    let api = api();
    let mut rx = api.subscribe();

    api.ingest(&[ToolBlock::text(
        r#"{"entities":[{"name":"A","type":"T","observations":[]}]}"#,
    )])
    .await
    .unwrap();

    match rx.recv().await.unwrap() {
        GraphUpdate::SnapshotReplaced { key, snapshot } => {
            assert_eq!(key, "full-graph");
            assert!(snapshot.has_node("A"));
        }
        other => panic!("unexpected update: {other:?}"),
    }
}

#[tokio::test]
async fn find_nodes_highlights_the_resolved_subset() {
    let source = ScriptedSource::single(
        r#"{"entities":[
            {"name":"A","type":"T","observations":["hit"]},
            {"name":"B","type":"T","observations":["hit"]}
        ]}"#,
    );
    let api = api_with(source);
    let mut rx = api.subscribe();

    let found = api
        .find_nodes(&["A".to_string(), "Missing".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "A");

    // first the snapshot replacement from the merge, then the highlight
    let mut saw_highlight = false;
    for _ in 0..2 {
        if let GraphUpdate::NodesHighlighted { names } = rx.recv().await.unwrap() {
            assert_eq!(names, vec!["A"]);
            saw_highlight = true;
        }
    }
    assert!(saw_highlight);
}

// --- Rejected merges publish nothing ---

#[tokio::test]
async fn rejected_merge_publishes_no_update() {
    let api = api();
    let mut rx = api.subscribe();

    let _ = api
        .ingest(&[ToolBlock::text(
            r#"{"entities":[],"relations":[{"source":"X","target":"Y","relationType":"r"}]}"#,
        )])
        .await
        .unwrap_err();

    assert!(
        matches!(rx.try_recv(), Err(tokio::sync::broadcast::error::TryRecvError::Empty)),
        "no notification for a rejected merge"
    );
}
