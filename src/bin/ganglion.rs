//! Ganglion CLI — run the ingestion pipeline against saved tool output.
//!
//! Usage:
//!   ganglion ingest <file>            # file holds raw tool-result text
//!   ganglion mine <text> [--type T]   # debug view of tag mining

use clap::{Parser, Subcommand};
use ganglion::{
    GanglionApi, GraphSource, MergeEngine, ReadStrategy, SnapshotCache, SourceError, TagMiner,
    ToolBlock,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "ganglion",
    version,
    about = "Graph ingestion, enrichment, and synchronization engine"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest raw tool-result text from a file and print snapshot stats
    Ingest {
        /// Path to a file containing the tool output
        file: PathBuf,
    },
    /// Mine tags from a text string and print them
    Mine {
        /// The observation text to mine
        text: String,
        /// Entity type for the type-derived tag
        #[arg(long = "type", default_value = "")]
        entity_type: String,
    },
}

/// The CLI has no live producer; ingest works from the given file alone.
struct NoSource;

#[async_trait::async_trait]
impl GraphSource for NoSource {
    async fn read_graph(&self) -> Result<Vec<ToolBlock>, SourceError> {
        Err(SourceError("no remote producer configured".to_string()))
    }

    async fn open_nodes(&self, _names: &[String]) -> Result<Vec<ToolBlock>, SourceError> {
        Err(SourceError("no remote producer configured".to_string()))
    }
}

async fn cmd_ingest(file: &PathBuf) -> i32 {
    let text = match std::fs::read_to_string(file) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), e);
            return 1;
        }
    };

    let api = GanglionApi::new(
        Arc::new(NoSource),
        MergeEngine::default(),
        Arc::new(SnapshotCache::default()),
    );
    match api.ingest(&[ToolBlock::text(text)]).await {
        Ok(snapshot) => {
            let stats = snapshot.stats();
            println!(
                "Ingested: {} nodes, {} links ({} inter-layer), {} layers",
                stats.nodes, stats.links, stats.inter_layer_links, stats.layers
            );
            for layer in &snapshot.layers {
                println!(
                    "  layer {:<24} depth {:>7.1}  {} nodes",
                    layer.name, layer.depth, layer.node_count
                );
            }
            // The cache now serves the snapshot under any strategy
            let _ = api.load_full_graph(ReadStrategy::CacheFirst).await;
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_mine(text: &str, entity_type: &str) -> i32 {
    let miner = TagMiner::default();
    let tags = miner.mine(text, entity_type);
    if tags.is_empty() {
        println!("No tags mined.");
        return 0;
    }
    println!("{:<24} {:<16} {:>6}", "TAG", "CATEGORY", "WEIGHT");
    println!("{}", "-".repeat(48));
    for tag in tags {
        println!("{:<24} {:<16?} {:>6}", tag.name, tag.category, tag.weight);
    }
    0
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Ingest { file } => cmd_ingest(&file).await,
        Commands::Mine { text, entity_type } => cmd_mine(&text, &entity_type),
    };
    std::process::exit(code);
}
