//! CLI command implementations.

use colored::Colorize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tracery_feed::{BlockRef, BlockSource, Poller, PollerConfig, ReplaySource};
use tracery_graph::{Capacity, TraceryGraph, Viewport};
use tracery_server::{ServerConfig, TraceryServer};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Serve the live graph over WebSocket, fed from a capture file.
pub async fn serve(
    port: u16,
    headless: bool,
    replay: &Path,
    capacity: usize,
    interval_ms: u64,
    width: f64,
    height: f64,
) -> Result<()> {
    let bind_addr = if headless { "0.0.0.0" } else { "127.0.0.1" };

    let source = ReplaySource::open(replay)?;
    println!(
        "{} Loaded {} blocks from {}",
        "✓".green(),
        source.len().to_string().cyan(),
        replay.display()
    );

    let graph = TraceryGraph::new(Capacity::new(capacity), Viewport::new(width, height));
    let config = ServerConfig {
        addr: format!("{}:{}", bind_addr, port).parse()?,
        ..Default::default()
    };
    let server = TraceryServer::new(graph, config);

    // A capture is already local, so there is no window to backfill;
    // the poller just walks it block by block.
    let poller = Poller::new(
        source,
        PollerConfig {
            preload_blocks: 0,
            poll_interval: Duration::from_millis(interval_ms),
        },
    );
    let (tx, rx) = mpsc::channel(1024);
    tokio::spawn(poller.run(tx));

    println!(
        "{} Serving renderers on {}",
        "✓".green(),
        format!("ws://{}:{}", bind_addr, port).cyan()
    );
    println!("  Capacity {} (clients can adjust at runtime)", capacity);

    server.run(rx).await?;
    Ok(())
}

/// Replay a capture offline and report the resulting live sets.
pub async fn replay(file: &Path, capacity: usize, json: bool) -> Result<()> {
    let source = ReplaySource::open(file)?;
    let mut graph = TraceryGraph::new(Capacity::new(capacity), Viewport::default());

    let mut blocks = 0usize;
    let mut ingested = 0usize;
    let mut rejected = 0usize;

    while let Some(block) = source.fetch_block(BlockRef::Latest).await? {
        blocks += 1;
        for transfer in block.transfers {
            match graph.ingest(&transfer) {
                Ok(()) => ingested += 1,
                Err(e) => {
                    rejected += 1;
                    tracing::warn!("Rejected transfer in block {}: {}", block.number, e);
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&graph.snapshot())?);
        return Ok(());
    }

    let stats = graph.stats();
    println!(
        "{} Replayed {} blocks ({} transfers, {} rejected)",
        "✓".green(),
        blocks.to_string().cyan(),
        ingested,
        rejected
    );
    println!(
        "  Live: {} vertices, {} edges (capacity {})",
        stats.live_vertices.to_string().cyan(),
        stats.live_edges.to_string().cyan(),
        capacity
    );
    println!(
        "  Seen: {} vertices, {} edges, watermark block {}",
        stats.total_vertices, stats.total_edges, stats.watermark
    );

    // Show the top of the ranking, the way a renderer would draw it.
    let snapshot = graph.snapshot();
    for vertex in snapshot.vertices.iter().take(10) {
        println!(
            "  {} {}",
            vertex.id.cyan(),
            format!(
                "(score {:.3}, {} connections, block {})",
                vertex.score, vertex.connections, vertex.last_block
            )
            .dimmed()
        );
    }

    Ok(())
}
