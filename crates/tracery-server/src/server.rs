//! WebSocket broadcast server.
//!
//! The server owns three loops: an ingest loop draining the transfer
//! queue into the shared graph one event at a time, a render loop that
//! steps the force layout and broadcasts a live-set update on a fixed
//! cadence, and the accept loop handing each renderer client its own
//! task. Clients receive updates over a broadcast channel and can send
//! control messages back; the only control today is the capacity knob.

use crate::physics::ForceLayout;
use crate::protocol::{
    CapacityChangedPayload, ClientMessage, GraphUpdatePayload, ServerMessage,
};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracery_core::Transfer;
use tracery_graph::TraceryGraph;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Shared graph state across the server's tasks.
pub type SharedGraph = Arc<RwLock<TraceryGraph>>;

/// Errors surfaced by the server.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WebSocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub addr: SocketAddr,
    /// Render cadence: how often layout steps and updates go out.
    pub update_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9870".parse().unwrap(),
            update_interval: Duration::from_millis(100),
        }
    }
}

/// The Tracery WebSocket server.
pub struct TraceryServer {
    config: ServerConfig,
    graph: SharedGraph,
    broadcast_tx: broadcast::Sender<ServerMessage>,
}

impl TraceryServer {
    /// Creates a server owning the given graph.
    pub fn new(graph: TraceryGraph, config: ServerConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        Self {
            config,
            graph: Arc::new(RwLock::new(graph)),
            broadcast_tx,
        }
    }

    /// Returns a handle to the shared graph.
    pub fn graph(&self) -> SharedGraph {
        self.graph.clone()
    }

    /// Returns a receiver for the server's broadcast stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.broadcast_tx.subscribe()
    }

    /// Runs the server: ingest loop, render loop, accept loop.
    ///
    /// The transfer queue's sender side is typically a feed poller; when
    /// it closes, the ingest loop drains and exits while the server keeps
    /// serving the final graph.
    pub async fn run(&self, transfers: mpsc::Receiver<Transfer>) -> Result<(), ServeError> {
        tokio::spawn(run_ingest(transfers, self.graph.clone()));
        tokio::spawn(run_render(
            self.graph.clone(),
            self.broadcast_tx.clone(),
            self.config.update_interval,
        ));

        let listener = TcpListener::bind(&self.config.addr).await?;
        info!("Tracery server listening on ws://{}", self.config.addr);

        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let graph = self.graph.clone();
                    let broadcast_tx = self.broadcast_tx.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_client(stream, addr, graph, broadcast_tx).await {
                            warn!("Connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Drains the transfer queue into the graph, one event at a time.
///
/// This loop is the single writer during ingest, which is what gives the
/// core its no-interleaving guarantee.
pub(crate) async fn run_ingest(mut transfers: mpsc::Receiver<Transfer>, graph: SharedGraph) {
    while let Some(transfer) = transfers.recv().await {
        let mut g = graph.write().await;
        if let Err(e) = g.ingest(&transfer) {
            warn!("Rejected transfer: {}", e);
        }
    }
    info!("Transfer queue closed, ingest loop done");
}

/// Steps the layout and broadcasts an update on every tick, as long as
/// anyone is listening.
pub(crate) async fn run_render(
    graph: SharedGraph,
    broadcast_tx: broadcast::Sender<ServerMessage>,
    interval: Duration,
) {
    let viewport = graph.read().await.viewport();
    let mut layout = ForceLayout::new(viewport);
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        if broadcast_tx.receiver_count() == 0 {
            continue;
        }

        let snapshot = {
            let mut g = graph.write().await;
            g.run_layout(&mut layout);
            g.snapshot()
        };

        let payload =
            GraphUpdatePayload::from_snapshot(snapshot, chrono::Utc::now().timestamp_millis());
        let _ = broadcast_tx.send(ServerMessage::GraphUpdate(payload));
    }
}

/// Handles one renderer connection.
async fn handle_client(
    stream: TcpStream,
    addr: SocketAddr,
    graph: SharedGraph,
    broadcast_tx: broadcast::Sender<ServerMessage>,
) -> Result<(), ServeError> {
    let ws_stream = accept_async(stream).await?;
    let client_id = Uuid::new_v4();
    info!("Renderer {} connected from {}", client_id, addr);

    let (mut write, mut read) = ws_stream.split();
    let mut broadcast_rx = broadcast_tx.subscribe();

    // A late joiner gets the current state immediately rather than
    // waiting out a render tick.
    {
        let g = graph.read().await;
        let payload = GraphUpdatePayload::from_snapshot(
            g.snapshot(),
            chrono::Utc::now().timestamp_millis(),
        );
        let json = serde_json::to_string(&ServerMessage::GraphUpdate(payload))?;
        write.send(Message::Text(json)).await?;
    }

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_client_message(&text, &graph, &broadcast_tx, client_id).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("Message error from {}: {}", client_id, e);
                        break;
                    }
                    _ => {}
                }
            }

            msg = broadcast_rx.recv() => {
                match msg {
                    Ok(server_msg) => {
                        let json = serde_json::to_string(&server_msg)?;
                        if write.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Renderer {} lagged by {} updates", client_id, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    info!("Renderer {} disconnected", client_id);
    Ok(())
}

/// Applies one control message from a renderer.
async fn handle_client_message(
    text: &str,
    graph: &SharedGraph,
    broadcast_tx: &broadcast::Sender<ServerMessage>,
    client_id: Uuid,
) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::SetCapacity { capacity }) => {
            let g = graph.read().await;
            g.capacity().set(capacity);
            info!("Renderer {} set capacity to {}", client_id, capacity);
            let _ = broadcast_tx.send(ServerMessage::CapacityChanged(CapacityChangedPayload {
                capacity,
            }));
        }
        Err(e) => {
            warn!("Renderer {} sent an unparseable message: {}", client_id, e);
        }
    }
}
