//! Tracery Server - Live graph broadcast for renderers
//!
//! This crate is the downstream seam of the pipeline. It owns the shared
//! graph, drains the feed's transfer queue into it, steps a force-directed
//! layout, and broadcasts live-set updates to every connected WebSocket
//! client on a fixed cadence. Clients send control messages back; the
//! capacity knob adjusts the maintainer's live-vertex bound at runtime.

mod physics;
mod protocol;
mod server;

pub use physics::ForceLayout;
pub use protocol::{
    CapacityChangedPayload, ClientMessage, GraphUpdatePayload, ServerMessage,
};
pub use server::{ServeError, ServerConfig, SharedGraph, TraceryServer};
