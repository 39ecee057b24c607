//! Tracery Feed - Block polling and transfer queueing
//!
//! This crate is the seam between the chain and the graph maintainer. A
//! [`BlockSource`] abstracts whatever discovers blocks (an RPC client, a
//! capture file); the [`Poller`] backfills a recent window, then follows
//! the tip, deduplicates unchanged tips by hash, and pushes each
//! discovered transfer into a bounded queue. The queue's single consumer
//! is what serializes ingests into the graph.

mod poller;
mod replay;
mod source;

pub use poller::{Poller, PollerConfig};
pub use replay::ReplaySource;
pub use source::{BlockRef, BlockSource, FeedError, SourceBlock};
