//! The upstream block source.
//!
//! The chain RPC client itself lives outside this workspace; whatever
//! discovers blocks only has to implement [`BlockSource`]. The crate ships
//! one implementation, the file-based replay source, which is also what
//! the tests drive.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracery_core::Transfer;

/// Errors produced by block sources and the poller.
#[derive(Error, Debug)]
pub enum FeedError {
    /// The upstream source failed to deliver.
    #[error("source error: {0}")]
    Source(String),

    /// Reading a capture file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A capture file line did not parse as a block.
    #[error("malformed block on line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Which block to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRef {
    /// The newest block the source knows about.
    Latest,
    /// A specific block number, used for the preload window.
    Number(u64),
}

/// One block's worth of transfer events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceBlock {
    /// Block hash, used to skip re-delivery of an unchanged tip.
    pub hash: String,

    /// Block number.
    pub number: u64,

    /// The transfers contained in this block, in order.
    pub transfers: Vec<Transfer>,
}

/// An upstream source of blocks.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Number of the newest block available.
    async fn latest_block_number(&self) -> Result<u64, FeedError>;

    /// Fetches one block.
    ///
    /// `Ok(None)` means the source has nothing for this reference (a gap,
    /// or a replay that reached its end); the poller treats it as an empty
    /// tick, not an error.
    async fn fetch_block(&self, block: BlockRef) -> Result<Option<SourceBlock>, FeedError>;
}
