//! File-based replay source.
//!
//! A capture file holds one JSON block per line, in chain order. Replaying
//! one makes a full feed pipeline runnable offline, which is how the demo
//! mode and most of the integration tests work.

use crate::source::{BlockRef, BlockSource, FeedError, SourceBlock};
use async_trait::async_trait;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// A [`BlockSource`] over a JSON-lines capture file.
///
/// `Latest` fetches walk the file in order, one block per call, returning
/// `None` once the capture is exhausted — the same shape as tailing a
/// chain that has stopped producing. Numbered fetches address blocks
/// directly and do not move the cursor.
#[derive(Debug)]
pub struct ReplaySource {
    blocks: Vec<SourceBlock>,
    cursor: Mutex<usize>,
}

impl ReplaySource {
    /// Loads a capture file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let text = fs::read_to_string(path.as_ref())?;

        let mut blocks = Vec::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let block: SourceBlock =
                serde_json::from_str(line).map_err(|source| FeedError::Malformed {
                    line: i + 1,
                    source,
                })?;
            blocks.push(block);
        }

        info!(
            "Loaded {} blocks from {}",
            blocks.len(),
            path.as_ref().display()
        );
        Ok(Self {
            blocks,
            cursor: Mutex::new(0),
        })
    }

    /// Number of blocks in the capture.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the capture holds no blocks at all.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[async_trait]
impl BlockSource for ReplaySource {
    async fn latest_block_number(&self) -> Result<u64, FeedError> {
        Ok(self.blocks.last().map(|b| b.number).unwrap_or(0))
    }

    async fn fetch_block(&self, at: BlockRef) -> Result<Option<SourceBlock>, FeedError> {
        match at {
            BlockRef::Latest => {
                let mut cursor = self.cursor.lock().unwrap();
                let block = self.blocks.get(*cursor).cloned();
                if block.is_some() {
                    *cursor += 1;
                }
                Ok(block)
            }
            BlockRef::Number(n) => Ok(self.blocks.iter().find(|b| b.number == n).cloned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracery_core::Transfer;

    fn capture(lines: &[String]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file.flush().unwrap();
        file
    }

    fn block_json(hash: &str, number: u64) -> String {
        serde_json::to_string(&SourceBlock {
            hash: hash.to_string(),
            number,
            transfers: vec![Transfer::new("a", "b", 1.0, number)],
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_latest_walks_blocks_in_order() {
        let file = capture(&[block_json("h1", 5), String::new(), block_json("h2", 6)]);
        let source = ReplaySource::open(file.path()).unwrap();

        assert_eq!(source.len(), 2);
        assert_eq!(source.latest_block_number().await.unwrap(), 6);

        let b1 = source.fetch_block(BlockRef::Latest).await.unwrap().unwrap();
        let b2 = source.fetch_block(BlockRef::Latest).await.unwrap().unwrap();
        assert_eq!((b1.number, b2.number), (5, 6));

        // Exhausted.
        assert!(source.fetch_block(BlockRef::Latest).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_numbered_fetch_does_not_move_the_cursor() {
        let file = capture(&[block_json("h1", 5), block_json("h2", 6)]);
        let source = ReplaySource::open(file.path()).unwrap();

        let by_number = source
            .fetch_block(BlockRef::Number(6))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_number.hash, "h2");
        assert!(source
            .fetch_block(BlockRef::Number(99))
            .await
            .unwrap()
            .is_none());

        // The replay still starts from the beginning.
        let next = source.fetch_block(BlockRef::Latest).await.unwrap().unwrap();
        assert_eq!(next.number, 5);
    }

    #[test]
    fn test_malformed_line_reports_its_position() {
        let file = capture(&[block_json("h1", 5), "not json".to_string()]);
        let err = ReplaySource::open(file.path()).unwrap_err();
        match err {
            FeedError::Malformed { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_empty_capture_is_legal() {
        let file = capture(&[]);
        let source = ReplaySource::open(file.path()).unwrap();
        assert!(source.is_empty());
    }
}
