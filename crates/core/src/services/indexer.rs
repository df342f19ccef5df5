//! Core indexer service - drives the linker over a block source.
//!
//! Blocks are linked one at a time, in strictly ascending height order.
//! Any fatal error stops the run and is returned to the caller, which owns
//! retry/restart policy.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, instrument, trace};

use crate::error::{DomainError, IndexerError, IndexerResult};
use crate::metrics::{ProcessingTimer, record_block_indexed};
use crate::ports::{BlockSource, Store};

use super::linker::{BlockSummary, EntityLinker};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the indexer service.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// First block height to request from the source.
    pub start_height: u64,
    /// Flush the store after this many linked blocks.
    pub flush_every: u32,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            start_height: 0,
            flush_every: 1,
        }
    }
}

/// Totals for one indexer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexerStats {
    pub blocks: u64,
    pub extrinsics: u64,
    pub calls: u64,
    pub events: u64,
    /// Height of the last linked block.
    pub last_height: Option<u64>,
}

impl IndexerStats {
    fn record(&mut self, summary: &BlockSummary) {
        self.blocks += 1;
        self.extrinsics += u64::from(summary.extrinsics);
        self.calls += u64::from(summary.calls);
        self.events += u64::from(summary.events);
        self.last_height = Some(summary.height);
    }
}

// =============================================================================
// IndexerService
// =============================================================================

/// Sequential indexer over a finite block source.
///
/// # Flow
///
/// 1. Open the source stream at `start_height`
/// 2. For each block, check height ordering and link it
/// 3. Flush the store every `flush_every` blocks and at end of stream
pub struct IndexerService<Src: BlockSource, S: Store + ?Sized> {
    config: IndexerConfig,
    source: Arc<Src>,
    linker: EntityLinker<S>,
}

impl<Src: BlockSource, S: Store + ?Sized> IndexerService<Src, S> {
    pub fn new(config: IndexerConfig, source: Arc<Src>, store: Arc<S>) -> Self {
        Self {
            config,
            source,
            linker: EntityLinker::new(store),
        }
    }

    /// Link every block the source yields.
    ///
    /// Returns [`IndexerError::ShutdownRequested`] if the shutdown flag is
    /// raised between blocks; pending writes are flushed first.
    #[instrument(skip_all, fields(from = self.config.start_height))]
    pub async fn run(
        &self,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> IndexerResult<IndexerStats> {
        if self.config.flush_every == 0 {
            return Err(IndexerError::ConfigError(
                "flush_every must be at least 1".to_string(),
            ));
        }

        info!("⛓️  Starting indexer");

        let mut stream = self.source.blocks(self.config.start_height).await?;
        let mut stats = IndexerStats::default();
        let mut unflushed = 0u32;

        while let Some(result) = stream.next().await {
            if *shutdown_rx.borrow() {
                debug!("Shutdown requested");
                self.flush(unflushed).await?;
                return Err(IndexerError::ShutdownRequested);
            }

            let raw_block = result?;
            let height = raw_block.height();

            if let Some(last) = stats.last_height
                && height <= last
            {
                return Err(DomainError::OutOfOrderBlock { last, got: height }.into());
            }

            let summary = {
                let _timer = ProcessingTimer::new();
                self.linker.process_block(raw_block).await?
            };
            record_block_indexed();
            debug!(
                block = summary.height,
                extrinsics = summary.extrinsics,
                calls = summary.calls,
                events = summary.events,
                "⛓️  Block linked"
            );
            stats.record(&summary);

            unflushed += 1;
            if unflushed >= self.config.flush_every {
                self.flush(unflushed).await?;
                unflushed = 0;
            }
        }

        self.flush(unflushed).await?;

        info!(
            blocks = stats.blocks,
            last = ?stats.last_height,
            "✅ Source exhausted"
        );
        Ok(stats)
    }

    async fn flush(&self, unflushed: u32) -> IndexerResult<()> {
        if unflushed == 0 {
            return Ok(());
        }
        trace!(blocks = unflushed, "Flushing store");
        self.linker.store().flush().await?;
        Ok(())
    }
}
