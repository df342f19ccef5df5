//! Linking services.

mod call_order;
mod indexer;
mod linker;

pub use call_order::order_calls_parent_first;
pub use indexer::{IndexerConfig, IndexerService, IndexerStats};
pub use linker::{BlockSummary, EntityLinker};
