//! Block extract sources for the Strata entity indexer.
//!
//! Implements the [`BlockSource`] port from `strata-core`. The only adapter
//! today is [`JsonLinesSource`], which replays newline-delimited block
//! extracts from a file.
//!
//! [`BlockSource`]: strata_core::ports::BlockSource

mod jsonl;

pub use jsonl::JsonLinesSource;
