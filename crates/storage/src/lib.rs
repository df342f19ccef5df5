//! Storage layer for the Strata entity indexer.
//!
//! This crate provides implementations of the [`Store`] port defined in
//! `strata-core`:
//!
//! - [`MemoryStore`] - process memory, no durability; used for dry runs
//!   and to observe insertion order in tests
//! - [`PgStore`] - PostgreSQL with a write-ahead cache flushed per batch
//!
//! # Usage
//!
//! ```ignore
//! use strata_storage::{Database, DatabaseConfig, PgStore};
//!
//! let config = DatabaseConfig::new(&database_url);
//! let db = Database::connect(&config).await?;
//! db.migrate().await?;
//!
//! let store = Arc::new(PgStore::new(&db));
//! ```
//!
//! [`Store`]: strata_core::ports::Store

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{Database, DatabaseConfig, PgStore, PurgeStats};
