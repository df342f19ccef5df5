//! Core domain layer for the Strata entity indexer.
//!
//! This crate turns raw Substrate block extracts into a relational entity
//! graph (blocks, extrinsics, calls, events). It follows hexagonal
//! architecture principles - this is the innermost layer with no
//! dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     strata (binary)                         │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │        strata-source         │        strata-storage        │
//! │     (block extracts)         │   (memory / PostgreSQL)      │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │                     strata-core  ← YOU ARE HERE             │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Entities (Block, Extrinsic, Call, Event) and value types
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Linking logic ([`services::EntityLinker`], [`services::IndexerService`])
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Linking order
//!
//! Each block is linked in a fixed order so that every parent is stored
//! before anything that references it:
//!
//! 1. Block, with all counters at zero
//! 2. Extrinsics, in block order
//! 3. Calls, parents before children
//! 4. Events, in block order
//!
//! Blocks themselves are linked one at a time in ascending height order.

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
