//! Error types for the indexer domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`DomainError`] - Linking and data-integrity errors
//! - [`StorageError`] - Store facade errors
//! - [`ChainError`] - Block source errors
//! - [`IndexerError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

use crate::models::EntityKind;

// =============================================================================
// Domain Errors
// =============================================================================

/// Linking and data-integrity violations.
///
/// None of these are recoverable inside the core: they abort the
/// current block and propagate to the caller.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Qualified call/event name without exactly one separator.
    #[error("Malformed qualified name: {0:?}")]
    MalformedName(String),

    /// A hash or root failed hex/length validation.
    #[error("Invalid hash in field {field}: {message}")]
    InvalidHash {
        /// Field that carried the bad value (e.g. `block.parent_hash`).
        field: &'static str,
        /// Decoder message.
        message: String,
    },

    /// Validator account bytes are not valid hex.
    #[error("Invalid account ID: {0}")]
    InvalidAccountId(String),

    /// Blocks must arrive in strictly ascending height order.
    #[error("Block {got} received after block {last}")]
    OutOfOrderBlock {
        /// Height of the last linked block.
        last: u64,
        /// Height of the offending block.
        got: u64,
    },

    /// Structured source data could not be decoded.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Generic validation error.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DomainError {
    /// Whether this error is a missing parent reference.
    pub fn is_missing_reference(&self) -> bool {
        matches!(self, DomainError::Storage(StorageError::NotFound { .. }))
    }

    /// Whether this error is a duplicate insert.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DomainError::Storage(StorageError::DuplicateId { .. }))
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Store facade errors.
///
/// `NotFound` is the referential-integrity error and `DuplicateId` the
/// duplicate-identity error; the rest are infrastructure failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// A referenced entity does not exist.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Entity kind that was looked up.
        kind: EntityKind,
        /// Identity that was looked up.
        id: String,
    },

    /// An entity with the same identity was already inserted.
    #[error("{kind} {id} already exists")]
    DuplicateId {
        /// Entity kind of the rejected insert.
        kind: EntityKind,
        /// Identity of the rejected insert.
        id: String,
    },

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Transaction commit/rollback failed.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Data serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Block source errors.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Source could not be opened.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Reading from the source failed.
    #[error("Read error: {0}")]
    ReadError(String),

    /// A block extract could not be decoded.
    #[error("Decode error at line {line}: {message}")]
    DecodeError {
        /// 1-based line of the extract in the source.
        line: usize,
        /// Decoder message.
        message: String,
    },
}

// =============================================================================
// Indexer Errors
// =============================================================================

/// Top-level indexer orchestration errors.
///
/// This is the main error type returned by [`crate::services::IndexerService`].
/// It wraps all lower-level errors and adds indexer-specific variants.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// Domain logic error.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Block source error.
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Graceful shutdown was requested.
    ///
    /// This is not really an error but uses the error type for control flow.
    #[error("Indexer shutdown requested")]
    ShutdownRequested,
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for indexer operations.
pub type IndexerResult<T> = Result<T, IndexerError>;

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // Storage -> Domain -> Indexer
        let storage_err = StorageError::QueryError("db failed".into());
        let domain_err: DomainError = storage_err.into();
        let indexer_err: IndexerError = domain_err.into();

        assert!(indexer_err.to_string().contains("db failed"));

        // Chain -> Indexer
        let chain_err = ChainError::ReadError("eof".into());
        let indexer_err: IndexerError = chain_err.into();
        assert!(indexer_err.to_string().contains("eof"));
    }

    #[test]
    fn test_not_found_names_kind_and_id() {
        let err = StorageError::NotFound {
            kind: EntityKind::Call,
            id: "0000000010-000002-abcde".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("call") && msg.contains("0000000010-000002-abcde"));
    }

    #[test]
    fn test_domain_error_classification() {
        let missing: DomainError = StorageError::NotFound {
            kind: EntityKind::Block,
            id: "b".into(),
        }
        .into();
        assert!(missing.is_missing_reference());
        assert!(!missing.is_duplicate());

        let dup: DomainError = StorageError::DuplicateId {
            kind: EntityKind::Block,
            id: "b".into(),
        }
        .into();
        assert!(dup.is_duplicate());
        assert!(!DomainError::MalformedName("x".into()).is_missing_reference());
    }
}
