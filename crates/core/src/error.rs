//! Error types for the Folio domain layer.
//!
//! This module defines a small hierarchy of error types:
//!
//! - [`StorageError`] - Document store / repository errors
//! - [`FilterError`] - Filter text that does not fit the filter grammar
//! - [`SearchError`] - Request-scoped errors returned by the search service
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Document store and repository errors.
///
/// These errors originate from the store adapter: connecting, running
/// queries and decoding stored documents.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to reach the document store.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// Query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// A stored document could not be decoded into a domain model.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Filter Errors
// =============================================================================

/// Violations of the structured filter grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// Filter text is not valid JSON.
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// Filter text exceeds the maximum accepted length.
    #[error("Filter too long: maximum {max} bytes allowed, got {actual}")]
    TooLong { max: usize, actual: usize },

    /// `$and` / `$or` nesting is deeper than allowed.
    #[error("Filter nested too deeply: maximum depth is {0}")]
    TooDeep(usize),

    /// A filter (or nested filter) is not a JSON object.
    #[error("Expected a filter object, got {0}")]
    NotAnObject(&'static str),

    /// Field is not part of the Book document.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Operator is not supported for the field.
    #[error("Unsupported operator {op} for field {field}")]
    UnknownOperator { field: String, op: String },

    /// Operand has the wrong JSON type for the field/operator.
    #[error("Invalid operand for {field}: expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    /// `$and` / `$or` array or operator object is empty.
    #[error("{0} cannot be empty")]
    Empty(String),
}

// =============================================================================
// Search Errors
// =============================================================================

/// Errors returned to API callers by a search request.
///
/// Every variant is request-scoped: nothing is retried and no partial
/// result is produced.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Requested collection is not supported.
    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    /// Filter text could not be decoded.
    #[error("Malformed filter: {0}")]
    MalformedFilter(#[from] FilterError),

    /// Page number or page size is out of range.
    #[error("Invalid pagination: {0}")]
    InvalidPagination(String),

    /// The document store failed to serve the read.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),
}

impl SearchError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::InvalidCollection(_) => "INVALID_COLLECTION",
            SearchError::MalformedFilter(_) => "MALFORMED_FILTER",
            SearchError::InvalidPagination(_) => "INVALID_PAGINATION",
            SearchError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for filter decoding.
pub type FilterResult<T> = Result<T, FilterError>;

/// Result type for search operations.
pub type SearchResult<T> = Result<T, SearchError>;
