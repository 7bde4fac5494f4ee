//! Domain models for the book catalogue.
//!
//! These models are storage-agnostic and represent the canonical
//! form of books within the domain layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};

// =============================================================================
// Identifiers
// =============================================================================

/// Opaque, store-assigned book identifier.
///
/// For MongoDB this is the 24-character hex form of the document's `ObjectId`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BookId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// =============================================================================
// Books
// =============================================================================

/// A book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identifier.
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Publication year.
    pub year: i32,
}

/// Book fields without an identifier, as supplied by seed files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub year: i32,
}

// =============================================================================
// Collections
// =============================================================================

/// Collections that can be searched through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Books,
}

impl Collection {
    /// Parse a collection name as sent by API callers.
    ///
    /// Matching is exact and case-sensitive.
    pub fn parse(name: &str) -> SearchResult<Self> {
        match name {
            "Books" => Ok(Collection::Books),
            other => Err(SearchError::InvalidCollection(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Books => "Books",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================
