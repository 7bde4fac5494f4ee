//! Port traits for data repositories.
//!
//! These traits define the storage interface used by the domain layer.
//! Implementations live in the infrastructure layer (`folio-storage`).

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::filter::BookFilter;
use crate::models::Book;

/// Repository for book documents.
///
/// Both reads are independent: no snapshot is shared between a count and
/// the fetch that follows it.
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// Count books matching the filter, ignoring any window.
    async fn count_books(&self, filter: &BookFilter) -> StorageResult<u64>;

    /// Fetch at most `limit` matching books after skipping `skip` matches.
    ///
    /// Results are ordered by ascending identifier so that repeated calls
    /// against an unchanged store return the same sequence. A `limit` of
    /// zero returns no books.
    async fn find_books(
        &self,
        filter: &BookFilter,
        skip: u64,
        limit: u32,
    ) -> StorageResult<Vec<Book>>;
}
