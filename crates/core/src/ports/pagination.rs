//! Pagination types for list queries.
//!
//! These types implement offset pagination: a 1-indexed page number and a
//! page size, translated to a skip/limit window against the store.

/// Opaque cursor for a result item.
///
/// The cursor value is implementation-specific and should be treated
/// as an opaque token by clients. For books it is the book identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub value: String,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed page number.
    pub number: u32,
    /// Maximum number of items on the page.
    pub size: u32,
}

impl PageRequest {
    /// Number of matches to skip before this page.
    ///
    /// Returns `None` if the offset does not fit in a `u64`, or if `number`
    /// is zero.
    pub fn skip(&self) -> Option<u64> {
        u64::from(self.number)
            .checked_sub(1)?
            .checked_mul(u64::from(self.size))
    }
}

/// Paginated result set with page metadata and edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection<T> {
    /// Information about the current page.
    pub page: PageInfo,
    /// Items on this page, in store order.
    pub edges: Vec<Edge<T>>,
}

/// A single item in a paginated result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge<T> {
    /// Cursor for this item.
    pub cursor: Cursor,
    /// The actual item.
    pub node: T,
}

/// Information about the current page in a paginated result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Requested page number (1-indexed).
    pub current: u32,
    /// Requested page size.
    pub size: u32,
    /// Total number of matches for the filter, ignoring pagination.
    pub total: u64,
}
