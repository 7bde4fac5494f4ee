//! Book search service - decodes filters and assembles paginated results.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::{SearchError, SearchResult};
use crate::filter::BookFilter;
use crate::metrics::{SearchTimer, record_search};
use crate::models::Book;
use crate::ports::{BookRepository, Connection, Cursor, Edge, PageInfo, PageRequest};

// =============================================================================
// Configuration
// =============================================================================

/// Default upper bound for the page size.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

/// Configuration for the search service.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Largest page size a caller may request.
    pub max_page_size: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

// =============================================================================
// SearchService
// =============================================================================

/// Paginated search over the book repository.
///
/// # Flow
///
/// 1. Decode the filter text (fails before any store access)
/// 2. Validate the page request (fails before any store access)
/// 3. Count all matches
/// 4. Fetch the requested window
/// 5. Assemble the connection
///
/// Steps 3 and 4 are independent reads; under concurrent writes `total`
/// and the returned edges may reflect different states of the store.
pub struct SearchService {
    config: SearchConfig,
    repository: Arc<dyn BookRepository>,
}

impl SearchService {
    pub fn new(repository: Arc<dyn BookRepository>, config: SearchConfig) -> Self {
        Self { config, repository }
    }

    /// Search books matching `filter_text`, returning page `page_number`
    /// (1-indexed) of at most `page_size` books.
    #[instrument(skip(self, filter_text))]
    pub async fn search(
        &self,
        filter_text: &str,
        page_number: i32,
        page_size: i32,
    ) -> SearchResult<Connection<Book>> {
        let _timer = SearchTimer::new();

        let result = self.run(filter_text, page_number, page_size).await;
        match &result {
            Ok(connection) => {
                record_search("ok");
                debug!(
                    total = connection.page.total,
                    returned = connection.edges.len(),
                    "Search completed"
                );
            }
            Err(SearchError::StoreUnavailable(e)) => {
                record_search("STORE_UNAVAILABLE");
                warn!(error = %e, "Store read failed");
            }
            Err(e) => {
                record_search(e.code());
                debug!(error = %e, "Search rejected");
            }
        }
        result
    }

    async fn run(
        &self,
        filter_text: &str,
        page_number: i32,
        page_size: i32,
    ) -> SearchResult<Connection<Book>> {
        let filter = BookFilter::parse(filter_text)?;
        let page = self.validate_page(page_number, page_size)?;
        let skip = page.skip().ok_or_else(|| {
            SearchError::InvalidPagination(format!(
                "page {} of size {} is out of range",
                page.number, page.size
            ))
        })?;

        let total = self.repository.count_books(&filter).await?;

        // A zero limit means "no limit" to some stores; never send one.
        let books = if page.size == 0 {
            Vec::new()
        } else {
            self.repository.find_books(&filter, skip, page.size).await?
        };

        let edges = books
            .into_iter()
            .map(|book| Edge {
                cursor: Cursor {
                    value: book.id.to_string(),
                },
                node: book,
            })
            .collect();

        Ok(Connection {
            page: PageInfo {
                current: page.number,
                size: page.size,
                total,
            },
            edges,
        })
    }

    fn validate_page(&self, page_number: i32, page_size: i32) -> SearchResult<PageRequest> {
        if page_number < 1 {
            return Err(SearchError::InvalidPagination(format!(
                "pageNumber must be at least 1, got {}",
                page_number
            )));
        }
        if page_size < 0 {
            return Err(SearchError::InvalidPagination(format!(
                "limit cannot be negative, got {}",
                page_size
            )));
        }

        let size = page_size as u32;
        if size > self.config.max_page_size {
            return Err(SearchError::InvalidPagination(format!(
                "limit too large: maximum {} allowed, got {}",
                self.config.max_page_size, size
            )));
        }

        Ok(PageRequest {
            number: page_number as u32,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{StorageError, StorageResult};
    use crate::models::BookId;

    /// In-process repository counting every read.
    #[derive(Default)]
    struct StubRepository {
        books: Vec<Book>,
        reads: AtomicUsize,
        fail: AtomicBool,
    }

    impl StubRepository {
        fn with_books(count: usize) -> Self {
            let books = (1..=count)
                .map(|i| Book {
                    id: BookId(format!("{:024x}", i)),
                    title: format!("Book {}", i),
                    author: (if i % 2 == 0 { "Even" } else { "Odd" }).into(),
                    year: 1900 + i as i32,
                })
                .collect();
            Self {
                books,
                ..Default::default()
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn read(&self) -> StorageResult<()> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::ConnectionError("server selection timeout".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl BookRepository for StubRepository {
        async fn count_books(&self, filter: &BookFilter) -> StorageResult<u64> {
            self.read()?;
            Ok(self.books.iter().filter(|b| filter.matches(b)).count() as u64)
        }

        async fn find_books(
            &self,
            filter: &BookFilter,
            skip: u64,
            limit: u32,
        ) -> StorageResult<Vec<Book>> {
            self.read()?;
            Ok(self
                .books
                .iter()
                .filter(|b| filter.matches(b))
                .skip(skip as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }
    }

    fn service(repo: Arc<StubRepository>) -> SearchService {
        SearchService::new(repo, SearchConfig::default())
    }

    #[tokio::test]
    async fn test_pages_over_three_books() {
        let repo = Arc::new(StubRepository::with_books(3));
        let service = service(repo.clone());

        let first = service.search("{}", 1, 2).await.unwrap();
        assert_eq!(
            first.page,
            PageInfo {
                current: 1,
                size: 2,
                total: 3
            }
        );
        assert_eq!(first.edges.len(), 2);

        let second = service.search("{}", 2, 2).await.unwrap();
        assert_eq!(second.page.current, 2);
        assert_eq!(second.page.total, 3);
        assert_eq!(second.edges.len(), 1);
        assert_eq!(second.edges[0].node.title, "Book 3");

        let third = service.search("{}", 3, 2).await.unwrap();
        assert_eq!(third.page.total, 3);
        assert!(third.edges.is_empty());
    }

    #[tokio::test]
    async fn test_cursor_is_book_id() {
        let repo = Arc::new(StubRepository::with_books(2));
        let connection = service(repo).search("{}", 1, 10).await.unwrap();

        for edge in &connection.edges {
            assert_eq!(edge.cursor.value, edge.node.id.to_string());
        }
    }

    #[tokio::test]
    async fn test_edge_count_matches_window() {
        let repo = Arc::new(StubRepository::with_books(7));
        let service = service(repo);

        for n in 1..=5i32 {
            for s in 0..=4i32 {
                let connection = service.search("{}", n, s).await.unwrap();
                let remaining = (7 - (n - 1) * s).max(0);
                assert_eq!(connection.edges.len() as i32, s.min(remaining), "n={n} s={s}");
                assert_eq!(connection.page.current as i32, n);
                assert_eq!(connection.page.size as i32, s);
                assert_eq!(connection.page.total, 7);
            }
        }
    }

    #[tokio::test]
    async fn test_filter_applies_to_total_and_edges() {
        let repo = Arc::new(StubRepository::with_books(6));
        let connection = service(repo)
            .search(r#"{"author": "Even", "year": {"$gt": 1902}}"#, 1, 10)
            .await
            .unwrap();

        assert_eq!(connection.page.total, 2);
        let titles: Vec<_> = connection.edges.iter().map(|e| e.node.title.as_str()).collect();
        assert_eq!(titles, ["Book 4", "Book 6"]);
    }

    #[tokio::test]
    async fn test_repeated_search_is_identical() {
        let repo = Arc::new(StubRepository::with_books(5));
        let service = service(repo);

        let a = service.search("{}", 2, 2).await.unwrap();
        let b = service.search("{}", 2, 2).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_zero_page_size_skips_fetch() {
        let repo = Arc::new(StubRepository::with_books(3));
        let connection = service(repo.clone()).search("{}", 1, 0).await.unwrap();

        assert_eq!(connection.page.total, 3);
        assert_eq!(connection.page.size, 0);
        assert!(connection.edges.is_empty());
        assert_eq!(repo.reads(), 1);
    }

    // Test critique: un filtre invalide ne touche jamais le store
    #[tokio::test]
    async fn test_malformed_filter_fails_before_store_access() {
        let repo = Arc::new(StubRepository::with_books(3));
        let err = service(repo.clone())
            .search("title=Dune", 1, 2)
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::MalformedFilter(_)));
        assert_eq!(repo.reads(), 0);
    }

    #[tokio::test]
    async fn test_invalid_pagination_fails_before_store_access() {
        let repo = Arc::new(StubRepository::with_books(3));
        let service = service(repo.clone());

        for (n, s) in [(0, 2), (-1, 2), (1, -5)] {
            let err = service.search("{}", n, s).await.unwrap_err();
            assert!(matches!(err, SearchError::InvalidPagination(_)), "n={n} s={s}");
        }

        let err = service
            .search("{}", 1, DEFAULT_MAX_PAGE_SIZE as i32 + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidPagination(_)));
        assert_eq!(repo.reads(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_store_unavailable() {
        let repo = Arc::new(StubRepository::with_books(3));
        repo.fail.store(true, Ordering::SeqCst);

        let err = service(repo.clone()).search("{}", 1, 2).await.unwrap_err();
        assert!(matches!(err, SearchError::StoreUnavailable(_)));
        // Pas de retry
        assert_eq!(repo.reads(), 1);
    }
}
