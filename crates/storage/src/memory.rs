//! In-process book repository.
//!
//! Evaluates filters with [`BookFilter::matches`] over a vector of books.
//! Used by tests and for running the API without a MongoDB server.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use folio_core::error::{StorageError, StorageResult};
use folio_core::filter::BookFilter;
use folio_core::models::{Book, BookId, NewBook};
use folio_core::ports::BookRepository;

/// Book repository held in memory.
///
/// Identifiers are 24 hex digits assigned in insertion order, so the
/// backing vector is always sorted by identifier.
#[derive(Default)]
pub struct MemoryBookRepository {
    books: RwLock<Vec<Book>>,
    next_id: AtomicU64,
    reads: AtomicUsize,
}

impl MemoryBookRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding the given books.
    pub fn with_books(books: impl IntoIterator<Item = NewBook>) -> Self {
        let repo = Self::new();
        let books = books.into_iter().map(|b| repo.assign_id(b)).collect();
        Self {
            books: RwLock::new(books),
            ..repo
        }
    }

    /// Create a repository from a JSON array of `{title, author, year}`.
    pub fn from_seed_json(json: &str) -> StorageResult<Self> {
        let books: Vec<NewBook> = serde_json::from_str(json)
            .map_err(|e| StorageError::SerializationError(format!("invalid seed data: {}", e)))?;
        Ok(Self::with_books(books))
    }

    /// Insert a book, returning it with its assigned identifier.
    pub async fn insert(&self, book: NewBook) -> Book {
        let book = self.assign_id(book);
        self.books.write().await.push(book.clone());
        book
    }

    /// Number of books held.
    pub async fn len(&self) -> usize {
        self.books.read().await.len()
    }

    /// Number of store reads served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn assign_id(&self, book: NewBook) -> Book {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Book {
            id: BookId(format!("{:024x}", n)),
            title: book.title,
            author: book.author,
            year: book.year,
        }
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn count_books(&self, filter: &BookFilter) -> StorageResult<u64> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let books = self.books.read().await;
        Ok(books.iter().filter(|b| filter.matches(b)).count() as u64)
    }

    async fn find_books(
        &self,
        filter: &BookFilter,
        skip: u64,
        limit: u32,
    ) -> StorageResult<Vec<Book>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let books = self.books.read().await;
        Ok(books
            .iter()
            .filter(|b| filter.matches(b))
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
