//! Book repository implementation for MongoDB.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::{Bson, doc};
use serde::Deserialize;
use tracing::trace;

use folio_core::error::StorageResult;
use folio_core::filter::BookFilter;
use folio_core::models::{Book, BookId};
use folio_core::ports::BookRepository;

use super::database::Database;
use super::helpers::{bson_to_i32, bson_to_id, filter_to_document, map_driver_error};

/// MongoDB implementation of BookRepository.
pub struct MongoBookRepository {
    collection: Collection<BookDocument>,
}

impl MongoBookRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(db.books_collection()),
        }
    }
}

#[async_trait]
impl BookRepository for MongoBookRepository {
    async fn count_books(&self, filter: &BookFilter) -> StorageResult<u64> {
        let query = filter_to_document(filter);
        trace!(query = %query, "count_documents");

        self.collection
            .count_documents(query)
            .await
            .map_err(map_driver_error)
    }

    async fn find_books(
        &self,
        filter: &BookFilter,
        skip: u64,
        limit: u32,
    ) -> StorageResult<Vec<Book>> {
        // The driver treats a zero limit as unlimited.
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query = filter_to_document(filter);
        trace!(query = %query, skip, limit, "find");

        let cursor = self
            .collection
            .find(query)
            .projection(doc! { "_id": 1, "title": 1, "author": 1, "year": 1 })
            .sort(doc! { "_id": 1 })
            .skip(skip)
            .limit(i64::from(limit))
            .await
            .map_err(map_driver_error)?;

        let documents: Vec<BookDocument> = cursor.try_collect().await.map_err(map_driver_error)?;

        documents.into_iter().map(BookDocument::into_book).collect()
    }
}

/// Stored representation of a book.
///
/// Fields are loosely typed because documents may have been written by
/// other clients.
#[derive(Debug, Deserialize)]
struct BookDocument {
    #[serde(rename = "_id")]
    id: Bson,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    year: Option<Bson>,
}

impl BookDocument {
    fn into_book(self) -> StorageResult<Book> {
        Ok(Book {
            id: BookId(bson_to_id(&self.id)),
            title: self.title.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            year: bson_to_i32(self.year.as_ref(), "book.year")?,
        })
    }
}
