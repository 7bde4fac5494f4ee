//! GraphQL schema definition.
//!
//! This module provides the GraphQL schema for book search: a single
//! `search` query returning a paginated `BookConnection`.

use std::sync::Arc;

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, ID, Object, Result, Schema,
    SchemaBuilder,
};

use tracing::debug;

use folio_core::error::SearchError;
use folio_core::models::Collection;
use folio_core::services::SearchService;

use crate::types::FolioSchema;

// -----------------------------------------------------------------------------
// Schema Configuration
// -----------------------------------------------------------------------------

/// Maximum query depth to prevent deeply nested queries (DoS protection).
/// Note: GraphQL introspection requires depth ~13, so we use 15 to allow it.
pub const MAX_QUERY_DEPTH: usize = 15;

/// Maximum query complexity score (DoS protection).
/// Each field has a default complexity of 1, nested objects multiply.
pub const MAX_QUERY_COMPLEXITY: usize = 500;

// -----------------------------------------------------------------------------
// Schema Builder
// -----------------------------------------------------------------------------

/// Build the GraphQL schema around a search service.
///
/// Includes query depth and complexity limits for DoS protection.
pub fn build_schema(service: Arc<SearchService>) -> FolioSchema {
    schema_builder(service)
        .limit_depth(MAX_QUERY_DEPTH)
        .limit_complexity(MAX_QUERY_COMPLEXITY)
        .finish()
}

/// Create a schema builder with the search service attached.
///
/// Remember to call `.limit_depth()` and `.limit_complexity()` before `.finish()`.
pub fn schema_builder(
    service: Arc<SearchService>,
) -> SchemaBuilder<BookQuery, EmptyMutation, EmptySubscription> {
    Schema::build(BookQuery, EmptyMutation, EmptySubscription).data(service)
}

// -----------------------------------------------------------------------------
// Query
// -----------------------------------------------------------------------------

/// Query root.
#[derive(Default)]
pub struct BookQuery;

#[Object]
impl BookQuery {
    /// Search a collection with a JSON filter, one page at a time.
    ///
    /// `query` uses the structured filter grammar, e.g.
    /// `{"author": "Frank Herbert", "year": {"$gte": 1960}}`.
    /// `pageNumber` starts at 1; `limit` is the page size.
    async fn search<'ctx>(
        &self,
        ctx: &Context<'ctx>,
        collection: String,
        query: String,
        page_number: i32,
        limit: i32,
    ) -> Result<BookConnection> {
        let collection = Collection::parse(&collection).map_err(to_graphql_error)?;
        debug!(%collection, page_number, limit, "search request");

        let service = ctx.data::<Arc<SearchService>>()?;
        let connection = service
            .search(&query, page_number, limit)
            .await
            .map_err(to_graphql_error)?;

        Ok(BookConnection::from(connection))
    }
}

// -----------------------------------------------------------------------------
// GraphQL Types
// -----------------------------------------------------------------------------

/// Book type.
#[derive(async_graphql::SimpleObject)]
pub struct Book {
    pub id: ID,
    pub title: String,
    pub author: String,
    pub year: i32,
}

impl From<folio_core::models::Book> for Book {
    fn from(b: folio_core::models::Book) -> Self {
        Self {
            id: ID(b.id.0),
            title: b.title,
            author: b.author,
            year: b.year,
        }
    }
}

/// Page metadata for a search result.
#[derive(async_graphql::SimpleObject)]
pub struct PageInfo {
    /// Requested page number (1-indexed).
    pub current: i32,
    /// Requested page size.
    pub size: i32,
    /// Total number of matching books.
    pub total: i64,
}

#[derive(async_graphql::SimpleObject)]
pub struct BookEdge {
    pub cursor: ID,
    pub node: Book,
}

#[derive(async_graphql::SimpleObject)]
pub struct BookConnection {
    pub page: PageInfo,
    pub edges: Vec<BookEdge>,
}

impl From<folio_core::ports::Connection<folio_core::models::Book>> for BookConnection {
    fn from(conn: folio_core::ports::Connection<folio_core::models::Book>) -> Self {
        Self {
            page: PageInfo {
                current: conn.page.current as i32,
                size: conn.page.size as i32,
                total: conn.page.total as i64,
            },
            edges: conn
                .edges
                .into_iter()
                .map(|e| BookEdge {
                    cursor: ID(e.cursor.value),
                    node: Book::from(e.node),
                })
                .collect(),
        }
    }
}

// -----------------------------------------------------------------------------
// Errors
// -----------------------------------------------------------------------------

/// Convert a search error into a GraphQL error carrying `extensions.code`.
fn to_graphql_error(err: SearchError) -> async_graphql::Error {
    let code = err.code();
    async_graphql::Error::new(err.to_string()).extend_with(|_, e| e.set("code", code))
}

#[cfg(test)]
mod tests {
    use folio_core::models::NewBook;
    use folio_core::services::SearchConfig;
    use folio_storage::MemoryBookRepository;
    use serde_json::json;

    use super::*;

    fn three_books() -> Arc<MemoryBookRepository> {
        Arc::new(MemoryBookRepository::with_books([
            NewBook {
                title: "Dune".into(),
                author: "Frank Herbert".into(),
                year: 1965,
            },
            NewBook {
                title: "Emma".into(),
                author: "Jane Austen".into(),
                year: 1815,
            },
            NewBook {
                title: "Solaris".into(),
                author: "Stanislaw Lem".into(),
                year: 1961,
            },
        ]))
    }

    fn schema_for(repo: Arc<MemoryBookRepository>) -> FolioSchema {
        let service = SearchService::new(repo, SearchConfig::default());
        build_schema(Arc::new(service))
    }

    fn search_request(
        collection: &str,
        query: &str,
        page: i32,
        limit: i32,
    ) -> async_graphql::Request {
        async_graphql::Request::new(
            r#"query Search($collection: String!, $query: String!, $page: Int!, $limit: Int!) {
                search(collection: $collection, query: $query, pageNumber: $page, limit: $limit) {
                    page { current size total }
                    edges { cursor node { id title author year } }
                }
            }"#,
        )
        .variables(async_graphql::Variables::from_json(json!({
            "collection": collection,
            "query": query,
            "page": page,
            "limit": limit,
        })))
    }

    async fn run(
        schema: &FolioSchema,
        collection: &str,
        query: &str,
        page: i32,
        limit: i32,
    ) -> async_graphql::Response {
        schema
            .execute(search_request(collection, query, page, limit))
            .await
    }

    fn error_code(response: &async_graphql::Response) -> Option<String> {
        let value = response.errors.first()?.extensions.as_ref()?.get("code")?;
        match value {
            async_graphql::Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_first_page() {
        let schema = schema_for(three_books());
        let response = run(&schema, "Books", "{}", 1, 2).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);

        let data = response.data.into_json().unwrap();
        assert_eq!(
            data["search"]["page"],
            json!({ "current": 1, "size": 2, "total": 3 })
        );
        let edges = data["search"]["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0]["node"]["title"], "Dune");
        assert_eq!(edges[0]["cursor"], edges[0]["node"]["id"]);
    }

    #[tokio::test]
    async fn test_last_and_past_last_page() {
        let schema = schema_for(three_books());

        let data = run(&schema, "Books", "{}", 2, 2).await.data.into_json().unwrap();
        assert_eq!(
            data["search"]["page"],
            json!({ "current": 2, "size": 2, "total": 3 })
        );
        assert_eq!(data["search"]["edges"].as_array().unwrap().len(), 1);
        assert_eq!(data["search"]["edges"][0]["node"]["title"], "Solaris");

        let data = run(&schema, "Books", "{}", 3, 2).await.data.into_json().unwrap();
        assert_eq!(data["search"]["page"]["total"], 3);
        assert!(data["search"]["edges"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_filtered_search() {
        let schema = schema_for(three_books());
        let response = run(&schema, "Books", r#"{"year": {"$gt": 1900}}"#, 1, 10).await;

        let data = response.data.into_json().unwrap();
        assert_eq!(data["search"]["page"]["total"], 2);
        assert_eq!(data["search"]["edges"][1]["node"]["author"], "Stanislaw Lem");
        assert_eq!(data["search"]["edges"][1]["node"]["year"], 1961);
    }

    // Test critique: collection invalide = aucun accès au store
    #[tokio::test]
    async fn test_invalid_collection_does_not_touch_store() {
        let repo = three_books();
        let schema = schema_for(repo.clone());

        let response = run(&schema, "Magazines", "{}", 1, 2).await;
        assert_eq!(error_code(&response).as_deref(), Some("INVALID_COLLECTION"));
        assert_eq!(repo.reads(), 0);
    }

    #[tokio::test]
    async fn test_malformed_filter() {
        let repo = three_books();
        let schema = schema_for(repo.clone());

        let response = run(&schema, "Books", "title=Dune", 1, 2).await;
        assert_eq!(error_code(&response).as_deref(), Some("MALFORMED_FILTER"));
        assert_eq!(repo.reads(), 0);
    }

    #[tokio::test]
    async fn test_invalid_page_number() {
        let repo = three_books();
        let schema = schema_for(repo.clone());

        let response = run(&schema, "Books", "{}", 0, 2).await;
        assert_eq!(error_code(&response).as_deref(), Some("INVALID_PAGINATION"));
        assert_eq!(repo.reads(), 0);
    }

    #[tokio::test]
    async fn test_repeated_query_is_stable() {
        let schema = schema_for(three_books());

        let a = run(&schema, "Books", "{}", 1, 3).await.data.into_json().unwrap();
        let b = run(&schema, "Books", "{}", 1, 3).await.data.into_json().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_schema_exposes_only_search() {
        let sdl = schema_for(three_books()).sdl();
        assert!(sdl.contains("search("));
        assert!(sdl.contains("pageNumber: Int!"));
        assert!(sdl.contains("limit: Int!"));
        assert!(sdl.contains("): BookConnection!"));
        assert!(!sdl.contains("type Mutation"));
    }
}
