//! GraphQL API for Folio.
//!
//! Exposes a single `search` query over the book collection and serves it
//! over HTTP.
//!
//! ```ignore
//! use folio_graphql::{ServerConfig, build_schema, serve_with_shutdown};
//!
//! let schema = build_schema(Arc::new(search_service));
//! serve_with_shutdown(schema, ServerConfig::default(), shutdown_signal()).await?;
//! ```

mod schema;
mod server;
mod types;

pub use schema::{
    Book, BookConnection, BookEdge, BookQuery, MAX_QUERY_COMPLEXITY, MAX_QUERY_DEPTH, PageInfo,
    build_schema, schema_builder,
};
pub use server::{ServerConfig, serve_with_shutdown};
pub use types::FolioSchema;
