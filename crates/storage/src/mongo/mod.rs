//! MongoDB storage adapter.
//!
//! This module implements the repository traits defined in `folio-core`
//! using MongoDB as the backing document store.
//!
//! # Architecture
//!
//! - [`Database`] - Client, connection pool and lifecycle
//! - [`MongoBookRepository`] - `BookRepository` over the books collection
//!
//! # Usage
//!
//! ```ignore
//! let config = DatabaseConfig::from_env();
//! let db = Database::connect(&config).await?;
//!
//! let repository = MongoBookRepository::new(&db);
//! ```

mod book_repo;
mod database;
mod helpers;

pub use book_repo::MongoBookRepository;
pub use database::{Database, DatabaseConfig};
