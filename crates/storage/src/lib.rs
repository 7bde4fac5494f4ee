//! Storage layer for Folio.
//!
//! This crate provides implementations of the [`BookRepository`] port
//! defined in `folio-core`:
//!
//! - [`mongo`] - MongoDB-backed repository (production)
//! - [`memory`] - In-process repository (tests, local demos)
//!
//! # Usage
//!
//! ```ignore
//! use folio_storage::{Database, DatabaseConfig, MongoBookRepository};
//!
//! let config = DatabaseConfig::for_graphql(&mongodb_uri, "folio");
//! let db = Database::connect(&config).await?;
//!
//! let repository = Arc::new(MongoBookRepository::new(&db));
//! ```
//!
//! [`BookRepository`]: folio_core::ports::BookRepository

pub mod memory;
pub mod mongo;

pub use memory::MemoryBookRepository;
pub use mongo::{Database, DatabaseConfig, MongoBookRepository};
