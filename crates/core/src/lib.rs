//! Core domain layer for Folio.
//!
//! This crate contains the domain models, the filter grammar, port traits
//! (interfaces) and the search service. It follows hexagonal architecture
//! principles - this is the innermost layer with no dependencies on
//! infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      folio (binary)                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │        folio-graphql          │        folio-storage        │
//! │     (resolver, server)        │   (MongoDB, in-memory)      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      folio-core  ← YOU ARE HERE             │
//! │          (models, filter, ports, search service)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Book, Collection)
//! - [`filter`] - Structured filter grammar and in-process evaluation
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Search service
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Search Lifecycle
//!
//! 1. The resolver validates the collection name
//! 2. The filter text is decoded into a [`filter::BookFilter`]
//! 3. The page request is validated
//! 4. Matches are counted and the requested window is fetched
//! 5. Books are wrapped in edges keyed by their identifier

pub mod error;
pub mod filter;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
