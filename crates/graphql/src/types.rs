//! GraphQL type definitions.

use async_graphql::{EmptyMutation, EmptySubscription, Schema};

use crate::schema::BookQuery;

/// The Folio GraphQL schema type.
pub type FolioSchema = Schema<BookQuery, EmptyMutation, EmptySubscription>;
