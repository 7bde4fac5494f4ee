//! MongoDB client connection and configuration.

use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tracing::{debug, instrument};

use folio_core::error::{StorageError, StorageResult};

const DEFAULT_URL: &str = "mongodb://localhost:27017";
const DEFAULT_DATABASE: &str = "folio";
const DEFAULT_BOOKS_COLLECTION: &str = "books";

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// MongoDB connection string.
    pub url: String,
    /// Database name.
    pub database: String,
    /// Collection holding book documents.
    pub books_collection: String,
    /// Maximum number of connections in the pool.
    pub max_pool_size: u32,
    /// Minimum number of connections to maintain.
    pub min_pool_size: u32,
    /// Timeout for establishing a single connection.
    pub connect_timeout: Duration,
    /// How long an operation waits for a suitable server.
    pub server_selection_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            books_collection: DEFAULT_BOOKS_COLLECTION.to_string(),
            max_pool_size: 20,
            min_pool_size: 2,
            connect_timeout: Duration::from_secs(10),
            server_selection_timeout: Duration::from_secs(30),
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration suited to serving GraphQL queries.
    ///
    /// Short server selection timeout so a missing store fails requests
    /// quickly instead of holding them open.
    pub fn for_graphql(url: &str, database: &str) -> Self {
        Self {
            url: url.to_string(),
            database: database.to_string(),
            max_pool_size: 15,
            min_pool_size: 2,
            connect_timeout: Duration::from_secs(5),
            server_selection_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }
}

/// MongoDB client wrapper.
///
/// The client owns a connection pool and is cheap to clone.
#[derive(Clone)]
pub struct Database {
    client: Client,
    database: mongodb::Database,
    books_collection: String,
}

impl Database {
    /// Connect to the database with the given configuration.
    ///
    /// Pings the server so that misconfiguration surfaces at startup.
    #[instrument(skip_all, fields(database = %config.database))]
    pub async fn connect(config: &DatabaseConfig) -> StorageResult<Self> {
        debug!(
            max_pool = config.max_pool_size,
            min_pool = config.min_pool_size,
            "Creating MongoDB client"
        );

        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;
        options.app_name = Some("folio".to_string());
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.server_selection_timeout);

        let client = Client::with_options(options)
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;
        let database = client.database(&config.database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        debug!("MongoDB client connected");

        Ok(Self {
            client,
            database,
            books_collection: config.books_collection.clone(),
        })
    }

    /// Typed handle to a collection of this database.
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database.collection(name)
    }

    /// Name of the collection holding book documents.
    pub fn books_collection(&self) -> &str {
        &self.books_collection
    }

    /// Close the client and its connection pool.
    pub async fn close(&self) {
        self.client.clone().shutdown().await;
    }
}
