//! Folio - GraphQL book search server.
//!
//! # Usage
//!
//! ```bash
//! # Start against a local MongoDB
//! folio
//!
//! # Start with environment overrides
//! MONGODB_URI=mongodb://db:27017 MONGODB_DATABASE=library folio
//!
//! # Start without MongoDB, serving books from a JSON file
//! folio --in-memory --seed-file books.json
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::signal;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use folio_core::metrics::init_metrics;
use folio_core::ports::BookRepository;
use folio_core::services::{DEFAULT_MAX_PAGE_SIZE, SearchConfig, SearchService};
use folio_graphql::{ServerConfig, build_schema, serve_with_shutdown};
use folio_storage::{Database, DatabaseConfig, MemoryBookRepository, MongoBookRepository};

/// Folio CLI - GraphQL book search.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Folio - GraphQL search API over a MongoDB book collection")]
#[command(version)]
struct Cli {
    /// MongoDB connection string.
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    mongodb_uri: String,

    /// MongoDB database name.
    #[arg(long, env = "MONGODB_DATABASE", default_value = "folio")]
    database: String,

    /// Collection holding book documents.
    #[arg(long, env = "BOOKS_COLLECTION", default_value = "books")]
    books_collection: String,

    /// Serve books from memory instead of MongoDB.
    #[arg(long)]
    in_memory: bool,

    /// JSON array of `{title, author, year}` loaded into the in-memory store.
    #[arg(long, requires = "in_memory")]
    seed_file: Option<PathBuf>,

    /// GraphQL server host.
    #[arg(long, env = "GRAPHQL_HOST", default_value = "0.0.0.0")]
    graphql_host: String,

    /// GraphQL server port.
    #[arg(long, env = "GRAPHQL_PORT", default_value = "4000")]
    graphql_port: u16,

    /// Disable the GraphiQL playground.
    #[arg(long, env = "DISABLE_PLAYGROUND")]
    disable_playground: bool,

    /// Largest page size accepted by `search`.
    #[arg(long, env = "MAX_PAGE_SIZE", default_value_t = DEFAULT_MAX_PAGE_SIZE)]
    max_page_size: u32,

    /// Prometheus metrics port.
    #[arg(long, env = "METRICS_PORT", default_value = "9090")]
    metrics_port: u16,

    /// Enable JSON log output.
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.json_logs);

    // Prometheus metrics exporter (optional - failures don't crash the app)
    let metrics_enabled =
        match format!("0.0.0.0:{}", cli.metrics_port).parse::<std::net::SocketAddr>() {
            Ok(metrics_addr) => match PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()
            {
                Ok(()) => {
                    init_metrics();
                    true
                }
                Err(e) => {
                    warn!(
                        "⚠️  Failed to start metrics exporter: {}. Continuing without metrics.",
                        e
                    );
                    false
                }
            },
            Err(e) => {
                warn!("⚠️  Invalid metrics address: {}. Continuing without metrics.", e);
                false
            }
        };

    // ─────────────────────────────────────────────────────────────────────────
    // 🚀 STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    info!("🚀 Starting Folio");

    // ─────────────────────────────────────────────────────────────────────────
    // 🗄️ STORE
    // ─────────────────────────────────────────────────────────────────────────
    let (repository, db): (Arc<dyn BookRepository>, Option<Database>) = if cli.in_memory {
        let repository = match &cli.seed_file {
            Some(path) => {
                let json = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read seed file {}", path.display()))?;
                MemoryBookRepository::from_seed_json(&json).context("Failed to load seed file")?
            }
            None => MemoryBookRepository::new(),
        };
        info!(books = repository.len().await, "🗄️  In-memory store ready");

        let repository: Arc<dyn BookRepository> = Arc::new(repository);
        (repository, None)
    } else {
        debug!(
            uri = %mask_password(&cli.mongodb_uri),
            database = %cli.database,
            "MongoDB endpoint"
        );

        let db_config = DatabaseConfig {
            books_collection: cli.books_collection.clone(),
            ..DatabaseConfig::for_graphql(&cli.mongodb_uri, &cli.database)
        };

        info!("🗄️  Connecting to MongoDB...");
        let db = Database::connect(&db_config)
            .await
            .context("Failed to connect to MongoDB")?;
        info!(collection = %cli.books_collection, "🗄️  MongoDB ready");

        let repository: Arc<dyn BookRepository> = Arc::new(MongoBookRepository::new(&db));
        (repository, Some(db))
    };

    // ─────────────────────────────────────────────────────────────────────────
    // ⚡ SERVICES START
    // ─────────────────────────────────────────────────────────────────────────
    let search_config = SearchConfig {
        max_page_size: cli.max_page_size,
    };
    let service = Arc::new(SearchService::new(repository, search_config));
    let schema = build_schema(service);

    let graphql_config = ServerConfig {
        host: cli.graphql_host.clone(),
        port: cli.graphql_port,
        enable_playground: !cli.disable_playground,
    };

    // ─────────────────────────────────────────────────────────────────────────
    // ✅ READY
    // ─────────────────────────────────────────────────────────────────────────
    info!("✅ Folio ready");
    info!("   ⚡ GraphQL:  http://localhost:{}/graphql", cli.graphql_port);
    if metrics_enabled {
        info!(
            "   📊 Metrics:  http://localhost:{}/metrics",
            cli.metrics_port
        );
    } else {
        info!("   📊 Metrics:  disabled");
    }
    info!("   Press Ctrl+C to stop");

    serve_with_shutdown(schema, graphql_config, shutdown_signal())
        .await
        .context("GraphQL server error")?;

    // ─────────────────────────────────────────────────────────────────────────
    // 🛑 SHUTDOWN
    // ─────────────────────────────────────────────────────────────────────────
    info!("🛑 Shutting down...");
    if let Some(db) = db {
        db.close().await;
        debug!("MongoDB client closed");
    }

    info!("🛑 Shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber.
fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

/// Mask password in connection string for logging.
fn mask_password(url_str: &str) -> String {
    match url::Url::parse(url_str) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("****"));
            }
            url.to_string()
        }
        Err(_) => redact_userinfo(url_str),
    }
}

/// Mask the password of URIs the `url` crate rejects, such as multi-host
/// replica set strings (`mongodb://user:pw@h1:27017,h2:27017/db`).
fn redact_userinfo(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://").map(|i| i + 3) else {
        return uri.to_string();
    };
    let options_start = uri.find('?').unwrap_or(uri.len()).max(scheme_end);

    let Some(at) = uri[scheme_end..options_start].rfind('@').map(|i| scheme_end + i) else {
        return uri.to_string();
    };
    match uri[scheme_end..at].split_once(':') {
        Some((user, _)) => format!("{}{}:****{}", &uri[..scheme_end], user, &uri[at..]),
        None => uri.to_string(),
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
