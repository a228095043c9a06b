//! Quill blog API server binary.
//!
//! Connects to PostgreSQL, applies migrations and serves the REST API until
//! interrupted. `--in-memory` swaps the database for a process-local store.

use std::sync::Arc;

use clap::Parser;
use quill_api::config::ApiConfig;
use quill_core::auth::jwt::{DEFAULT_TTL_HOURS, MAX_TTL_HOURS, resolve_jwt_secret};
use quill_core::auth::password::DEFAULT_COST;
use quill_core::store::{BlogStore, MemoryStore, PgStore};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "quill_server", about = "Quill blog API server")]
struct Args {
    /// Port to listen on (0 = ephemeral).
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/quill"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Access token lifetime in hours (1 to 87600).
    #[arg(
        long,
        env = "JWT_TTL_HOURS",
        default_value_t = DEFAULT_TTL_HOURS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_TTL_HOURS)
    )]
    jwt_ttl_hours: i64,

    /// bcrypt cost for newly hashed passwords (4 to 31).
    #[arg(
        long,
        env = "BCRYPT_COST",
        default_value_t = DEFAULT_COST,
        value_parser = clap::value_parser!(u32).range(4..=31)
    )]
    bcrypt_cost: u32,

    /// Keep all data in memory instead of PostgreSQL. Nothing survives a restart.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,quill_api=debug,quill_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        database_url: args.database_url,
        jwt_secret: resolve_jwt_secret(),
        jwt_ttl_hours: args.jwt_ttl_hours,
        bcrypt_cost: args.bcrypt_cost,
    };

    let store: Arc<dyn BlogStore> = if args.in_memory {
        info!("using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        info!(
            database_url = %config.database_url,
            max_connections = args.max_connections,
            "configuring connection pool"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&config.database_url)
            .await?;

        info!("running database migrations");
        quill_api::migrate(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;

    let app = quill_api::router(quill_api::AppState::new(store, config));

    info!(addr = %local_addr, "REST API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
