// Main entry point for the scheduling API server

use std::sync::Arc;

use anyhow::{Context, Result};
use server_core::kernel::ServerDeps;
use server_core::server::build_app;
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lingora scheduling API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Wire dependencies: HTTP-backed side effects when a downstream service
    // is configured, log-only sinks otherwise
    let deps = match config.notification_base_url.clone() {
        Some(base_url) => {
            tracing::info!(%base_url, "Using HTTP side-effect services");
            ServerDeps::with_http_services(pool, base_url)
        }
        None => {
            tracing::info!("No NOTIFICATION_BASE_URL set, using log-only side effects");
            ServerDeps::log_only(pool)
        }
    };

    // Build application
    let app = build_app(Arc::new(deps));

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
