//! Application entry point.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use secrecy::SecretString;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use wallet_screening_service::api::{RouterConfig, create_router_with_config};
use wallet_screening_service::app::{AppState, ServiceConfig};
use wallet_screening_service::domain::{ConfigError, MAX_BATCH_SIZE};
use wallet_screening_service::infra::{PostgresClient, PostgresConfig};

/// Application configuration
struct Config {
    database_url: SecretString,
    host: String,
    port: u16,
    db_max_connections: u32,
    /// Concurrent per-item tasks in one batch (default: 16, max: 100)
    batch_max_concurrency: usize,
    /// Per-call persistence timeout in milliseconds (default: 5000)
    store_timeout_ms: u64,
    /// Whole-request timeout in seconds (default: 30)
    request_timeout_secs: u64,
}

impl Config {
    fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL".to_string()))?;
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_env("PORT", 3000)?;
        let db_max_connections = parse_env("DB_MAX_CONNECTIONS", 10)?;
        let batch_max_concurrency =
            parse_env::<usize>("BATCH_MAX_CONCURRENCY", 16)?.clamp(1, MAX_BATCH_SIZE);
        let store_timeout_ms = parse_env("STORE_TIMEOUT_MS", 5_000)?;
        let request_timeout_secs = parse_env("REQUEST_TIMEOUT_SECS", 30)?;

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            batch_max_concurrency,
            store_timeout_ms,
            request_timeout_secs,
        })
    }
}

/// Read an optional variable, failing loudly on an unparsable value
fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{}'", raw),
                })
        }
        _ => Ok(default),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,sqlx=warn"));

    let json = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_tracing();

    info!("🏗️  Wallet Screening Service v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;

    info!("📦 Initializing infrastructure...");

    let db_config = PostgresConfig {
        max_connections: config.db_max_connections,
        ..Default::default()
    };
    let postgres_client = PostgresClient::new(&config.database_url, db_config)
        .await
        .context("Failed to connect to PostgreSQL")?;
    postgres_client.run_migrations().await?;
    info!("   ✓ Database connected and migrations applied");

    let service_config = ServiceConfig {
        store_timeout: Duration::from_millis(config.store_timeout_ms),
        max_concurrency: config.batch_max_concurrency,
        ..Default::default()
    };
    info!(
        "   ✓ Batch screening: up to {} addresses, {} concurrent, store timeout {}ms",
        service_config.max_batch_size, service_config.max_concurrency, config.store_timeout_ms
    );

    let app_state = Arc::new(AppState::with_config(
        Arc::new(postgres_client),
        service_config,
    ));

    let router = create_router_with_config(
        app_state,
        RouterConfig {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            ..Default::default()
        },
    );

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/swagger-ui", addr);
    info!("📄 OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
