//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, migrations, interpreter selection, and the
//! Axum server lifecycle.

use crate::config::Config;
use crate::domain::interpreter::DutyRateInterpreter;
use crate::infrastructure::persistence::{
    PgDocumentRepository, PgHtsRepository, PgTokenRepository,
};
use crate::infrastructure::reasoning::{GeminiInterpreter, RuleBasedInterpreter};
use crate::routes::app_router;
use crate::state::{AppState, ServiceSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Opens the connection pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the database is unreachable.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Picks the duty-rate interpreter: Gemini when an API key is configured,
/// rule-based otherwise.
///
/// # Errors
///
/// Returns an error if the Gemini client cannot be built.
pub fn build_interpreter(config: &Config) -> Result<Arc<dyn DutyRateInterpreter>> {
    match &config.gemini_api_key {
        Some(api_key) => {
            let interpreter = GeminiInterpreter::new(
                config.gemini_endpoint.clone(),
                config.gemini_model.clone(),
                api_key.clone(),
                config.reasoning_timeout(),
            )
            .context("Failed to configure Gemini interpreter")?
            .with_max_retries(config.reasoning_max_retries);
            Ok(Arc::new(interpreter))
        }
        None => Ok(Arc::new(RuleBasedInterpreter::new())),
    }
}

/// Wires repositories and services over `pool`.
///
/// # Errors
///
/// Returns an error if the interpreter cannot be built.
pub fn build_state(config: &Config, pool: PgPool) -> Result<AppState> {
    let pool = Arc::new(pool);
    let interpreter = build_interpreter(config)?;
    tracing::info!(interpreter = interpreter.name(), "Duty-rate interpreter selected");

    Ok(AppState::new(
        Arc::new(PgTokenRepository::new(pool.clone())),
        Arc::new(PgHtsRepository::new(pool.clone())),
        Arc::new(PgDocumentRepository::new(pool)),
        interpreter,
        ServiceSettings {
            token_signing_secret: config.token_signing_secret.clone(),
            reasoning_timeout: config.reasoning_timeout(),
            duty_concurrency: config.duty_concurrency,
        },
    ))
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Duty-rate interpreter
/// - Axum HTTP server with graceful shutdown on Ctrl-C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let state = build_state(&config, pool)?;

    let app = app_router(state, config.behind_proxy);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
