//! Database bootstrap: connection pool with bounded retry, and table
//! provisioning
//!
//! These are collaborators of the pipeline, not part of it: the pipeline
//! receives a live, already-validated pool and assumes the `pessoas`
//! relation exists.

use anyhow::{Context, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// DDL for the target relation, keyed by the primary identifier
const CREATE_PESSOAS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS pessoas (
    cpf VARCHAR(20) PRIMARY KEY,
    private BOOLEAN NOT NULL,
    incompleto BOOLEAN NOT NULL,
    data_ultima_compra DATE,
    ticket_medio DECIMAL(10,2),
    ticket_ultima_compra DECIMAL(10,2),
    loja_mais_frequente VARCHAR(255),
    loja_ultima_compra VARCHAR(255)
)
"#;

/// Connect to PostgreSQL with a bounded retry/backoff loop.
///
/// `PgPoolOptions::connect` establishes (and therefore health-checks) at
/// least one connection, so a returned pool is live.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs));

    let attempts = config.connect_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match options.clone().connect(&config.url).await {
            Ok(pool) => {
                info!(attempt, "Connected to PostgreSQL");
                return Ok(pool);
            }
            Err(e) => {
                warn!(
                    attempt,
                    attempts,
                    error = %e,
                    "Failed to connect to PostgreSQL"
                );
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_secs(config.retry_delay_secs)).await;
                }
            }
        }
    }

    Err(last_error
        .map(anyhow::Error::from)
        .unwrap_or_else(|| anyhow::anyhow!("No connection attempt was made")))
    .with_context(|| format!("Failed to connect to PostgreSQL after {} attempts", attempts))
}

/// Ensure the `pessoas` relation exists before ingestion starts
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_PESSOAS_TABLE)
        .execute(pool)
        .await
        .context("Failed to provision pessoas table")?;

    info!("pessoas table ready");
    Ok(())
}
