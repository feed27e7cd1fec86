//! Configuration management

use carga_common::{CargaError, Result};

use crate::pipeline::PipelineConfig;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/carga";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default number of connection attempts before giving up.
pub const DEFAULT_DATABASE_CONNECT_ATTEMPTS: u32 = 10;

/// Default delay between connection attempts in seconds.
pub const DEFAULT_DATABASE_RETRY_DELAY_SECS: u64 = 5;

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default maximum lines per block.
pub const DEFAULT_BLOCK_SIZE: usize = 1500;

/// Default bounded-queue capacity between segmenter and workers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Loader configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub pipeline: PipelineConfig,
}

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    /// Bounded retry budget for the initial connection
    pub connect_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
            connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
            connect_attempts: DEFAULT_DATABASE_CONNECT_ATTEMPTS,
            retry_delay_secs: DEFAULT_DATABASE_RETRY_DELAY_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// Environment variables:
    /// - `DATABASE_URL`, `DATABASE_MAX_CONNECTIONS`, `DATABASE_MIN_CONNECTIONS`,
    ///   `DATABASE_CONNECT_TIMEOUT`, `DATABASE_CONNECT_ATTEMPTS`,
    ///   `DATABASE_RETRY_DELAY`
    /// - `CARGA_WORKERS`, `CARGA_BLOCK_SIZE`, `CARGA_QUEUE_CAPACITY`
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
                max_connections: env_parse(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_parse(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_parse(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                connect_attempts: env_parse(
                    "DATABASE_CONNECT_ATTEMPTS",
                    DEFAULT_DATABASE_CONNECT_ATTEMPTS,
                ),
                retry_delay_secs: env_parse(
                    "DATABASE_RETRY_DELAY",
                    DEFAULT_DATABASE_RETRY_DELAY_SECS,
                ),
            },
            pipeline: PipelineConfig {
                workers: env_parse("CARGA_WORKERS", DEFAULT_WORKERS),
                max_block_size: env_parse("CARGA_BLOCK_SIZE", DEFAULT_BLOCK_SIZE),
                queue_capacity: env_parse("CARGA_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.url.is_empty() {
            return Err(CargaError::config("DATABASE_URL must not be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(CargaError::config("max_connections must be at least 1"));
        }
        if self.pipeline.workers == 0 {
            return Err(CargaError::config("workers must be at least 1"));
        }
        if self.pipeline.max_block_size == 0 {
            return Err(CargaError::config("block size must be at least 1"));
        }
        if self.pipeline.queue_capacity == 0 {
            return Err(CargaError::config("queue capacity must be at least 1"));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config {
            database: DatabaseConfig::default(),
            pipeline: PipelineConfig::default(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let config = Config {
            database: DatabaseConfig::default(),
            pipeline: PipelineConfig {
                workers: 0,
                ..PipelineConfig::default()
            },
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_block_size_rejected() {
        let config = Config {
            database: DatabaseConfig::default(),
            pipeline: PipelineConfig {
                max_block_size: 0,
                ..PipelineConfig::default()
            },
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_database_url_rejected() {
        let config = Config {
            database: DatabaseConfig {
                url: String::new(),
                ..DatabaseConfig::default()
            },
            pipeline: PipelineConfig::default(),
        };
        assert!(config.validate().is_err());
    }
}
