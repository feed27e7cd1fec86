//! Carga Ingest Library
//!
//! Bulk-loads delimited buyer files into PostgreSQL: streams the input,
//! segments it into bounded blocks, validates and normalizes each record
//! (CPF check digits, CNPJ-shaped store identifiers, null sentinels), and
//! commits each block in its own transaction through a fixed worker pool.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use carga_ingest::pipeline::{self, BatchWriter, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = sqlx::PgPool::connect("postgresql://localhost/carga").await?;
//!     let file = tokio::fs::File::open("base_teste.txt").await?;
//!     let reader = tokio::io::BufReader::new(file);
//!
//!     let writer = Arc::new(BatchWriter::new(pool));
//!     let summary = pipeline::run(reader, writer, &PipelineConfig::default()).await?;
//!     tracing::info!(rows = summary.rows_inserted, "done");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod pipeline;
