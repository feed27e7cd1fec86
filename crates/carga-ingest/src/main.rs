//! Carga Ingest - bulk loader for delimited buyer files

use anyhow::{Context, Result};
use carga_common::logging::{init_logging, LogConfig, LogLevel};
use carga_ingest::config::Config;
use carga_ingest::pipeline::{self, BatchWriter};
use carga_ingest::db;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "carga-ingest")]
#[command(author, version, about = "Bulk loader for delimited buyer files")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Load a delimited buyer file into PostgreSQL
    Load {
        /// Input file (first line is treated as a header and discarded)
        #[arg(short, long)]
        input: PathBuf,

        /// Number of concurrent workers
        #[arg(long)]
        workers: Option<usize>,

        /// Maximum lines per block (one block = one transaction)
        #[arg(long)]
        block_size: Option<usize>,

        /// Bounded queue capacity between reader and workers
        #[arg(long)]
        queue_capacity: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::from_env()
        .unwrap_or_default()
        .with_level(log_level)
        .with_file_prefix("carga-ingest");
    init_logging(&log_config)?;

    match cli.command {
        Command::Load {
            input,
            workers,
            block_size,
            queue_capacity,
        } => {
            let mut config = Config::load()?;
            if let Some(workers) = workers {
                config.pipeline.workers = workers;
            }
            if let Some(block_size) = block_size {
                config.pipeline.max_block_size = block_size;
            }
            if let Some(queue_capacity) = queue_capacity {
                config.pipeline.queue_capacity = queue_capacity;
            }
            config.validate()?;

            load(&config, &input).await?;
        }
    }

    Ok(())
}

async fn load(config: &Config, input: &PathBuf) -> Result<()> {
    let pool = db::connect(&config.database).await?;
    db::ensure_schema(&pool).await?;

    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("Failed to open input file {}", input.display()))?;
    let reader = tokio::io::BufReader::new(file);

    let writer = Arc::new(BatchWriter::new(pool));
    let summary = pipeline::run(reader, writer, &config.pipeline).await?;

    info!(
        input = %input.display(),
        lines_read = summary.lines_read,
        rows_inserted = summary.rows_inserted,
        blocks_committed = summary.blocks_committed,
        blocks_failed = summary.blocks_failed,
        lines_skipped = summary.lines_skipped.total(),
        elapsed = ?summary.elapsed,
        "Load complete"
    );

    Ok(())
}
