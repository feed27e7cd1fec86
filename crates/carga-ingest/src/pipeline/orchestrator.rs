//! Worker pool and pipeline orchestration
//!
//! Wires the single-producer segmenter to a fixed pool of consumer workers
//! through a bounded queue. Each worker takes the next available block,
//! validates its lines, hands the validated records to the block sink, and
//! immediately asks for the next block. Per-line and per-block failures are
//! logged and counted but never abort the run; only a read failure on the
//! input stream is fatal.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncBufRead;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::sanitize;
use super::segmenter::run_segmenter;
use super::types::{Block, PipelineConfig, RunSummary, SkipCounts};
use super::writer::BlockSink;

/// Per-worker counters, merged into the run summary at the end
#[derive(Debug, Default)]
struct WorkerStats {
    blocks_committed: u64,
    blocks_failed: u64,
    rows_inserted: u64,
    skipped: SkipCounts,
}

/// Run the full pipeline: segment `reader` into blocks, fan the blocks out
/// to `config.workers` concurrent workers, and write each block through
/// `sink`.
///
/// Returns after the queue has closed and every in-flight block has
/// finished. The committed row set is independent of the worker count; only
/// timing and interleaving change with it.
pub async fn run<R, S>(reader: R, sink: Arc<S>, config: &PipelineConfig) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    S: BlockSink + ?Sized + 'static,
{
    let started = Instant::now();
    let workers = config.workers.max(1);

    let (tx, rx) = mpsc::channel::<Block>(config.queue_capacity.max(1));
    let rx = Arc::new(Mutex::new(rx));

    info!(
        workers,
        max_block_size = config.max_block_size,
        queue_capacity = config.queue_capacity,
        "Starting load pipeline"
    );

    let max_block_size = config.max_block_size.max(1);
    let segmenter = tokio::spawn(run_segmenter(reader, max_block_size, tx));

    let mut pool = JoinSet::new();
    for worker_id in 0..workers {
        let rx = Arc::clone(&rx);
        let sink = Arc::clone(&sink);
        pool.spawn(async move { worker_loop(worker_id, rx, sink).await });
    }

    let mut summary = RunSummary::default();
    while let Some(joined) = pool.join_next().await {
        let stats = joined.context("Worker task panicked")?;
        summary.blocks_committed += stats.blocks_committed;
        summary.blocks_failed += stats.blocks_failed;
        summary.rows_inserted += stats.rows_inserted;
        summary.lines_skipped.merge(&stats.skipped);
    }

    // The fatal path: a stream read error surfaces here, after the workers
    // have drained whatever blocks were already queued.
    summary.lines_read = segmenter
        .await
        .context("Segmenter task panicked")?
        .context("Input stream read failed")?;
    summary.elapsed = started.elapsed();

    info!(
        lines_read = summary.lines_read,
        blocks_committed = summary.blocks_committed,
        blocks_failed = summary.blocks_failed,
        rows_inserted = summary.rows_inserted,
        lines_skipped = summary.lines_skipped.total(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "Load pipeline finished"
    );

    Ok(summary)
}

/// Consumer loop: take the next available block, validate, write, repeat
/// until the queue closes.
async fn worker_loop<S>(
    worker_id: usize,
    rx: Arc<Mutex<mpsc::Receiver<Block>>>,
    sink: Arc<S>,
) -> WorkerStats
where
    S: BlockSink + ?Sized,
{
    let mut stats = WorkerStats::default();
    debug!(worker_id, "Worker started");

    loop {
        let block = {
            let mut rx = rx.lock().await;
            rx.recv().await
        };
        let Some(block) = block else {
            debug!(worker_id, "Queue closed, worker exiting");
            break;
        };

        let mut buyers = Vec::with_capacity(block.len());
        for line in &block {
            match sanitize::parse_line(line) {
                Ok(buyer) => buyers.push(buyer),
                Err(rejection) => {
                    warn!(
                        worker_id,
                        reason = rejection.reason.as_str(),
                        value = %rejection.value,
                        "Skipping line"
                    );
                    stats.skipped.record(rejection.reason);
                }
            }
        }

        match sink.write_block(&buyers).await {
            Ok(rows) => {
                stats.blocks_committed += 1;
                stats.rows_inserted += rows;
            }
            Err(e) => {
                // Terminal for this block only; the run continues.
                stats.blocks_failed += 1;
                error!(
                    worker_id,
                    lines = block.len(),
                    records = buyers.len(),
                    error = %e,
                    "Block write failed and was rolled back"
                );
            }
        }
    }

    stats
}
