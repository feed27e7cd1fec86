//! Source segmenter
//!
//! Single producer of the pipeline: streams the input line-by-line, discards
//! the header line, groups data lines into blocks of at most
//! `max_block_size`, and publishes each block onto the bounded queue. The
//! queue closes when the sender is dropped, which signals completion to the
//! workers.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::types::Block;

/// Stream `reader` into blocks and publish them on `tx`.
///
/// Returns the number of data lines read (header excluded). A read failure
/// on the underlying stream is fatal for the whole run: the error is
/// returned and the queue closes with it, so the orchestrator can surface it
/// after the in-flight blocks drain. Blocks never share lines and preserve
/// the stream's relative line order.
pub async fn run_segmenter<R>(
    reader: R,
    max_block_size: usize,
    tx: mpsc::Sender<Block>,
) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    // The first line is always a header and is discarded.
    lines
        .next_line()
        .await
        .context("Failed to read header line")?;

    let mut block: Block = Vec::with_capacity(max_block_size);
    let mut lines_read = 0u64;
    let mut blocks_published = 0u64;

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read input line")?
    {
        block.push(line);
        lines_read += 1;

        if block.len() >= max_block_size {
            let full = std::mem::replace(&mut block, Vec::with_capacity(max_block_size));
            if tx.send(full).await.is_err() {
                // All workers are gone; nothing left to feed.
                debug!("Block queue closed by consumers, stopping segmenter");
                return Ok(lines_read);
            }
            blocks_published += 1;
        }
    }

    if !block.is_empty() && tx.send(block).await.is_ok() {
        blocks_published += 1;
    }

    info!(lines_read, blocks_published, "Segmentation finished");
    Ok(lines_read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn segment(input: &str, max_block_size: usize) -> (u64, Vec<Block>) {
        let (tx, mut rx) = mpsc::channel(64);
        let lines_read = run_segmenter(BufReader::new(input.as_bytes()), max_block_size, tx)
            .await
            .unwrap();

        let mut blocks = Vec::new();
        while let Some(block) = rx.recv().await {
            blocks.push(block);
        }
        (lines_read, blocks)
    }

    fn input_with_header(data_lines: usize) -> String {
        let mut s = String::from("header\n");
        for i in 0..data_lines {
            s.push_str(&format!("line{}\n", i));
        }
        s
    }

    #[tokio::test]
    async fn emits_ceil_k_over_m_blocks() {
        let (lines_read, blocks) = segment(&input_with_header(7), 3).await;

        assert_eq!(lines_read, 7);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].len(), 3);
        assert_eq!(blocks[1].len(), 3);
        assert_eq!(blocks[2].len(), 1);
    }

    #[tokio::test]
    async fn exact_multiple_has_no_partial_block() {
        let (lines_read, blocks) = segment(&input_with_header(6), 3).await;

        assert_eq!(lines_read, 6);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.len() == 3));
    }

    #[tokio::test]
    async fn header_is_discarded() {
        let (lines_read, blocks) = segment("header\nonly-data-line\n", 10).await;

        assert_eq!(lines_read, 1);
        assert_eq!(blocks, vec![vec!["only-data-line".to_string()]]);
    }

    #[tokio::test]
    async fn header_only_input_emits_nothing() {
        let (lines_read, blocks) = segment("header\n", 5).await;

        assert_eq!(lines_read, 0);
        assert!(blocks.is_empty());
    }

    #[tokio::test]
    async fn blocks_preserve_line_order_without_sharing() {
        let (_, blocks) = segment(&input_with_header(5), 2).await;

        let flattened: Vec<String> = blocks.into_iter().flatten().collect();
        let expected: Vec<String> = (0..5).map(|i| format!("line{}", i)).collect();
        assert_eq!(flattened, expected);
    }
}
