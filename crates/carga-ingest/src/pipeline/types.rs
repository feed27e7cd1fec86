//! Core types for the block-loading pipeline

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;

/// Literal token marking an absent value in the input file (case-sensitive)
pub const NULL_SENTINEL: &str = "NULL";

/// A bounded, ordered group of raw input lines processed as one
/// transactional unit. Produced by the segmenter, consumed exactly once
/// by one worker.
pub type Block = Vec<String>;

/// A validated buyer record, one per accepted input line.
///
/// Nullable attributes are `Option`s; `None` means the input carried the
/// `NULL` sentinel (or a value that failed numeric/date parsing), which is
/// distinct from a zero value.
#[derive(Debug, Clone, PartialEq)]
pub struct Buyer {
    /// Primary identifier (CPF), punctuation stripped. Always passes the
    /// check-digit validation or is the `NULL` sentinel.
    pub cpf: String,
    pub private: bool,
    pub incomplete: bool,
    pub last_purchase: Option<NaiveDate>,
    pub avg_ticket: Option<BigDecimal>,
    pub last_ticket: Option<BigDecimal>,
    /// Most-frequent store identifier (CNPJ shape), punctuation stripped
    pub most_frequent_store: String,
    /// Last-purchase store identifier (CNPJ shape), punctuation stripped
    pub last_purchase_store: String,
}

/// Why a line was dropped during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than 8 fields after tokenizing
    MalformedLine,
    /// Primary identifier failed the check-digit validation
    InvalidCpf,
    /// Store identifier failed the 14-digit shape check
    InvalidStoreId,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MalformedLine => "malformed line",
            SkipReason::InvalidCpf => "invalid identifier",
            SkipReason::InvalidStoreId => "invalid store identifier",
        }
    }
}

/// A rejected line: the tagged reason plus the offending raw value, so
/// callers and tests can assert on why a row was dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}: {value}", .reason.as_str())]
pub struct LineRejection {
    pub reason: SkipReason,
    pub value: String,
}

impl LineRejection {
    pub fn new(reason: SkipReason, value: impl Into<String>) -> Self {
        Self {
            reason,
            value: value.into(),
        }
    }
}

/// Per-reason counters for dropped lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub malformed_lines: u64,
    pub invalid_cpf: u64,
    pub invalid_store_id: u64,
}

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::MalformedLine => self.malformed_lines += 1,
            SkipReason::InvalidCpf => self.invalid_cpf += 1,
            SkipReason::InvalidStoreId => self.invalid_store_id += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.malformed_lines + self.invalid_cpf + self.invalid_store_id
    }

    pub fn merge(&mut self, other: &SkipCounts) {
        self.malformed_lines += other.malformed_lines;
        self.invalid_cpf += other.invalid_cpf;
        self.invalid_store_id += other.invalid_store_id;
    }
}

/// Knobs for the producer/worker-pool pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of concurrent consumer workers
    pub workers: usize,
    /// Maximum lines per block (one block = one transaction)
    pub max_block_size: usize,
    /// Bounded queue capacity between segmenter and workers; the
    /// backpressure knob that keeps memory bounded for arbitrarily
    /// large input files
    pub queue_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_block_size: 1500,
            queue_capacity: 10,
        }
    }
}

/// Aggregated outcome of one loading run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Data lines read from the input (header excluded)
    pub lines_read: u64,
    pub blocks_committed: u64,
    pub blocks_failed: u64,
    pub rows_inserted: u64,
    pub lines_skipped: SkipCounts,
    pub elapsed: Duration,
}
