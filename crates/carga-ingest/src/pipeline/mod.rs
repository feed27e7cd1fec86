//! Block-loading pipeline
//!
//! Segmenter (single producer) -> bounded queue -> worker pool (N consumers,
//! each consumer = validator then writer) -> PostgreSQL. The queue is the
//! only shared mutable state between producer and consumers; its capacity is
//! the backpressure knob.

pub mod orchestrator;
pub mod sanitize;
pub mod segmenter;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use orchestrator::run;
pub use sanitize::{parse_line, strip_punctuation, validate_cnpj_shape, validate_cpf};
pub use segmenter::run_segmenter;
pub use types::{
    Block, Buyer, LineRejection, PipelineConfig, RunSummary, SkipCounts, SkipReason,
    NULL_SENTINEL,
};
pub use writer::{BatchWriter, BlockSink};
