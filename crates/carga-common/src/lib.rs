//! Carga Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging setup for the carga workspace.
//!
//! # Example
//!
//! ```no_run
//! use carga_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> carga_common::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     tracing::info!("loader starting");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{CargaError, Result};
