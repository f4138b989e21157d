//! Common types shared across the hmm workspace.
//!
//! - Unified error type with stable codes for the CLI
//! - Output formats

pub mod error;
pub mod output;

pub use error::{Error, ErrorCategory, Result};
pub use output::OutputFormat;

/// Schema version stamped on machine-readable command output.
pub const SCHEMA_VERSION: &str = "1.0.0";
