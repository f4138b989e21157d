//! HMM core library.
//!
//! - Discrete hidden Markov model inference and Baum-Welch training
//! - Model and sequence files on disk
//! - Training configuration loading and validation
//! - Structured logging and exit codes for the `hmm` CLI
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod store;

pub use inference::{Hmm, HmmError};
