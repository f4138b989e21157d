//! Container modules.

pub mod close;
pub mod ops;
pub mod text;
