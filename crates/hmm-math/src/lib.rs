//! Numeric container utilities for the hmm workspace.
//!
//! Flat text encoding of vectors and matrices, scalar operations on
//! probability rows, and closeness comparison for nested containers.

pub mod container;

pub use container::close::{values_close, values_close_with, Close, DEFAULT_TOLERANCE};
pub use container::ops::{argmax, scale_in_place, vector_scalar_mult};
pub use container::text::{
    matrix_to_text, parse_matrix, parse_tensor, parse_vector, tensor_to_text, vector_to_text,
    ContainerError, Tensor, TextValue,
};
