//! Flat text encoding of 1-D and 2-D numeric containers.
//!
//! - 1-D: `"<N> v0 v1 ... v(N-1)"`
//! - 2-D: `"<R> <C> v00 v01 ... v0(C-1) v10 ..."` (row-major)
//!
//! Tokens are separated by arbitrary whitespace, so a file may spread a
//! matrix over several lines.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing or serializing containers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("missing shape header: expected {rank} axis length(s)")]
    MissingHeader { rank: usize },

    #[error("invalid axis length '{token}'")]
    InvalidHeader { token: String },

    #[error("invalid value '{token}' at position {position}")]
    InvalidValue { position: usize, token: String },

    #[error("shape mismatch: header declares {declared} value(s), found {actual}")]
    ShapeMismatch { declared: usize, actual: usize },

    #[error("cannot handle {0}-dimensional containers")]
    UnsupportedRank(usize),

    #[error("ragged matrix: row {row} has {actual} column(s), expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// A parsed container of rank 1 or 2.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tensor<T> {
    Vector(Vec<T>),
    Matrix(Vec<Vec<T>>),
}

impl<T> Tensor<T> {
    /// Number of axes.
    pub fn rank(&self) -> usize {
        match self {
            Tensor::Vector(_) => 1,
            Tensor::Matrix(_) => 2,
        }
    }

    pub fn into_vector(self) -> Option<Vec<T>> {
        match self {
            Tensor::Vector(v) => Some(v),
            Tensor::Matrix(_) => None,
        }
    }

    pub fn into_matrix(self) -> Option<Vec<Vec<T>>> {
        match self {
            Tensor::Matrix(m) => Some(m),
            Tensor::Vector(_) => None,
        }
    }
}

/// A scalar that can be written into the text encoding.
///
/// Floats are written in their shortest round-trip form and always carry a
/// decimal point or exponent, so `1.0` stays `1.0` rather than `1`.
/// Exponents carry a sign and at least two digits (`1.5e-05`, `1e+16`)
/// and NaN is written as `nan`, matching existing model files.
pub trait TextValue {
    fn write_text(&self, out: &mut String);
}

macro_rules! float_text_value {
    ($($t:ty),*) => {$(
        impl TextValue for $t {
            fn write_text(&self, out: &mut String) {
                if self.is_nan() {
                    out.push_str("nan");
                } else {
                    write_float(out, &format!("{:?}", self));
                }
            }
        }
    )*};
}

/// Rewrite the exponent of a shortest-form float (`1e-7`) as `1e-07`.
fn write_float(out: &mut String, shortest: &str) {
    let Some((mantissa, exponent)) = shortest.split_once('e') else {
        out.push_str(shortest);
        return;
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent.trim_start_matches('+')),
    };
    let _ = write!(out, "{mantissa}e{sign}{digits:0>2}");
}

macro_rules! int_text_value {
    ($($t:ty),*) => {$(
        impl TextValue for $t {
            fn write_text(&self, out: &mut String) {
                let _ = write!(out, "{}", self);
            }
        }
    )*};
}

float_text_value!(f32, f64);
int_text_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

/// Split off `rank` axis lengths from the front of the token stream.
fn read_header<'a, I>(tokens: &mut I, rank: usize) -> Result<Vec<usize>, ContainerError>
where
    I: Iterator<Item = &'a str>,
{
    let mut lengths = Vec::with_capacity(rank);
    for _ in 0..rank {
        let token = tokens.next().ok_or(ContainerError::MissingHeader { rank })?;
        let length = token.parse::<usize>().map_err(|_| ContainerError::InvalidHeader {
            token: token.to_string(),
        })?;
        lengths.push(length);
    }
    Ok(lengths)
}

fn read_values<T: FromStr>(tokens: &[&str], declared: usize) -> Result<Vec<T>, ContainerError> {
    if tokens.len() != declared {
        return Err(ContainerError::ShapeMismatch {
            declared,
            actual: tokens.len(),
        });
    }
    tokens
        .iter()
        .enumerate()
        .map(|(position, token)| {
            token.parse::<T>().map_err(|_| ContainerError::InvalidValue {
                position,
                token: (*token).to_string(),
            })
        })
        .collect()
}

/// Parse a 1-D container.
pub fn parse_vector<T: FromStr>(text: &str) -> Result<Vec<T>, ContainerError> {
    let mut tokens = text.split_whitespace();
    let header = read_header(&mut tokens, 1)?;
    let rest: Vec<&str> = tokens.collect();
    read_values(&rest, header[0])
}

/// Parse a 2-D container into row-major nested vectors.
pub fn parse_matrix<T: FromStr>(text: &str) -> Result<Vec<Vec<T>>, ContainerError> {
    let mut tokens = text.split_whitespace();
    let header = read_header(&mut tokens, 2)?;
    let (rows, columns) = (header[0], header[1]);
    let declared = rows
        .checked_mul(columns)
        .ok_or_else(|| ContainerError::InvalidHeader {
            token: format!("{rows}x{columns}"),
        })?;
    let rest: Vec<&str> = tokens.collect();
    let mut values = read_values::<T>(&rest, declared)?.into_iter();

    // A zero-width header can claim any row count without backing values.
    let mut matrix = Vec::with_capacity(rows.min(declared.max(1)));
    for _ in 0..rows {
        matrix.push(values.by_ref().take(columns).collect());
    }
    Ok(matrix)
}

/// Parse a container of the given rank (1 or 2).
pub fn parse_tensor<T: FromStr>(text: &str, rank: usize) -> Result<Tensor<T>, ContainerError> {
    match rank {
        1 => parse_vector(text).map(Tensor::Vector),
        2 => parse_matrix(text).map(Tensor::Matrix),
        other => Err(ContainerError::UnsupportedRank(other)),
    }
}

/// Encode a 1-D container.
pub fn vector_to_text<T: TextValue>(values: &[T]) -> String {
    let mut out = values.len().to_string();
    for v in values {
        out.push(' ');
        v.write_text(&mut out);
    }
    out
}

/// Encode a 2-D container. Every row must have the width of the first.
pub fn matrix_to_text<T: TextValue>(rows: &[Vec<T>]) -> Result<String, ContainerError> {
    let columns = rows.first().map_or(0, Vec::len);
    let mut out = format!("{} {}", rows.len(), columns);
    for (r, row) in rows.iter().enumerate() {
        if row.len() != columns {
            return Err(ContainerError::RaggedMatrix {
                row: r,
                expected: columns,
                actual: row.len(),
            });
        }
        for v in row {
            out.push(' ');
            v.write_text(&mut out);
        }
    }
    Ok(out)
}

/// Encode a container of either rank.
pub fn tensor_to_text<T: TextValue>(tensor: &Tensor<T>) -> Result<String, ContainerError> {
    match tensor {
        Tensor::Vector(v) => Ok(vector_to_text(v)),
        Tensor::Matrix(m) => matrix_to_text(m),
    }
}
