//! Scalar operations on probability rows.

/// Multiply every entry of `vector` by `scalar`, returning a new vector.
pub fn vector_scalar_mult(vector: &[f64], scalar: f64) -> Vec<f64> {
    vector.iter().map(|v| v * scalar).collect()
}

/// Multiply every entry of `vector` by `scalar` in place.
pub fn scale_in_place(vector: &mut [f64], scalar: f64) {
    for v in vector.iter_mut() {
        *v *= scalar;
    }
}

/// Index of the largest value.
///
/// Ties resolve to the first index holding the maximum. NaN entries never
/// win. Returns `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            None => best = Some((i, v)),
            Some((_, b)) if v > b || (b.is_nan() && !v.is_nan()) => best = Some((i, v)),
            _ => {}
        }
    }
    best.map(|(i, _)| i)
}
