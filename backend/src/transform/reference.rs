//! In-process reference transform: `v * v + 0.5`.
//!
//! This is the fallback engine. It must agree bit-for-bit with a plain
//! multiply followed by an add, so it never uses `mul_add`.

use rayon::prelude::*;

/// Constant added after squaring.
pub const OFFSET: f64 = 0.5;

/// Series at least this long are mapped on the rayon pool.
pub const PARALLEL_THRESHOLD: usize = 16_384;

/// Transform a single value.
///
/// `NaN` propagates and both infinities map to `+inf`.
#[inline]
pub fn transform(v: f64) -> f64 {
    v * v + OFFSET
}

/// Transform every value of a series, preserving order.
pub fn transform_series(values: &[f64]) -> Vec<f64> {
    if values.len() >= PARALLEL_THRESHOLD {
        values.par_iter().map(|&v| transform(v)).collect()
    } else {
        values.iter().map(|&v| transform(v)).collect()
    }
}

/// Human-readable description of the operation.
pub fn operation_description() -> &'static str {
    "v\u{b2} + 0.5 (elementwise)"
}
