//! Domain models shared by the pipeline and the API.
//!
//! - [`FlatSeries`] - Values of all rows, in document order
//! - [`SeriesPair`] - Original series and its transformed counterpart

use serde::Serialize;

use crate::transform::reference::transform_series;

/// Ordered values concatenated across all rows.
pub type FlatSeries = Vec<f64>;

/// Number of output values shown as a preview.
pub const PREVIEW_LEN: usize = 5;

/// Original and transformed series of one run.
///
/// Only constructible from the input series, so both sides always have the
/// same length and `output[i] == transform(input[i])`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPair {
    input: FlatSeries,
    output: FlatSeries,
}

impl SeriesPair {
    /// Apply the reference transform to `input`.
    pub fn from_input(input: FlatSeries) -> Self {
        let output = transform_series(&input);
        Self { input, output }
    }

    pub fn input(&self) -> &[f64] {
        &self.input
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// First `n` output values (fewer if the series is shorter).
    pub fn preview(&self, n: usize) -> &[f64] {
        &self.output[..n.min(self.output.len())]
    }

    /// `(index, original, processed)` triples, the shape a line chart plots.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64, f64)> + '_ {
        self.input
            .iter()
            .zip(&self.output)
            .enumerate()
            .map(|(i, (&x, &y))| (i, x, y))
    }

    /// Split into `(input, output)`.
    pub fn into_parts(self) -> (FlatSeries, FlatSeries) {
        (self.input, self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_invariant() {
        let pair = SeriesPair::from_input(vec![2.0, -1.0, 0.0]);
        assert_eq!(pair.len(), 3);
        assert_eq!(pair.output(), &[4.5, 1.5, 0.5]);
    }

    #[test]
    fn test_preview_bounds() {
        let pair = SeriesPair::from_input((1..=8).map(f64::from).collect());
        assert_eq!(pair.preview(PREVIEW_LEN).len(), 5);
        assert_eq!(pair.preview(PREVIEW_LEN)[0], 1.5);

        let short = SeriesPair::from_input(vec![1.0, 2.0]);
        assert_eq!(short.preview(PREVIEW_LEN), &[1.5, 4.5]);

        let empty = SeriesPair::from_input(vec![]);
        assert!(empty.is_empty());
        assert!(empty.preview(PREVIEW_LEN).is_empty());
    }

    #[test]
    fn test_points() {
        let pair = SeriesPair::from_input(vec![1.0, 3.0]);
        let points: Vec<_> = pair.points().collect();
        assert_eq!(points, vec![(0, 1.0, 1.5), (1, 3.0, 9.5)]);
    }
}
