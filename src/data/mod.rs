//! Input matrix representation, loading and edge filtering

pub mod filter;
pub mod npz;

pub use filter::{FilteredEdges, WeightDistribution};

/// Sparse similarity matrix held as parallel coordinate arrays.
///
/// Entries keep the order they had in the file (row-major for CSR,
/// column-major for CSC, as stored for COO). Explicit zeros are never kept.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    /// Number of rows and columns
    pub shape: (usize, usize),

    /// Row index of each entry
    pub rows: Vec<u32>,

    /// Column index of each entry
    pub cols: Vec<u32>,

    /// Weight of each entry
    pub values: Vec<f64>,
}

impl SparseMatrix {
    /// Build a matrix from `(row, col, weight)` triplets, dropping zeros.
    ///
    /// Panics if a triplet lies outside `shape`.
    pub fn from_triplets<I>(shape: (usize, usize), triplets: I) -> Self
    where
        I: IntoIterator<Item = (u32, u32, f64)>,
    {
        let mut matrix = Self::with_capacity(shape, 0);
        for (row, col, value) in triplets {
            assert!(
                (row as usize) < shape.0 && (col as usize) < shape.1,
                "entry ({}, {}) outside a {}x{} matrix",
                row,
                col,
                shape.0,
                shape.1
            );
            matrix.push(row, col, value);
        }
        matrix
    }

    pub(crate) fn with_capacity(shape: (usize, usize), capacity: usize) -> Self {
        Self {
            shape,
            rows: Vec::with_capacity(capacity),
            cols: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry; explicit zeros are skipped
    pub(crate) fn push(&mut self, row: u32, col: u32, value: f64) {
        if value == 0.0 {
            return;
        }
        self.rows.push(row);
        self.cols.push(col);
        self.values.push(value);
    }

    /// Number of stored non-zero entries
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over `(row, col, weight)` in storage order
    pub fn entries(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&row, &col), &value)| (row, col, value))
    }

    /// Largest stored weight, if any
    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_triplets_drops_zeros() {
        let matrix = SparseMatrix::from_triplets((3, 3), vec![(0, 1, 2.0), (1, 2, 0.0), (2, 0, 5.0)]);
        assert_eq!(matrix.nnz(), 2);
        assert_eq!(matrix.rows, vec![0, 2]);
        assert_eq!(matrix.cols, vec![1, 0]);
        assert_eq!(matrix.max_value(), Some(5.0));
    }

    #[test]
    fn empty_matrix_has_no_max() {
        let matrix = SparseMatrix::from_triplets((2, 2), Vec::new());
        assert_eq!(matrix.max_value(), None);
        assert_eq!(matrix.entries().count(), 0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn from_triplets_rejects_out_of_bounds() {
        SparseMatrix::from_triplets((2, 2), vec![(2, 0, 1.0)]);
    }
}
