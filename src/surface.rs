use ndarray::Array2;
use sprs::CsMat;

/// A users × items score structure, either dense or compressed sparse row.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreSurface {
    Dense(Array2<f64>),
    Sparse(CsMat<f64>),
}

impl ScoreSurface {

    /// Wraps a sparse matrix, converting it to row-major storage if needed.
    pub fn sparse(scores: CsMat<f64>) -> Self {
        if scores.is_csr() {
            ScoreSurface::Sparse(scores)
        } else {
            ScoreSurface::Sparse(scores.to_csr())
        }
    }

    pub fn dense(scores: Array2<f64>) -> Self {
        ScoreSurface::Dense(scores)
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            ScoreSurface::Dense(scores) => scores.dim(),
            ScoreSurface::Sparse(scores) => scores.shape(),
        }
    }

    pub fn is_sparse(&self) -> bool {
        matches!(self, ScoreSurface::Sparse(_))
    }

    /// Number of candidate entries in a row. Every column counts for dense rows.
    pub fn row_nnz(&self, row: usize) -> usize {
        match self {
            ScoreSurface::Dense(scores) => {
                if row < scores.nrows() { scores.ncols() } else { 0 }
            }
            ScoreSurface::Sparse(scores) => {
                scores.outer_view(row).map_or(0, |view| view.nnz())
            }
        }
    }

    /// Raw score lookup. Implicit sparse entries and out-of-range positions yield `None`.
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        match self {
            ScoreSurface::Dense(scores) => scores.get((row, column)).copied(),
            ScoreSurface::Sparse(scores) => scores.get(row, column).copied(),
        }
    }

    /// Candidate `(item, score)` pairs of a row, ascending by item id.
    pub fn row_entries(&self, row: usize) -> Vec<(usize, f64)> {
        match self {
            ScoreSurface::Dense(scores) => {
                if row >= scores.nrows() {
                    return Vec::new();
                }
                scores.row(row).iter().copied().enumerate().collect()
            }
            ScoreSurface::Sparse(scores) => {
                scores.outer_view(row)
                    .map(|view| view.iter().map(|(item, &score)| (item, score)).collect())
                    .unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use sprs::TriMat;

    #[test]
    fn test_dense_capabilities() {
        let surface = ScoreSurface::dense(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        assert_eq!(surface.shape(), (2, 3));
        assert!(!surface.is_sparse());
        assert_eq!(surface.row_nnz(1), 3);
        assert_eq!(surface.get(1, 2), Some(6.0));
        assert_eq!(surface.get(2, 0), None);
        assert_eq!(surface.row_entries(0), vec![(0, 1.0), (1, 2.0), (2, 3.0)]);
    }

    #[test]
    fn test_sparse_capabilities() {
        let mut input = TriMat::new((3, 4));
        input.add_triplet(0, 3, 1.5);
        input.add_triplet(0, 1, 0.5);
        input.add_triplet(2, 2, 2.0);

        let surface = ScoreSurface::sparse(input.to_csc());

        assert_eq!(surface.shape(), (3, 4));
        assert!(surface.is_sparse());
        assert_eq!(surface.row_nnz(0), 2);
        assert_eq!(surface.row_nnz(1), 0);
        assert_eq!(surface.get(0, 3), Some(1.5));
        assert_eq!(surface.get(0, 0), None);
        assert_eq!(surface.row_entries(0), vec![(1, 0.5), (3, 1.5)]);
        assert!(surface.row_entries(1).is_empty());
    }
}
