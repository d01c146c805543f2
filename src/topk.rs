use std::collections::BinaryHeap;

use ndarray::Array2;

use crate::error::{RecError, Result};
use crate::surface::ScoreSurface;
use crate::types::{ScoredItem, TopKMatrix, SENTINEL};

/// Bounded heap holding the `k` best candidates seen so far.
pub(crate) struct TopK {
    heap: BinaryHeap<ScoredItem>,
    k: usize,
}

impl TopK {

    pub(crate) fn new(k: usize) -> Self {
        Self { heap: BinaryHeap::with_capacity(k), k }
    }

    /// Returns true if the candidate made it into the current top-k.
    pub(crate) fn offer(&mut self, candidate: ScoredItem) -> bool {
        if self.heap.len() < self.k {
            self.heap.push(candidate);
            return true
        }
        match self.heap.peek_mut() {
            Some(mut top) if candidate < *top => {
                *top = candidate;
                true
            }
            _ => false,
        }
    }

    /// Best candidate first.
    pub(crate) fn into_sorted_vec(self) -> Vec<ScoredItem> {
        self.heap.into_sorted_vec()
    }
}

/// Reduces a score surface to the `k` highest scoring item ids per user.
///
/// Rows are enumerated for every user, including users without any sparse
/// entry. Rows with fewer than `k` candidates are right-padded with
/// [`SENTINEL`]. Equal scores are ordered by the lower item id.
pub fn extract_topk(surface: &ScoreSurface, k: usize) -> Result<TopKMatrix> {
    if k == 0 {
        return Err(RecError::InvalidConfig("topk must be positive".to_string()));
    }

    let (num_users, _) = surface.shape();
    let mut recommendations = Array2::from_elem((num_users, k), SENTINEL);

    match surface {
        ScoreSurface::Dense(scores) => {
            for (user, row) in scores.outer_iter().enumerate() {
                let topk = select_topk(row.iter().copied().enumerate(), k);
                write_row(&mut recommendations, user, topk);
            }
        }
        ScoreSurface::Sparse(scores) => {
            for (user, row) in scores.outer_iterator().enumerate() {
                // rows with less than k stored values keep their sentinel padding
                let topk = select_topk(row.iter().map(|(item, &score)| (item, score)), k);
                write_row(&mut recommendations, user, topk);
            }
        }
    }

    Ok(recommendations)
}

fn select_topk<I>(candidates: I, k: usize) -> Vec<ScoredItem>
where
    I: Iterator<Item = (usize, f64)>,
{
    let mut topk = TopK::new(k);
    for (item, score) in candidates {
        topk.offer(ScoredItem::new(item, score));
    }
    topk.into_sorted_vec()
}

fn write_row(recommendations: &mut TopKMatrix, user: usize, topk: Vec<ScoredItem>) {
    for (position, entry) in topk.into_iter().enumerate() {
        recommendations[(user, position)] = entry.item as i64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use sprs::TriMat;

    #[test]
    fn test_offer_replaces_worst_entry() {
        let mut topk = TopK::new(2);
        assert!(topk.offer(ScoredItem::new(1, 1.0)));
        assert!(topk.offer(ScoredItem::new(2, 0.8)));
        assert!(!topk.offer(ScoredItem::new(3, 0.5)));
        assert!(topk.offer(ScoredItem::new(4, 1.5)));
        assert_eq!(topk.heap.len(), 2);

        let n = topk.into_sorted_vec();
        check_entry(&n[0], 4, 1.5);
        check_entry(&n[1], 1, 1.0);
    }

    #[test]
    fn test_offer_tie_keeps_lower_item() {
        let mut topk = TopK::new(1);
        topk.offer(ScoredItem::new(5, 1.0));
        assert!(topk.offer(ScoredItem::new(2, 1.0)));
        assert!(!topk.offer(ScoredItem::new(9, 1.0)));

        let n = topk.into_sorted_vec();
        check_entry(&n[0], 2, 1.0);
    }

    #[test]
    fn test_dense_extraction() {
        let surface = ScoreSurface::dense(array![
            [4.0, 1.0, 3.0, 2.0],
            [1.0, 4.0, 3.0, 2.0],
            [2.0, 3.0, 4.0, 1.0],
        ]);

        let recommendations = extract_topk(&surface, 2).unwrap();

        let expected: TopKMatrix = array![[0, 2], [1, 2], [2, 1]];
        assert_eq!(recommendations, expected);
    }

    #[test]
    fn test_dense_extraction_breaks_ties_by_item() {
        let surface = ScoreSurface::dense(array![[1.0, 2.0, 2.0, 2.0]]);

        let recommendations = extract_topk(&surface, 3).unwrap();

        let expected: TopKMatrix = array![[1, 2, 3]];
        assert_eq!(recommendations, expected);
    }

    #[test]
    fn test_signed_zeros_are_ties() {
        let surface = ScoreSurface::dense(array![[-0.0, 0.0, 0.0], [0.0, -0.0, 1.0]]);

        let recommendations = extract_topk(&surface, 3).unwrap();

        let expected: TopKMatrix = array![[0, 1, 2], [2, 0, 1]];
        assert_eq!(recommendations, expected);
    }

    #[test]
    fn test_dense_extraction_pads_when_k_exceeds_items() {
        let surface = ScoreSurface::dense(array![[0.5, 1.5]]);

        let recommendations = extract_topk(&surface, 4).unwrap();

        assert_eq!(recommendations, array![[1, 0, SENTINEL, SENTINEL]]);
    }

    #[test]
    fn test_sparse_extraction_pads_short_and_missing_rows() {
        let mut input = TriMat::new((4, 5));
        input.add_triplet(0, 1, 0.3);
        input.add_triplet(0, 4, 0.9);
        input.add_triplet(0, 2, 0.6);
        input.add_triplet(0, 0, 0.1);
        input.add_triplet(2, 3, 2.0);
        let surface = ScoreSurface::sparse(input.to_csr());

        let recommendations = extract_topk(&surface, 3).unwrap();

        assert_eq!(recommendations, array![
            [4, 2, 1],
            [SENTINEL, SENTINEL, SENTINEL],
            [3, SENTINEL, SENTINEL],
            [SENTINEL, SENTINEL, SENTINEL],
        ]);
    }

    #[test]
    fn test_empty_surface() {
        let surface = ScoreSurface::dense(Array2::zeros((0, 3)));
        let recommendations = extract_topk(&surface, 2).unwrap();
        assert_eq!(recommendations.dim(), (0, 2));
    }

    #[test]
    fn test_zero_k_is_rejected() {
        let surface = ScoreSurface::dense(array![[1.0]]);
        assert!(matches!(extract_topk(&surface, 0), Err(RecError::InvalidConfig(_))));
    }

    fn check_entry(entry: &ScoredItem, expected_item: usize, expected_score: f64) {
        assert_eq!(entry.item, expected_item);
        assert!((entry.score - expected_score).abs() < 0.0001);
    }
}
