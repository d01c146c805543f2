use sprs::CsMat;

use crate::row_accumulator::RowAccumulator;

/// Computes the item-to-item cooccurrence matrix `AᵀA` of a users × items
/// interaction matrix, without the diagonal (self-links).
pub(crate) fn build_cooccurrence_index(user_items: &CsMat<f64>) -> CsMat<f64> {

    let (_, num_items) = user_items.shape();
    let user_items = user_items.to_csr();
    let item_users: CsMat<f64> = user_items.to_csc();

    let data = user_items.data();
    let indices = user_items.indices();
    let indptr = user_items.indptr();
    let data_t = item_users.data();
    let indices_t = item_users.indices();
    let indptr_t = item_users.indptr();

    let mut accumulator = RowAccumulator::new(num_items);

    let mut cooccurrence_indptr: Vec<usize> = Vec::with_capacity(num_items + 1);
    let mut cooccurrence_indices: Vec<usize> = Vec::new();
    let mut cooccurrence_data: Vec<f64> = Vec::new();
    cooccurrence_indptr.push(0);

    for item in 0..num_items {
        for user_index in indptr_t.outer_inds_sz(item) {
            let value = data_t[user_index];
            let user = indices_t[user_index];
            for item_index in indptr.outer_inds_sz(user) {
                accumulator.add_to(indices[item_index], data[item_index] * value);
            }
        }

        for (other_item, count) in accumulator.drain_sorted(item) {
            cooccurrence_indices.push(other_item);
            cooccurrence_data.push(count);
        }
        cooccurrence_indptr.push(cooccurrence_indices.len());
    }

    CsMat::new((num_items, num_items), cooccurrence_indptr, cooccurrence_indices, cooccurrence_data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprs::TriMat;

    #[test]
    fn test_mini_example() {

        /*
        A = [[1, 1, 1, 0, 1],
             [0, 1, 0, 1, 0],
             [0, 1, 1, 0, 1],
             [0, 0, 0, 1, 0]]

        A.T @ A with zeroed diagonal:
        [[0, 1, 1, 0, 1],
         [1, 0, 2, 1, 2],
         [1, 2, 0, 0, 2],
         [0, 1, 0, 0, 0],
         [1, 2, 2, 0, 0]]
        */

        let num_users = 4;
        let num_items = 5;

        let triplets = vec![
            (0, 0, 1.0), (0, 1, 1.0), (0, 2, 1.0), (0, 4, 1.0),
            (1, 1, 1.0), (1, 3, 1.0),
            (2, 1, 1.0), (2, 2, 1.0), (2, 4, 1.0),
            (3, 3, 1.0),
        ];

        let mut input = TriMat::new((num_users, num_items));
        for (row, col, val) in triplets {
            input.add_triplet(row, col, val);
        }

        let cooccurrences = build_cooccurrence_index(&input.to_csr());

        assert_eq!(cooccurrences.shape(), (5, 5));
        for item in 0..num_items {
            assert_eq!(cooccurrences.get(item, item), None);
        }
        assert_eq!(cooccurrences.get(0, 1), Some(&1.0));
        assert_eq!(cooccurrences.get(1, 2), Some(&2.0));
        assert_eq!(cooccurrences.get(1, 3), Some(&1.0));
        assert_eq!(cooccurrences.get(4, 2), Some(&2.0));
        assert_eq!(cooccurrences.get(3, 0), None);
        assert_eq!(cooccurrences.nnz(), 14);
    }
}
