use std::cmp::Ordering;

use ndarray::Array2;

/// Padding value for rows with fewer candidates than requested. Item ids are
/// never negative, so it can't collide with a real holdout entry.
pub const SENTINEL: i64 = -1;

/// Item ids per user in descending score order, right-padded with [`SENTINEL`].
pub type TopKMatrix = Array2<i64>;

/// A candidate item together with its score.
///
/// The ordering is reversed: a "better" item compares as smaller,
/// so a `BinaryHeap<ScoredItem>` keeps the worst retained candidate at its
/// root, and `into_sorted_vec` yields the best candidate first. Equal scores
/// are broken by the lower item id.
#[derive(Debug, Clone, Copy)]
pub struct ScoredItem {
    pub item: usize,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(item: usize, score: f64) -> Self {
        Self { item, score }
    }
}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // adding zero turns -0.0 into 0.0, which total_cmp would order apart
        (other.score + 0.0).total_cmp(&(self.score + 0.0))
            .then_with(|| self.item.cmp(&other.item))
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoredItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredItem {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn test_higher_score_sorts_first() {
        let mut items = vec![
            ScoredItem::new(0, 0.5),
            ScoredItem::new(1, 2.0),
            ScoredItem::new(2, 1.0),
        ];
        items.sort();

        let order: Vec<usize> = items.iter().map(|entry| entry.item).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_ties_prefer_lower_item() {
        let mut items = vec![ScoredItem::new(7, 1.0), ScoredItem::new(3, 1.0)];
        items.sort();
        assert_eq!(items[0].item, 3);
        assert_eq!(items[1].item, 7);
    }

    #[test]
    fn test_heap_root_is_worst_candidate() {
        let mut heap = BinaryHeap::new();
        heap.push(ScoredItem::new(1, 1.0));
        heap.push(ScoredItem::new(2, 0.1));
        heap.push(ScoredItem::new(3, 0.7));

        let top = heap.peek().unwrap();
        assert_eq!(top.item, 2);
    }
}
