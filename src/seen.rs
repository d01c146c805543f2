use crate::error::{RecError, Result};
use crate::surface::ScoreSurface;

/// Parallel sequences of `(user, item)` interactions that must not be recommended again.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeenIndex {
    users: Vec<usize>,
    items: Vec<usize>,
}

impl SeenIndex {

    pub fn new(users: Vec<usize>, items: Vec<usize>) -> Result<Self> {
        if users.len() != items.len() {
            return Err(RecError::ShapeMismatch(format!(
                "seen index has {} users but {} items", users.len(), items.len())));
        }
        Ok(Self { users, items })
    }

    pub fn from_pairs<I: IntoIterator<Item = (usize, usize)>>(pairs: I) -> Self {
        let (users, items) = pairs.into_iter().unzip();
        Self { users, items }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.users.iter().copied().zip(self.items.iter().copied())
    }
}

/// Moves the scores of seen interactions below every other score of the surface.
///
/// Each seen score `s` becomes `min - (max_seen - s) - 1`, where `min` is the
/// smallest score of the surface and `max_seen` the largest seen score. This
/// keeps the relative order among the suppressed entries.
///
/// For sparse surfaces only seen entries that are explicitly stored are
/// rewritten. A seen item with an implicit zero score stays where it is, so
/// sparse suppression is approximate.
pub fn suppress_seen_items(surface: &mut ScoreSurface, seen: &SeenIndex) -> Result<()> {
    let (num_users, num_items) = surface.shape();

    if let Some((user, item)) = seen.iter().find(|&(user, item)| user >= num_users || item >= num_items) {
        return Err(RecError::ShapeMismatch(format!(
            "seen interaction ({}, {}) is outside of a {}x{} score surface",
            user, item, num_users, num_items)));
    }

    match surface {
        ScoreSurface::Dense(scores) => {
            if seen.is_empty() || scores.is_empty() {
                return Ok(());
            }
            let positions: Vec<(usize, usize)> = seen.iter().collect();
            let seen_scores: Vec<f64> = positions.iter().map(|&position| scores[position]).collect();

            let lowest = scores.iter().copied().fold(f64::INFINITY, f64::min);
            let highest_seen = seen_scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);

            for (position, score) in positions.into_iter().zip(seen_scores) {
                scores[position] = lowest - (highest_seen - score) - 1.0;
            }
        }
        ScoreSurface::Sparse(scores) => {
            let mut positions: Vec<usize> = seen.iter()
                .filter_map(|(user, item)| scores.nnz_index(user, item))
                .map(|index| index.0)
                .collect();

            // sparse scores may not contain any of the seen interactions
            if positions.is_empty() {
                return Ok(());
            }
            positions.sort_unstable();
            positions.dedup();

            let data = scores.data_mut();
            let lowest = data.iter().copied().fold(f64::INFINITY, f64::min);
            let highest_seen = positions.iter()
                .map(|&position| data[position])
                .fold(f64::NEG_INFINITY, f64::max);

            for position in positions {
                data[position] = lowest - (highest_seen - data[position]) - 1.0;
            }
        }
    }

    Ok(())
}
