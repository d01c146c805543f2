//! In-process stand-in for the data access layer: interactions, holdout and
//! the feedback index the tensor models are trained against.

use std::collections::HashSet;

use ndarray::Array2;
use sprs::{CsMat, TriMat};

use crate::error::{RecError, Result};
use crate::seen::SeenIndex;

/// `(user, item, feedback)` interactions as parallel sequences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interactions {
    users: Vec<usize>,
    items: Vec<usize>,
    feedback: Vec<f64>,
}

impl Interactions {

    pub fn new(users: Vec<usize>, items: Vec<usize>, feedback: Vec<f64>) -> Result<Self> {
        if users.len() != items.len() || users.len() != feedback.len() {
            return Err(RecError::ShapeMismatch(format!(
                "interactions have {} users, {} items and {} feedback values",
                users.len(), items.len(), feedback.len())));
        }
        Ok(Self { users, items, feedback })
    }

    pub fn from_triples(triples: &[(usize, usize, f64)]) -> Self {
        Self {
            users: triples.iter().map(|triple| triple.0).collect(),
            items: triples.iter().map(|triple| triple.1).collect(),
            feedback: triples.iter().map(|triple| triple.2).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn users(&self) -> &[usize] {
        &self.users
    }

    pub fn items(&self) -> &[usize] {
        &self.items
    }

    pub fn feedback(&self) -> &[f64] {
        &self.feedback
    }

    /// Largest user id + 1.
    pub fn num_users(&self) -> usize {
        self.users.iter().max().map_or(0, |&user| user + 1)
    }

    /// Largest item id + 1.
    pub fn num_items(&self) -> usize {
        self.items.iter().max().map_or(0, |&item| item + 1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.users.iter().zip(&self.items).zip(&self.feedback)
            .map(|((&user, &item), &feedback)| (user, item, feedback))
    }
}

/// Maps raw feedback values to contiguous ids, ascending by value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackIndex {
    levels: Vec<f64>,
}

impl FeedbackIndex {

    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut levels: Vec<f64> = values.into_iter().filter(|value| !value.is_nan()).collect();
        levels.sort_by(f64::total_cmp);
        levels.dedup_by(|a, b| a.total_cmp(b).is_eq());
        Self { levels }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn get(&self, value: f64) -> Option<usize> {
        self.levels.binary_search_by(|level| level.total_cmp(&value)).ok()
    }
}

/// Coordinate form of a `users × items × feedback` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTensor {
    pub indices: Vec<[usize; 3]>,
    pub values: Vec<f64>,
    pub shape: [usize; 3],
}

/// Training interactions, test user histories and their holdout items.
///
/// Test users are numbered from zero; row `u` of `holdout` holds the held-out
/// items of test user `u`.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderData {
    training: Interactions,
    testset: Interactions,
    holdout: Array2<i64>,
    holdout_feedback: Array2<f64>,
    num_items: usize,
    feedback_index: FeedbackIndex,
}

impl RecommenderData {

    pub fn new(
        training: Interactions,
        testset: Interactions,
        holdout: Array2<i64>,
        holdout_feedback: Array2<f64>,
    ) -> Result<Self> {
        if holdout.dim() != holdout_feedback.dim() {
            return Err(RecError::ShapeMismatch(format!(
                "holdout items are {:?} but holdout feedback is {:?}",
                holdout.dim(), holdout_feedback.dim())));
        }
        let num_items = training.num_items();
        let feedback_index = FeedbackIndex::from_values(training.feedback().iter().copied());

        Ok(Self { training, testset, holdout, holdout_feedback, num_items, feedback_index })
    }

    pub fn training(&self) -> &Interactions {
        &self.training
    }

    pub fn testset(&self) -> &Interactions {
        &self.testset
    }

    pub fn holdout(&self) -> &Array2<i64> {
        &self.holdout
    }

    pub fn holdout_feedback(&self) -> &Array2<f64> {
        &self.holdout_feedback
    }

    pub fn holdout_size(&self) -> usize {
        self.holdout.ncols()
    }

    pub fn num_items(&self) -> usize {
        self.num_items
    }

    pub fn num_test_users(&self) -> usize {
        self.testset.num_users()
    }

    pub fn feedback_index(&self) -> &FeedbackIndex {
        &self.feedback_index
    }

    /// Test interactions that must not be recommended again.
    pub fn seen_index(&self) -> SeenIndex {
        SeenIndex::from_pairs(self.testset.users().iter().copied().zip(self.testset.items().iter().copied()))
    }

    /// Checks the consistency of ids and shapes across training, test and holdout data.
    pub fn verify_integrity(&self) -> Result<()> {
        let training_items = distinct(self.training.items());
        if training_items != self.num_items {
            return Err(RecError::ShapeMismatch(format!(
                "training items are not contiguous: {} distinct ids up to {}",
                training_items, self.num_items)));
        }
        let test_users = distinct(self.testset.users());
        if test_users != self.num_test_users() {
            return Err(RecError::ShapeMismatch(format!(
                "test users are not contiguous: {} distinct ids up to {}",
                test_users, self.num_test_users())));
        }
        self.verify_test_items()?;
        if let Some(&item) = self.holdout.iter().find(|&&item| item < 0) {
            return Err(RecError::ShapeMismatch(format!("holdout contains negative item id {}", item)));
        }
        Ok(())
    }

    /// Users × items training matrix. Implicit matrices hold ones instead of feedback.
    pub fn training_matrix(&self, implicit: bool) -> CsMat<f64> {
        interaction_matrix(&self.training, self.training.num_users(), self.num_items, implicit)
    }

    /// Test users × items matrix of the test histories.
    pub fn test_matrix(&self, implicit: bool) -> Result<CsMat<f64>> {
        self.verify_test_items()?;
        Ok(interaction_matrix(&self.testset, self.num_test_users(), self.num_items, implicit))
    }

    /// Training interactions as `(user, item, feedback id)` indicator triples.
    pub fn training_tensor(&self) -> Result<SparseTensor> {
        let mut indices = Vec::with_capacity(self.training.len());
        for (user, item, feedback) in self.training.iter() {
            let level = self.feedback_index.get(feedback)
                .ok_or(RecError::DataAlignment { missing: 1 })?;
            indices.push([user, item, level]);
        }

        Ok(SparseTensor {
            values: vec![1.0; indices.len()],
            indices,
            shape: [self.training.num_users(), self.num_items, self.feedback_index.len()],
        })
    }

    /// Test histories as a `(user * num_items + item) × feedback id` indicator.
    ///
    /// Fails with [`RecError::DataAlignment`] if any test feedback value never
    /// occurs in the training data.
    pub fn test_triples(&self) -> Result<CsMat<f64>> {
        self.verify_test_items()?;

        let num_users = self.num_test_users();
        let num_items = self.num_items;
        let levels: Vec<Option<usize>> = self.testset.feedback().iter()
            .map(|&feedback| self.feedback_index.get(feedback))
            .collect();

        let missing = levels.iter().filter(|level| level.is_none()).count();
        if missing > 0 {
            return Err(RecError::DataAlignment { missing });
        }

        let mut triples = TriMat::new((num_users * num_items, self.feedback_index.len()));
        for ((&user, &item), level) in self.testset.users().iter().zip(self.testset.items()).zip(levels) {
            if let Some(level) = level {
                triples.add_triplet(user * num_items + item, level, 1.0);
            }
        }

        Ok(triples.to_csr())
    }

    fn verify_test_items(&self) -> Result<()> {
        match self.testset.items().iter().find(|&&item| item >= self.num_items) {
            Some(item) => Err(RecError::ShapeMismatch(format!(
                "test item {} is outside of the {} training items", item, self.num_items))),
            None => Ok(()),
        }
    }
}

fn distinct(ids: &[usize]) -> usize {
    ids.iter().collect::<HashSet<_>>().len()
}

fn interaction_matrix(interactions: &Interactions, num_users: usize, num_items: usize, implicit: bool) -> CsMat<f64> {
    let mut input = TriMat::with_capacity((num_users, num_items), interactions.len());
    for (user, item, feedback) in interactions.iter() {
        input.add_triplet(user, item, if implicit { 1.0 } else { feedback });
    }
    input.to_csr()
}
