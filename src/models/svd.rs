use std::time::Instant;

use ndarray::Array2;

use crate::data::RecommenderData;
use crate::error::{RecError, Result};
use crate::models::{MatrixFactorizer, ScoreModel};
use crate::surface::ScoreSurface;
use crate::tensor::Flattener;

/// Truncated decomposition model. Scores are the projection of a user's
/// history onto the item factor space and back: `(T · V) · Vᵀ`.
pub struct SvdModel<F> {
    factorizer: F,
    rank: usize,
    item_factors: Option<Array2<f64>>,
}

impl<F: MatrixFactorizer> SvdModel<F> {

    pub fn new(factorizer: F, rank: usize) -> Self {
        Self { factorizer, rank, item_factors: None }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn item_factors(&self) -> Option<&Array2<f64>> {
        self.item_factors.as_ref()
    }
}

impl<F: MatrixFactorizer> ScoreModel for SvdModel<F> {

    fn method(&self) -> &str {
        "SVD"
    }

    fn build(&mut self, data: &RecommenderData) -> Result<()> {
        self.item_factors = None;
        if self.rank == 0 || self.rank > data.num_items() {
            return Err(RecError::InvalidConfig(format!(
                "rank {} is outside of 1..={}", self.rank, data.num_items())));
        }
        let matrix = data.training_matrix(false);

        let start = Instant::now();
        let item_factors = self.factorizer.item_factors(&matrix, self.rank)?;
        tracing::info!(method = self.method(), elapsed = ?start.elapsed(), "model training time");

        if item_factors.dim() != (data.num_items(), self.rank) {
            return Err(RecError::ShapeMismatch(format!(
                "item factors are {:?}, expected {:?}",
                item_factors.dim(), (data.num_items(), self.rank))));
        }

        self.item_factors = Some(item_factors);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.item_factors.is_some()
    }

    fn score(&self, data: &RecommenderData, _flattener: &Flattener) -> Result<ScoreSurface> {
        let item_factors = self.item_factors.as_ref()
            .ok_or_else(|| RecError::NotReady { method: self.method().to_string() })?;
        let test_matrix = data.test_matrix(false)?;

        let projected: Array2<f64> = &test_matrix * item_factors;
        Ok(ScoreSurface::dense(projected.dot(&item_factors.t())))
    }
}
