use std::time::Instant;

use crate::config::RecommenderConfig;
use crate::data::RecommenderData;
use crate::error::{RecError, Result};
use crate::models::{FactorSet, ScoreModel, TensorFactorizer};
use crate::surface::ScoreSurface;
use crate::tensor::{reconstruct_scores, Flattener};

const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Collaborative full feedback model: a users × items × feedback tensor
/// decomposition whose scores are reconstructed per chunk of test users and
/// flattened along the feedback axis.
pub struct CoffeeModel<F> {
    factorizer: F,
    mlrank: [usize; 3],
    chunk_size: usize,
    factors: Option<FactorSet>,
}

impl<F: TensorFactorizer> CoffeeModel<F> {

    pub fn new(factorizer: F, mlrank: [usize; 3]) -> Self {
        Self { factorizer, mlrank, chunk_size: DEFAULT_CHUNK_SIZE, factors: None }
    }

    /// Number of test users reconstructed at once. Does not affect the scores.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size;
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn factors(&self) -> Option<&FactorSet> {
        self.factors.as_ref()
    }
}

impl<F: TensorFactorizer> ScoreModel for CoffeeModel<F> {

    fn method(&self) -> &str {
        "CoFFee"
    }

    fn configure(&mut self, config: &RecommenderConfig) {
        self.chunk_size = config.chunk_size;
    }

    fn build(&mut self, data: &RecommenderData) -> Result<()> {
        self.factors = None;
        let tensor = data.training_tensor()?;

        let start = Instant::now();
        let factors = self.factorizer.factorize(&tensor, self.mlrank)?;
        tracing::info!(method = self.method(), elapsed = ?start.elapsed(), "model training time");

        let [_, items_rank, feedback_rank] = self.mlrank;
        let expected_items = (data.num_items(), items_rank);
        let expected_feedback = (data.feedback_index().len(), feedback_rank);

        if factors.item_factors.dim() != expected_items {
            return Err(RecError::ShapeMismatch(format!(
                "item factors are {:?}, expected {:?}", factors.item_factors.dim(), expected_items)));
        }
        if factors.feedback_factors.dim() != expected_feedback {
            return Err(RecError::ShapeMismatch(format!(
                "feedback factors are {:?}, expected {:?}", factors.feedback_factors.dim(), expected_feedback)));
        }

        self.factors = Some(factors);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.factors.is_some()
    }

    fn score(&self, data: &RecommenderData, flattener: &Flattener) -> Result<ScoreSurface> {
        let factors = self.factors.as_ref()
            .ok_or_else(|| RecError::NotReady { method: self.method().to_string() })?;
        let test_triples = data.test_triples()?;

        let scores = reconstruct_scores(
            &test_triples,
            factors.item_factors.view(),
            factors.feedback_factors.view(),
            self.chunk_size,
            flattener,
        )?;

        Ok(ScoreSurface::dense(scores))
    }
}
