use std::time::Instant;

use sprs::CsMat;

use crate::data::RecommenderData;
use crate::error::{RecError, Result};
use crate::index_builder::build_cooccurrence_index;
use crate::models::ScoreModel;
use crate::surface::ScoreSurface;
use crate::tensor::Flattener;

/// Item-to-item model scoring items by their cooccurrence with a user's history.
#[derive(Debug, Clone)]
pub struct CooccurrenceModel {
    implicit: bool,
    cooccurrences: Option<CsMat<f64>>,
}

impl Default for CooccurrenceModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CooccurrenceModel {

    pub fn new() -> Self {
        Self { implicit: true, cooccurrences: None }
    }

    /// Weighs cooccurrences by feedback values instead of counting them.
    pub fn explicit(mut self) -> Self {
        self.implicit = false;
        self
    }

    pub fn cooccurrences(&self) -> Option<&CsMat<f64>> {
        self.cooccurrences.as_ref()
    }
}

impl ScoreModel for CooccurrenceModel {

    fn method(&self) -> &str {
        "item-to-item"
    }

    fn build(&mut self, data: &RecommenderData) -> Result<()> {
        self.cooccurrences = None;
        let user_items = data.training_matrix(self.implicit);

        let start = Instant::now();
        let cooccurrences = build_cooccurrence_index(&user_items);
        tracing::info!(method = self.method(), elapsed = ?start.elapsed(), "model training time");

        self.cooccurrences = Some(cooccurrences);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.cooccurrences.is_some()
    }

    fn score(&self, data: &RecommenderData, _flattener: &Flattener) -> Result<ScoreSurface> {
        let cooccurrences = self.cooccurrences.as_ref()
            .ok_or_else(|| RecError::NotReady { method: self.method().to_string() })?;
        let test_matrix = data.test_matrix(self.implicit)?;

        if test_matrix.cols() != cooccurrences.rows() {
            return Err(RecError::ShapeMismatch(format!(
                "test matrix has {} items, cooccurrence matrix has {}",
                test_matrix.cols(), cooccurrences.rows())));
        }

        let scores: CsMat<f64> = &test_matrix * cooccurrences;
        Ok(ScoreSurface::sparse(scores))
    }
}
