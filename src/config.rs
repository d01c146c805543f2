use serde::Deserialize;

use crate::error::{RecError, Result};
use crate::tensor::Flattener;

/// Settings shared by every recommender.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Number of recommendations per user.
    pub topk: usize,
    /// Push already seen items to the end of the recommendation lists.
    pub filter_seen: bool,
    /// Holdout feedback at or above this value counts as positive. Without a
    /// threshold every holdout item is positive.
    pub switch_positive: Option<f64>,
    /// Check data consistency before building a model.
    pub verify_integrity: bool,
    /// Users per reconstruction chunk of tensor models.
    pub chunk_size: usize,
    /// Feedback flattening policy of tensor models, see [`Flattener`]'s `FromStr`.
    pub flattener: String,
    /// Seed of the random baseline.
    pub seed: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            topk: 10,
            filter_seen: true,
            switch_positive: None,
            verify_integrity: true,
            chunk_size: 1000,
            flattener: "sum".to_string(),
            seed: 0,
        }
    }
}

impl RecommenderConfig {

    pub fn validate(&self) -> Result<()> {
        if self.topk == 0 {
            return Err(RecError::InvalidConfig("topk must be positive".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(RecError::InvalidConfig("chunk_size must be positive".to_string()));
        }
        self.flattener().map(|_| ())
    }

    pub fn flattener(&self) -> Result<Flattener> {
        self.flattener.parse()
    }
}
