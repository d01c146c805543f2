use ndarray::Array2;
use rand::prelude::*;
use rand::rngs::StdRng;

use crate::config::RecommenderConfig;
use crate::data::RecommenderData;
use crate::error::Result;
use crate::models::ScoreModel;
use crate::surface::ScoreSurface;
use crate::tensor::Flattener;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopularityKind {
    /// Number of training interactions per item.
    MostPopular,
    /// Sum of training feedback per item.
    TopScore,
    /// Uniform random scores.
    Random,
}

/// Baselines that score every test user the same way (random aside).
#[derive(Debug, Clone)]
pub struct NonPersonalized {
    kind: PopularityKind,
    seed: u64,
    method: String,
}

impl NonPersonalized {

    pub fn new(kind: PopularityKind) -> Self {
        let method = match kind {
            PopularityKind::MostPopular => "mostpopular",
            PopularityKind::TopScore => "topscore",
            PopularityKind::Random => "random",
        };
        Self { kind, seed: 0, method: method.to_string() }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn kind(&self) -> PopularityKind {
        self.kind
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn item_scores(&self, data: &RecommenderData) -> Vec<f64> {
        let mut scores = vec![0.0; data.num_items()];
        for (_, item, feedback) in data.training().iter() {
            scores[item] += match self.kind {
                PopularityKind::TopScore => feedback,
                _ => 1.0,
            };
        }
        scores
    }
}

impl ScoreModel for NonPersonalized {

    fn method(&self) -> &str {
        &self.method
    }

    fn configure(&mut self, config: &RecommenderConfig) {
        self.seed = config.seed;
    }

    fn build(&mut self, _data: &RecommenderData) -> Result<()> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn score(&self, data: &RecommenderData, _flattener: &Flattener) -> Result<ScoreSurface> {
        let shape = (data.num_test_users(), data.num_items());

        let scores = match self.kind {
            PopularityKind::Random => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                Array2::from_shape_simple_fn(shape, || rng.gen::<f64>())
            }
            PopularityKind::MostPopular | PopularityKind::TopScore => {
                let item_scores = self.item_scores(data);
                Array2::from_shape_fn(shape, |(_, item)| item_scores[item])
            }
        };

        Ok(ScoreSurface::dense(scores))
    }
}
