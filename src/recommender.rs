use ndarray::{s, Array2, ArrayView2};

use crate::cache::RecommendationCache;
use crate::config::RecommenderConfig;
use crate::data::RecommenderData;
use crate::error::{RecError, Result};
use crate::evaluation::{align_predictions, AlignedPredictions, Evaluation};
use crate::models::ScoreModel;
use crate::seen::suppress_seen_items;
use crate::tensor::Flattener;
use crate::topk::extract_topk;
use crate::types::TopKMatrix;

/// Owns a model together with its data and the cached top-k recommendations.
///
/// The cache is dropped when the model is rebuilt, when the flattening policy
/// or seen-item filtering changes, and when more recommendations are requested
/// than are cached. Requests for fewer recommendations are served by slicing.
pub struct Recommender<M> {
    data: RecommenderData,
    model: M,
    topk: usize,
    filter_seen: bool,
    switch_positive: Option<f64>,
    verify_integrity: bool,
    flattener: Flattener,
    cache: RecommendationCache,
}

impl<M: ScoreModel> Recommender<M> {

    pub fn new(data: RecommenderData, model: M) -> Self {
        let config = RecommenderConfig::default();
        Self {
            data,
            model,
            topk: config.topk,
            filter_seen: config.filter_seen,
            switch_positive: config.switch_positive,
            verify_integrity: config.verify_integrity,
            flattener: Flattener::default(),
            cache: RecommendationCache::new(),
        }
    }

    pub fn with_config(data: RecommenderData, mut model: M, config: &RecommenderConfig) -> Result<Self> {
        config.validate()?;
        model.configure(config);
        Ok(Self {
            topk: config.topk,
            filter_seen: config.filter_seen,
            switch_positive: config.switch_positive,
            verify_integrity: config.verify_integrity,
            flattener: config.flattener()?,
            ..Self::new(data, model)
        })
    }

    pub fn method(&self) -> &str {
        self.model.method()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn data(&self) -> &RecommenderData {
        &self.data
    }

    pub fn cache(&self) -> &RecommendationCache {
        &self.cache
    }

    /// How often recommendations were computed so far.
    pub fn recomputations(&self) -> usize {
        self.cache.recomputations()
    }

    pub fn topk(&self) -> usize {
        self.topk
    }

    /// Sets the number of recommendations. A value larger than the cached
    /// width invalidates the cache; smaller values reuse it.
    pub fn set_topk(&mut self, topk: usize) -> Result<()> {
        if topk == 0 {
            return Err(RecError::InvalidConfig("topk must be positive".to_string()));
        }
        self.cache.reserve(topk);
        self.topk = topk;
        Ok(())
    }

    pub fn filter_seen(&self) -> bool {
        self.filter_seen
    }

    pub fn set_filter_seen(&mut self, filter_seen: bool) {
        if filter_seen != self.filter_seen {
            self.filter_seen = filter_seen;
            self.cache.invalidate();
        }
    }

    pub fn flattener(&self) -> &Flattener {
        &self.flattener
    }

    pub fn set_flattener(&mut self, flattener: Flattener) {
        if flattener != self.flattener {
            self.flattener = flattener;
            self.cache.invalidate();
        }
    }

    pub fn switch_positive(&self) -> Option<f64> {
        self.switch_positive
    }

    pub fn set_switch_positive(&mut self, switch_positive: Option<f64>) {
        self.switch_positive = switch_positive;
    }

    /// Learns the model and drops cached recommendations.
    pub fn build(&mut self) -> Result<()> {
        self.cache.invalidate();
        if self.verify_integrity {
            self.data.verify_integrity()?;
        }
        self.model.build(&self.data)
    }

    /// Builds the model if it has not been built yet.
    pub fn ensure_built(&mut self) -> Result<()> {
        if !self.model.is_ready() {
            tracing::warn!("{} model is not ready. Rebuilding.", self.model.method());
            self.build()?;
        }
        Ok(())
    }

    /// Top-k item ids per test user, computed on first use and cached.
    pub fn recommendations(&mut self) -> Result<ArrayView2<'_, i64>> {
        let topk = self.topk;
        if self.cache.width().map_or(true, |width| topk > width) {
            self.ensure_built()?;
        }

        let Self { data, model, filter_seen, flattener, cache, .. } = self;
        cache.get_or_compute(topk, |k| recommend(&*model, data, flattener, *filter_seen, k))
    }

    /// Matches the recommendations against the holdout items.
    pub fn matched_predictions(&mut self) -> Result<AlignedPredictions> {
        let recommendations = self.recommendations()?.to_owned();
        Ok(align_predictions(recommendations.view(), self.data.holdout().view()))
    }

    /// Collects the inputs of external metric functions for the first `topk`
    /// recommendations (the current `topk` when `None`). A larger `topk`
    /// raises the recommender's `topk` first.
    pub fn evaluate(&mut self, topk: Option<usize>) -> Result<Evaluation> {
        let topk = topk.unwrap_or(self.topk);
        if topk > self.topk {
            self.set_topk(topk)?;
        }

        let mut aligned = self.matched_predictions()?;
        aligned.truncate_topk(topk);

        let num_users = aligned.num_users();
        let feedback = self.data.holdout_feedback().slice(s![..num_users, ..]).to_owned();
        let positive = match self.switch_positive {
            Some(threshold) => feedback.mapv(|value| value >= threshold),
            None => Array2::from_elem(feedback.dim(), true),
        };

        Ok(Evaluation {
            matches: aligned.matches,
            feedback,
            positive,
            truncation: aligned.truncation,
        })
    }
}

fn recommend<M: ScoreModel>(
    model: &M,
    data: &RecommenderData,
    flattener: &Flattener,
    filter_seen: bool,
    k: usize,
) -> Result<TopKMatrix> {
    let mut surface = model.score(data, flattener)?;

    let expected = (data.num_test_users(), data.num_items());
    if surface.shape() != expected {
        return Err(RecError::ShapeMismatch(format!(
            "{} model produced {:?} scores, expected {:?}",
            model.method(), surface.shape(), expected)));
    }

    if filter_seen {
        suppress_seen_items(&mut surface, &data.seen_index())?;
    }

    extract_topk(&surface, k)
}
