use ndarray::{s, ArrayView2};

use crate::error::{RecError, Result};
use crate::types::TopKMatrix;

/// Cached top-k output of a model.
///
/// A cached matrix of width `w` serves every read with `k <= w` by slicing.
/// Reads with a larger `k` recompute at the new width.
#[derive(Debug, Clone, Default)]
pub struct RecommendationCache {
    cached: Option<TopKMatrix>,
    recomputations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Populated { width: usize },
}

impl RecommendationCache {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CacheState {
        match &self.cached {
            None => CacheState::Empty,
            Some(recommendations) => CacheState::Populated { width: recommendations.ncols() },
        }
    }

    /// Width of the cached matrix, `None` when empty.
    pub fn width(&self) -> Option<usize> {
        self.cached.as_ref().map(|recommendations| recommendations.ncols())
    }

    pub fn is_empty(&self) -> bool {
        self.cached.is_none()
    }

    /// Number of times the cache has been (re)populated.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            tracing::debug!("invalidated cached recommendations");
        }
    }

    /// Drops the cached matrix if it is narrower than `k`.
    pub fn reserve(&mut self, k: usize) {
        if self.width().map_or(false, |width| k > width) {
            self.invalidate();
        }
    }

    /// Serves `k` columns, running `compute` at most once when the cache
    /// cannot satisfy the request.
    pub fn get_or_compute<F>(&mut self, k: usize, compute: F) -> Result<ArrayView2<'_, i64>>
    where
        F: FnOnce(usize) -> Result<TopKMatrix>,
    {
        if k == 0 {
            return Err(RecError::InvalidConfig("topk must be positive".to_string()));
        }
        self.reserve(k);

        let recommendations = match self.cached.take() {
            Some(recommendations) => recommendations,
            None => {
                let recommendations = compute(k)?;
                if recommendations.ncols() < k {
                    return Err(RecError::ShapeMismatch(format!(
                        "computed {} recommendation columns, requested {}",
                        recommendations.ncols(), k)));
                }
                self.recomputations += 1;
                tracing::debug!(k, recomputations = self.recomputations, "populated recommendation cache");
                recommendations
            }
        };

        let recommendations = self.cached.insert(recommendations);
        Ok(recommendations.slice(s![.., ..k]))
    }
}
