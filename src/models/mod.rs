//! Score producers for the recommendation pipeline.
//!
//! The factorization routines themselves are external. Models receive them
//! through [`MatrixFactorizer`] and [`TensorFactorizer`] and only turn the
//! learned factors into score surfaces.

use ndarray::{Array2, Array3};
use sprs::CsMat;

use crate::config::RecommenderConfig;
use crate::data::{RecommenderData, SparseTensor};
use crate::error::Result;
use crate::surface::ScoreSurface;
use crate::tensor::Flattener;

mod coffee;
mod cooccurrence;
mod popularity;
mod svd;

pub use coffee::CoffeeModel;
pub use cooccurrence::CooccurrenceModel;
pub use popularity::{NonPersonalized, PopularityKind};
pub use svd::SvdModel;

/// A model that turns test user histories into a users × items score surface.
pub trait ScoreModel {

    fn method(&self) -> &str;

    /// Picks up the model specific settings of `config`.
    fn configure(&mut self, _config: &RecommenderConfig) {}

    /// Learns the model from the training data.
    fn build(&mut self, data: &RecommenderData) -> Result<()>;

    fn is_ready(&self) -> bool;

    /// Scores every (test user, item) pair. Fails with
    /// [`crate::error::RecError::NotReady`] before the model was built.
    /// Only tensor models use the `flattener`.
    fn score(&self, data: &RecommenderData, flattener: &Flattener) -> Result<ScoreSurface>;
}

/// Produces item factors (`num_items × rank`) from a users × items matrix.
pub trait MatrixFactorizer {
    fn item_factors(&self, matrix: &CsMat<f64>, rank: usize) -> Result<Array2<f64>>;
}

impl<F> MatrixFactorizer for F
where
    F: Fn(&CsMat<f64>, usize) -> Result<Array2<f64>>,
{
    fn item_factors(&self, matrix: &CsMat<f64>, rank: usize) -> Result<Array2<f64>> {
        self(matrix, rank)
    }
}

/// Factors of a Tucker-style users × items × feedback decomposition. The core
/// is already folded into the feedback factors.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSet {
    pub user_factors: Array2<f64>,
    pub item_factors: Array2<f64>,
    pub feedback_factors: Array2<f64>,
    pub core: Array3<f64>,
}

/// Produces a [`FactorSet`] for a sparse training tensor and multilinear rank.
pub trait TensorFactorizer {
    fn factorize(&self, tensor: &SparseTensor, mlrank: [usize; 3]) -> Result<FactorSet>;
}

impl<F> TensorFactorizer for F
where
    F: Fn(&SparseTensor, [usize; 3]) -> Result<FactorSet>,
{
    fn factorize(&self, tensor: &SparseTensor, mlrank: [usize; 3]) -> Result<FactorSet> {
        self(tensor, mlrank)
    }
}
