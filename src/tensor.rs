//! Chunked reconstruction of user × item scores from a three-way tensor model.
//!
//! The test interactions of all users are encoded as a sparse indicator over a
//! flattened `(user * num_items + item, feedback)` index space. For every chunk
//! of users the indicator slice is projected through the item factors `V` and
//! feedback factors `W`:
//!
//! ```text
//! scores[u, i, f] = Σ_a Σ_b (Σ_j Σ_g T[u, j, g] W[g, b] V[j, a]) V[i, a] W[f, b]
//! ```
//!
//! and the resulting `chunk × items × feedback` cube is collapsed to a
//! `chunk × items` slice by a [`Flattener`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use ndarray::{Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;
use sprs::CsMat;

use crate::error::{RecError, Result};

/// Aggregation applied along the feedback axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    Sum,
    Max,
    Min,
    Mean,
}

impl Reduction {

    pub fn apply(self, lane: ArrayView1<f64>) -> f64 {
        match self {
            Reduction::Sum => lane.sum(),
            Reduction::Max => lane.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::Min => lane.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::Mean => {
                if lane.is_empty() { 0.0 } else { lane.sum() / lane.len() as f64 }
            }
        }
    }
}

impl FromStr for Reduction {
    type Err = RecError;

    fn from_str(name: &str) -> Result<Self> {
        match name.trim() {
            "sum" => Ok(Reduction::Sum),
            "max" => Ok(Reduction::Max),
            "min" => Ok(Reduction::Min),
            "mean" => Ok(Reduction::Mean),
            other => Err(RecError::UnrecognizedPolicy(other.to_string())),
        }
    }
}

/// Caller supplied collapse of a `users × items × feedback` cube into `users × items`.
pub type CustomFlattener = Arc<dyn Fn(ArrayView3<f64>) -> Array2<f64> + Send + Sync>;

/// Policy for collapsing the feedback axis of a reconstructed score cube.
#[derive(Clone)]
pub enum Flattener {
    FullAggregate(Reduction),
    FixedSlice(usize),
    SubsetAggregate(Vec<usize>, Reduction),
    Custom(CustomFlattener),
}

impl Default for Flattener {
    fn default() -> Self {
        Flattener::FullAggregate(Reduction::Sum)
    }
}

impl Flattener {

    pub fn custom<F>(flatten: F) -> Self
    where
        F: Fn(ArrayView3<f64>) -> Array2<f64> + Send + Sync + 'static,
    {
        Flattener::Custom(Arc::new(flatten))
    }

    /// Checks that every referenced feedback level exists.
    pub fn validate(&self, num_feedback: usize) -> Result<()> {
        let out_of_range = |level: usize| RecError::ShapeMismatch(format!(
            "flattener references feedback level {} but the model has {} levels",
            level, num_feedback));

        match self {
            Flattener::FixedSlice(level) if *level >= num_feedback => Err(out_of_range(*level)),
            Flattener::SubsetAggregate(levels, _) => {
                match levels.iter().find(|&&level| level >= num_feedback) {
                    Some(&level) => Err(out_of_range(level)),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }

    /// Collapses `cube` (users × items × feedback) into users × items.
    pub fn flatten(&self, cube: ArrayView3<f64>) -> Result<Array2<f64>> {
        let (num_users, num_items, num_feedback) = cube.dim();
        self.validate(num_feedback)?;

        let scores = match self {
            Flattener::FullAggregate(reduction) => {
                cube.map_axis(Axis(2), |lane| reduction.apply(lane))
            }
            Flattener::FixedSlice(level) => cube.index_axis(Axis(2), *level).to_owned(),
            Flattener::SubsetAggregate(levels, reduction) => {
                cube.select(Axis(2), levels).map_axis(Axis(2), |lane| reduction.apply(lane))
            }
            Flattener::Custom(flatten) => (**flatten)(cube),
        };

        if scores.dim() != (num_users, num_items) {
            return Err(RecError::ShapeMismatch(format!(
                "flattener produced {:?} scores, expected {:?}",
                scores.dim(), (num_users, num_items))));
        }
        Ok(scores)
    }
}

impl PartialEq for Flattener {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Flattener::FullAggregate(a), Flattener::FullAggregate(b)) => a == b,
            (Flattener::FixedSlice(a), Flattener::FixedSlice(b)) => a == b,
            (Flattener::SubsetAggregate(la, ra), Flattener::SubsetAggregate(lb, rb)) => {
                la == lb && ra == rb
            }
            (Flattener::Custom(a), Flattener::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Flattener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flattener::FullAggregate(reduction) => write!(f, "FullAggregate({:?})", reduction),
            Flattener::FixedSlice(level) => write!(f, "FixedSlice({})", level),
            Flattener::SubsetAggregate(levels, reduction) => {
                write!(f, "SubsetAggregate({:?}, {:?})", levels, reduction)
            }
            Flattener::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Parses `sum`, `max`, `3`, `0,2`, `0,2:max` or `:mean`.
impl FromStr for Flattener {
    type Err = RecError;

    fn from_str(value: &str) -> Result<Self> {
        let unrecognized = || RecError::UnrecognizedPolicy(value.to_string());
        let value = value.trim();

        let (levels, reduction) = match value.split_once(':') {
            Some((levels, reduction)) => {
                (levels.trim(), reduction.parse::<Reduction>().map_err(|_| unrecognized())?)
            }
            None => {
                if let Ok(reduction) = value.parse::<Reduction>() {
                    return Ok(Flattener::FullAggregate(reduction));
                }
                if let Ok(level) = value.parse::<usize>() {
                    return Ok(Flattener::FixedSlice(level));
                }
                (value, Reduction::Sum)
            }
        };

        if levels.is_empty() {
            return Ok(Flattener::FullAggregate(reduction));
        }

        let levels = levels.split(',')
            .map(|level| level.trim().parse::<usize>())
            .collect::<std::result::Result<Vec<usize>, _>>()
            .map_err(|_| unrecognized())?;

        Ok(Flattener::SubsetAggregate(levels, reduction))
    }
}

/// Reconstructs a dense `num_users × num_items` score matrix from the test
/// indicator `test_triples` (`num_users * num_items × num_feedback`), item
/// factors (`num_items × rank_items`) and feedback factors
/// (`num_feedback × rank_feedback`).
///
/// Users are processed in chunks of `chunk_size` rows so that at most
/// `chunk_size × num_items × num_feedback` cube entries are materialised per
/// chunk. Chunks run in parallel and each writes its own row range; the
/// result does not depend on the chunk size.
pub fn reconstruct_scores(
    test_triples: &CsMat<f64>,
    item_factors: ArrayView2<f64>,
    feedback_factors: ArrayView2<f64>,
    chunk_size: usize,
    flattener: &Flattener,
) -> Result<Array2<f64>> {

    if chunk_size == 0 {
        return Err(RecError::InvalidConfig("chunk size must be positive".to_string()));
    }

    let num_items = item_factors.nrows();
    let num_feedback = feedback_factors.nrows();
    let (num_rows, num_columns) = test_triples.shape();

    if num_columns != num_feedback {
        return Err(RecError::ShapeMismatch(format!(
            "test triples have {} feedback columns, feedback factors have {} rows",
            num_columns, num_feedback)));
    }
    if num_items == 0 {
        return Ok(Array2::zeros((0, 0)));
    }
    if num_rows % num_items != 0 {
        return Err(RecError::ShapeMismatch(format!(
            "{} test triple rows are not a multiple of {} items", num_rows, num_items)));
    }
    flattener.validate(num_feedback)?;

    let num_users = num_rows / num_items;
    let row_major;
    let test_triples = if test_triples.is_csr() {
        test_triples
    } else {
        row_major = test_triples.to_csr();
        &row_major
    };

    let mut scores = Array2::zeros((num_users, num_items));

    // every chunk owns its own row range of the output
    scores
        .axis_chunks_iter_mut(Axis(0), chunk_size)
        .into_par_iter()
        .enumerate()
        .try_for_each(|(chunk, mut rows)| -> Result<()> {
            let start = chunk * chunk_size;
            let stop = start + rows.nrows();
            tracing::debug!(start, stop, "reconstructing score chunk");

            let test_slice = test_triples.slice_outer(start * num_items..stop * num_items);
            let cube = reconstruct_chunk(&test_slice.to_owned(), item_factors, feedback_factors, stop - start)?;
            rows.assign(&flattener.flatten(cube.view())?);
            Ok(())
        })?;

    Ok(scores)
}

fn reconstruct_chunk(
    test_slice: &CsMat<f64>,
    item_factors: ArrayView2<f64>,
    feedback_factors: ArrayView2<f64>,
    num_users: usize,
) -> Result<Array3<f64>> {
    let num_items = item_factors.nrows();
    let num_feedback = feedback_factors.nrows();
    let rank_feedback = feedback_factors.ncols();

    let projected: Array2<f64> = test_slice * &feedback_factors;
    let projected = Array3::from_shape_vec(
        (num_users, num_items, rank_feedback),
        projected.iter().copied().collect(),
    ).map_err(|error| RecError::ShapeMismatch(error.to_string()))?;

    let mut cube = Array3::zeros((num_users, num_items, num_feedback));
    for (user, user_slice) in projected.outer_iter().enumerate() {
        // rank_items × rank_feedback core of this user
        let core = item_factors.t().dot(&user_slice);
        let user_scores = item_factors.dot(&core).dot(&feedback_factors.t());
        cube.index_axis_mut(Axis(0), user).assign(&user_scores);
    }

    Ok(cube)
}
