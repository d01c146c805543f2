use std::fmt;

use ndarray::{s, Array2, Array3, ArrayView2, Axis};

/// Which side of the alignment lost rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truncation {
    /// There were more recommendation rows than holdout rows.
    Recommendations { from: usize, to: usize },
    /// There were more holdout rows than recommendation rows.
    EvaluationSet { from: usize, to: usize },
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Truncation::Recommendations { from, to } => {
                write!(f, "recommendations truncated from {} to {} rows", from, to)
            }
            Truncation::EvaluationSet { from, to } => {
                write!(f, "evaluation set truncated from {} to {} rows", from, to)
            }
        }
    }
}

/// `matches[u, k, h]` is true when the `k`-th recommendation of user `u` equals
/// the `h`-th holdout item of that user.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPredictions {
    pub matches: Array3<bool>,
    pub truncation: Option<Truncation>,
}

impl AlignedPredictions {

    pub fn num_users(&self) -> usize {
        self.matches.len_of(Axis(0))
    }

    /// Keeps only the first `k` recommendation positions.
    pub fn truncate_topk(&mut self, k: usize) {
        let k = usize::min(k, self.matches.len_of(Axis(1)));
        self.matches = self.matches.slice(s![.., ..k, ..]).to_owned();
    }
}

/// Inputs of external metric functions for one evaluation call.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Users × topk × holdout matches.
    pub matches: Array3<bool>,
    /// Holdout feedback of the evaluated users.
    pub feedback: Array2<f64>,
    /// Holdout entries counted as positive feedback.
    pub positive: Array2<bool>,
    pub truncation: Option<Truncation>,
}

/// Matches recommendations against holdout items row by row.
///
/// A row-count mismatch is resolved by truncating the larger side; the
/// truncation is logged and returned with the result.
pub fn align_predictions(recommendations: ArrayView2<i64>, holdout: ArrayView2<i64>) -> AlignedPredictions {
    let num_recommended = recommendations.nrows();
    let num_holdout = holdout.nrows();
    let num_users = usize::min(num_recommended, num_holdout);

    let truncation = if num_recommended > num_holdout {
        Some(Truncation::Recommendations { from: num_recommended, to: num_holdout })
    } else if num_recommended < num_holdout {
        Some(Truncation::EvaluationSet { from: num_holdout, to: num_recommended })
    } else {
        None
    };
    if let Some(truncation) = &truncation {
        tracing::warn!("{}", truncation);
    }

    let recommendations = recommendations.slice(s![..num_users, ..]);
    let holdout = holdout.slice(s![..num_users, ..]);

    let matches = Array3::from_shape_fn(
        (num_users, recommendations.ncols(), holdout.ncols()),
        |(user, position, held_out)| recommendations[(user, position)] == holdout[(user, held_out)],
    );

    AlignedPredictions { matches, truncation }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SENTINEL;
    use ndarray::array;

    #[test]
    fn test_element_wise_matches() {
        let recommendations = array![[3, 1, 2], [0, SENTINEL, SENTINEL]];
        let holdout = array![[1, 5], [0, 4]];

        let aligned = align_predictions(recommendations.view(), holdout.view());

        assert_eq!(aligned.truncation, None);
        assert_eq!(aligned.matches.dim(), (2, 3, 2));
        assert!(aligned.matches[(0, 1, 0)]);
        assert!(aligned.matches[(1, 0, 0)]);
        assert_eq!(aligned.matches.iter().filter(|&&hit| hit).count(), 2);
    }

    #[test]
    fn test_sentinel_never_matches() {
        let recommendations = array![[SENTINEL, SENTINEL]];
        let holdout = array![[0, 1, 2]];

        let aligned = align_predictions(recommendations.view(), holdout.view());

        assert!(aligned.matches.iter().all(|&hit| !hit));
    }

    #[test]
    fn test_more_recommendations_than_holdout() {
        let recommendations: Array2<i64> = Array2::zeros((5, 2));
        let holdout: Array2<i64> = Array2::zeros((3, 4));

        let aligned = align_predictions(recommendations.view(), holdout.view());

        assert_eq!(aligned.num_users(), 3);
        assert_eq!(aligned.truncation, Some(Truncation::Recommendations { from: 5, to: 3 }));
        assert!(aligned.truncation.unwrap().to_string().starts_with("recommendations truncated"));
    }

    #[test]
    fn test_more_holdout_than_recommendations() {
        let recommendations: Array2<i64> = Array2::zeros((3, 2));
        let holdout: Array2<i64> = Array2::zeros((5, 4));

        let aligned = align_predictions(recommendations.view(), holdout.view());

        assert_eq!(aligned.matches.dim(), (3, 2, 4));
        assert_eq!(aligned.truncation, Some(Truncation::EvaluationSet { from: 5, to: 3 }));
        assert!(aligned.truncation.unwrap().to_string().starts_with("evaluation set truncated"));
    }

    #[test]
    fn test_truncate_topk() {
        let recommendations = array![[4, 1, 2], [7, 8, 9]];
        let holdout = array![[2, 4], [9, 3]];

        let mut aligned = align_predictions(recommendations.view(), holdout.view());
        assert_eq!(aligned.matches.iter().filter(|&&hit| hit).count(), 3);

        aligned.truncate_topk(1);
        assert_eq!(aligned.matches.dim(), (2, 1, 2));
        assert!(aligned.matches[(0, 0, 1)]);
        assert_eq!(aligned.matches.iter().filter(|&&hit| hit).count(), 1);
    }
}
