use ndarray::{array, Array2};
use sprs::TriMat;

use recscore::models::{CooccurrenceModel, NonPersonalized, PopularityKind};
use recscore::{
    align_predictions, extract_topk, suppress_seen_items, Interactions, Recommender, RecommenderConfig,
    RecommenderData, ScoreSurface, SeenIndex, TopKMatrix, Truncation, SENTINEL,
};

fn scores() -> Array2<f64> {
    array![[4.0, 1.0, 3.0, 2.0], [1.0, 4.0, 3.0, 2.0], [2.0, 3.0, 4.0, 1.0]]
}

#[test]
fn dense_scores_without_suppression() {
    let surface = ScoreSurface::dense(scores());

    let recommendations = extract_topk(&surface, 2).unwrap();

    let expected: TopKMatrix = array![[0, 2], [1, 2], [2, 1]];
    assert_eq!(recommendations, expected);
}

#[test]
fn dense_scores_with_seen_item() {
    let mut surface = ScoreSurface::dense(scores());
    let seen = SeenIndex::from_pairs([(0, 0)]);

    suppress_seen_items(&mut surface, &seen).unwrap();
    let recommendations = extract_topk(&surface, 2).unwrap();

    assert_eq!(recommendations.row(0), array![2i64, 3]);
    assert_eq!(recommendations.row(1), array![1i64, 2]);
}

#[test]
fn sparse_scores_with_empty_rows() {
    let mut input = TriMat::new((4, 5));
    input.add_triplet(0, 3, 0.5);
    input.add_triplet(0, 1, 2.0);
    input.add_triplet(2, 4, 1.0);
    let mut surface = ScoreSurface::sparse(input.to_csr());

    suppress_seen_items(&mut surface, &SeenIndex::from_pairs([(0, 1), (2, 0)])).unwrap();
    let recommendations = extract_topk(&surface, 3).unwrap();

    let expected: TopKMatrix = array![
        [3, 1, SENTINEL],
        [SENTINEL, SENTINEL, SENTINEL],
        [4, SENTINEL, SENTINEL],
        [SENTINEL, SENTINEL, SENTINEL],
    ];
    assert_eq!(recommendations, expected);
}

#[test]
fn more_recommendation_rows_than_holdout_rows() {
    let recommendations: TopKMatrix = array![[0, 1], [1, 2], [2, 3], [3, 4], [4, 0]];
    let holdout: TopKMatrix = array![[1], [1], [5]];

    let aligned = align_predictions(recommendations.view(), holdout.view());

    assert_eq!(aligned.matches.dim(), (3, 2, 1));
    assert_eq!(aligned.truncation, Some(Truncation::Recommendations { from: 5, to: 3 }));
    assert!(aligned.truncation.unwrap().to_string().starts_with("recommendations truncated"));
    assert!(aligned.matches[(0, 1, 0)]);
    assert!(aligned.matches[(1, 0, 0)]);
    assert_eq!(aligned.matches.iter().filter(|&&hit| hit).count(), 2);

    let swapped = align_predictions(holdout.view(), recommendations.view());
    assert_eq!(swapped.matches.dim(), (3, 1, 2));
    assert!(swapped.truncation.unwrap().to_string().starts_with("evaluation set truncated"));
}

fn movie_data() -> RecommenderData {
    let training = Interactions::from_triples(&[
        (0, 0, 5.0), (0, 1, 3.0), (0, 4, 4.0),
        (1, 1, 4.0), (1, 2, 5.0), (1, 3, 2.0),
        (2, 0, 4.0), (2, 1, 4.0), (2, 2, 3.0),
        (3, 2, 5.0), (3, 4, 1.0),
    ]);
    let testset = Interactions::from_triples(&[(0, 0, 5.0), (1, 2, 4.0), (2, 4, 3.0)]);
    RecommenderData::new(training, testset, array![[1], [1], [2]], array![[4.0], [5.0], [2.0]]).unwrap()
}

#[test]
fn cooccurrence_recommender_end_to_end() {
    let config = RecommenderConfig { topk: 2, ..Default::default() };
    let mut recommender = Recommender::with_config(movie_data(), CooccurrenceModel::new(), &config).unwrap();

    let recommendations = recommender.recommendations().unwrap().to_owned();

    // item 0 cooccurs with 1 (twice), 2 and 4; item 2 with 1 (twice), 3, 0 and 4
    let expected: TopKMatrix = array![[1, 2], [1, 0], [0, 1]];
    assert_eq!(recommendations, expected);
    for (user, item) in [(0, 0), (1, 2), (2, 4)] {
        assert!(!recommendations.row(user).iter().any(|&recommended| recommended == item));
    }

    let evaluation = recommender.evaluate(None).unwrap();
    assert_eq!(evaluation.matches.dim(), (3, 2, 1));
    assert!(evaluation.matches[(0, 0, 0)]);
    assert!(evaluation.matches[(1, 0, 0)]);
    assert!(!evaluation.matches[(2, 0, 0)]);
    assert_eq!(recommender.recomputations(), 1);
}

#[test]
fn popularity_recommender_from_json_config() {
    let config: RecommenderConfig = serde_json::from_str(r#"{"topk": 3, "switch_positive": 4.0}"#).unwrap();
    let mut recommender = Recommender::with_config(
        movie_data(), NonPersonalized::new(PopularityKind::MostPopular), &config).unwrap();

    let evaluation = recommender.evaluate(None).unwrap();

    assert_eq!(evaluation.matches.dim(), (3, 3, 1));
    assert_eq!(evaluation.positive, array![[true], [true], [false]]);
    assert_eq!(recommender.recommendations().unwrap().row(0), array![1i64, 2, 4]);
}
