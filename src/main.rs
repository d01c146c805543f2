use ndarray::{Array2, Array3};
use tracing_subscriber::EnvFilter;

use recscore::models::{CoffeeModel, CooccurrenceModel, FactorSet, NonPersonalized, PopularityKind, ScoreModel};
use recscore::{Flattener, Interactions, Recommender, RecommenderConfig, RecommenderData, Reduction, SparseTensor};

fn main() -> recscore::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = RecommenderConfig { topk: 2, ..Default::default() };

    run(NonPersonalized::new(PopularityKind::MostPopular), &config)?;
    run(CooccurrenceModel::new(), &config)?;

    let mut coffee = Recommender::with_config(demo_data()?, CoffeeModel::new(truncated_factors, [2, 2, 2]), &config)?;
    print_recommendations(&mut coffee)?;

    coffee.set_flattener(Flattener::SubsetAggregate(vec![2, 3], Reduction::Max));
    println!("\n\nOnly high ratings:");
    print_recommendations(&mut coffee)?;

    let evaluation = coffee.evaluate(Some(1))?;
    let hits = evaluation.matches.iter().filter(|&&hit| hit).count();
    println!("\n{} hits among the top-1 recommendations", hits);

    Ok(())
}

fn run<M: ScoreModel>(model: M, config: &RecommenderConfig) -> recscore::Result<()> {
    let mut recommender = Recommender::with_config(demo_data()?, model, config)?;
    print_recommendations(&mut recommender)?;
    println!();
    Ok(())
}

fn print_recommendations<M: ScoreModel>(recommender: &mut Recommender<M>) -> recscore::Result<()> {
    let method = recommender.method().to_string();
    let recommendations = recommender.recommendations()?;
    for (user, row) in recommendations.outer_iter().enumerate() {
        println!("{} {:?}: {:?}", method, user, row.to_vec());
    }
    Ok(())
}

fn demo_data() -> recscore::Result<RecommenderData> {
    let training = Interactions::from_triples(&[
        (0, 0, 5.0), (0, 1, 3.0), (0, 2, 1.0), (0, 4, 5.0),
        (1, 1, 4.0), (1, 3, 5.0),
        (2, 1, 5.0), (2, 2, 3.0), (2, 4, 4.0),
        (3, 3, 1.0), (3, 0, 4.0),
    ]);
    let testset = Interactions::from_triples(&[
        (0, 0, 5.0), (0, 1, 4.0),
        (1, 3, 3.0),
        (2, 2, 1.0), (2, 4, 5.0),
    ]);
    let holdout = ndarray::array![[4], [1], [0]];
    let holdout_feedback = ndarray::array![[5.0], [4.0], [3.0]];

    RecommenderData::new(training, testset, holdout, holdout_feedback)
}

/// Leading columns of the unfolded training tensor as factors.
fn truncated_factors(tensor: &SparseTensor, mlrank: [usize; 3]) -> recscore::Result<FactorSet> {
    let [num_users, num_items, num_feedback] = tensor.shape;

    let mut items_by_feedback = Array2::<f64>::zeros((num_items, num_feedback));
    for [_, item, level] in tensor.indices.iter().copied() {
        items_by_feedback[(item, level)] += 1.0;
    }

    let item_factors = Array2::from_shape_fn((num_items, mlrank[1]), |(item, rank)| {
        items_by_feedback[(item, rank % num_feedback)]
    });
    let feedback_factors = Array2::from_shape_fn((num_feedback, mlrank[2]), |(level, rank)| {
        if level % mlrank[2] == rank { 1.0 } else { 0.0 }
    });

    Ok(FactorSet {
        user_factors: Array2::zeros((num_users, mlrank[0])),
        item_factors,
        feedback_factors,
        core: Array3::zeros((mlrank[0], mlrank[1], mlrank[2])),
    })
}
