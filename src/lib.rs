//! Turns model scores into evaluated top-k recommendations: seen-item
//! suppression, sentinel-padded top-k extraction, chunked reconstruction of
//! tensor factorization scores, a recommendation cache and the alignment of
//! recommendations with holdout items.

pub mod cache;
pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod recommender;
pub mod seen;
pub mod surface;
pub mod tensor;
pub mod topk;
pub mod types;

mod index_builder;
mod row_accumulator;

#[cfg(feature = "python")]
mod python;

pub use cache::{CacheState, RecommendationCache};
pub use config::RecommenderConfig;
pub use data::{FeedbackIndex, Interactions, RecommenderData, SparseTensor};
pub use error::{RecError, Result};
pub use evaluation::{align_predictions, AlignedPredictions, Evaluation, Truncation};
pub use recommender::Recommender;
pub use seen::{suppress_seen_items, SeenIndex};
pub use surface::ScoreSurface;
pub use tensor::{reconstruct_scores, Flattener, Reduction};
pub use topk::extract_topk;
pub use types::{ScoredItem, TopKMatrix, SENTINEL};
