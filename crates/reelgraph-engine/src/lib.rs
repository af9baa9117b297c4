//! # reelgraph-engine
//!
//! The two interchangeable ranking engines over the ReelGraph store, the
//! orchestrator that drives them, and the offline evaluation harness:
//!
//! - [`walk`]: Monte Carlo random walk with restart (personalized PageRank
//!   approximation, seeded and reproducible)
//! - [`similarity`]: deterministic item–item scoring (Jaccard / weighted
//!   cosine over shared raters)
//! - [`recommend`]: engine selection, eligibility thresholds, seen-item
//!   exclusion, genre filtering, ranking, popularity fallback
//! - [`sampling`]: the weighted-categorical draw both stochastic choices use
//! - [`eval`]: train/test splits and ranking metrics (Precision@K, Recall@K,
//!   MAP@K, NDCG@K, hit rate, coverage)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod eval;
pub mod recommend;
pub mod sampling;
pub mod similarity;
pub mod walk;

pub use eval::{evaluate, split_per_user, EvalReport, SplitMode};
pub use recommend::{
    EngineKind, FindSimilarParams, RankedMovie, RecommendParams, Recommendation, Recommender,
};
pub use similarity::{Metric, SimilarityEngine};
pub use walk::{RandomWalkEngine, WalkParams};
