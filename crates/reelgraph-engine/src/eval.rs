//! Offline evaluation harness.
//!
//! Per-user train/test splits over the rating table, standard ranking
//! metrics, and an end-to-end evaluation loop that builds a train-only
//! graph and scores the recommender against held-out interactions:
//!
//! - Precision@K / Recall@K
//! - MAP@K (mean average precision)
//! - NDCG@K (binary gains)
//! - Hit rate (share of users with at least one hit)
//! - Coverage (share of the catalog ever recommended)

use crate::recommend::{RecommendParams, Recommender};
use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use reelgraph_core::ids::{movie_node_id, user_node_id};
use reelgraph_core::{Error, Result};
use reelgraph_graph::{build_graph, MovieRecord, RatingRecord};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// Train/test split
// ============================================================================

/// How held-out interactions are chosen per user.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SplitMode {
    /// Hold out each user's last `holdout` interactions by timestamp.
    LastOut {
        /// Interactions held out per user.
        holdout: usize,
    },
    /// Sample a fraction of each user's interactions at random.
    Random {
        /// Fraction held out, in (0, 1).
        test_frac: f64,
    },
}

/// Splits a rating table into train and test sets, per user.
///
/// Users with a single interaction contribute to train only, and at least
/// one interaction always stays in train, so every evaluated user has seeds
/// to recommend from.
pub fn split_per_user(
    ratings: &[RatingRecord],
    mode: SplitMode,
    seed: u64,
) -> Result<(Vec<RatingRecord>, Vec<RatingRecord>)> {
    if let SplitMode::Random { test_frac } = mode {
        if !(0.0..1.0).contains(&test_frac) || test_frac == 0.0 {
            return Err(Error::invalid_parameter("test_frac must be within (0, 1)"));
        }
    }

    let mut per_user: BTreeMap<u32, Vec<RatingRecord>> = BTreeMap::new();
    for rating in ratings {
        per_user.entry(rating.user_id).or_default().push(rating.clone());
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (_, mut records) in per_user {
        let n = records.len();
        if n <= 1 {
            train.extend(records);
            continue;
        }

        match mode {
            SplitMode::LastOut { holdout } => {
                records.sort_by_key(|r| r.timestamp.unwrap_or(i64::MIN));
                let held = holdout.clamp(1, n - 1);
                let split_at = n - held;
                test.extend(records.split_off(split_at));
                train.extend(records);
            }
            SplitMode::Random { test_frac } => {
                let held = ((n as f64 * test_frac).ceil() as usize).clamp(1, n - 1);
                let mut indices: Vec<usize> = (0..n).collect();
                indices.shuffle(&mut rng);
                let held_indices: HashSet<usize> = indices.into_iter().take(held).collect();
                for (i, record) in records.into_iter().enumerate() {
                    if held_indices.contains(&i) {
                        test.push(record);
                    } else {
                        train.push(record);
                    }
                }
            }
        }
    }

    Ok((train, test))
}

// ============================================================================
// Metrics @K
// ============================================================================

/// Share of the first `k` recommendations that are relevant.
pub fn precision_at_k(recommended: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let hits = recommended
        .iter()
        .take(k)
        .filter(|m| relevant.contains(*m))
        .count();
    hits as f64 / k as f64
}

/// Share of the relevant items found in the first `k` recommendations.
pub fn recall_at_k(recommended: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    let hits = recommended
        .iter()
        .take(k)
        .filter(|m| relevant.contains(*m))
        .count();
    hits as f64 / relevant.len() as f64
}

/// Average precision at `k` for one user.
pub fn average_precision_at_k(
    recommended: &[String],
    relevant: &HashSet<String>,
    k: usize,
) -> f64 {
    if relevant.is_empty() || k == 0 {
        return 0.0;
    }
    let mut hits = 0usize;
    let mut score = 0.0;
    for (rank, movie) in recommended.iter().take(k).enumerate() {
        if relevant.contains(movie) {
            hits += 1;
            score += hits as f64 / (rank + 1) as f64;
        }
    }
    score / relevant.len().min(k) as f64
}

/// Normalized discounted cumulative gain at `k`, with binary gains.
pub fn ndcg_at_k(recommended: &[String], relevant: &HashSet<String>, k: usize) -> f64 {
    let dcg: f64 = recommended
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, m)| relevant.contains(*m))
        .map(|(rank, _)| 1.0 / ((rank + 2) as f64).log2())
        .sum();
    let ideal: f64 = (0..relevant.len().min(k))
        .map(|rank| 1.0 / ((rank + 2) as f64).log2())
        .sum();
    if ideal == 0.0 {
        return 0.0;
    }
    dcg / ideal
}

// ============================================================================
// Evaluation loop
// ============================================================================

/// Aggregated offline evaluation results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    /// Users with held-out interactions that were evaluated.
    pub users_evaluated: usize,
    /// Users for whom the recommender produced a non-empty list.
    pub users_with_recs: usize,
    /// Mean Precision@K.
    pub precision: f64,
    /// Mean Recall@K.
    pub recall: f64,
    /// Mean average precision (MAP@K).
    pub map: f64,
    /// Mean NDCG@K.
    pub ndcg: f64,
    /// Share of users with at least one hit in their top-K.
    pub hit_rate: f64,
    /// Share of the catalog recommended to at least one user.
    pub coverage: f64,
}

/// Runs an offline evaluation: builds a graph from the train ratings only,
/// recommends `k` movies per test user, and aggregates ranking metrics
/// against that user's held-out interactions.
pub fn evaluate(
    movies: &[MovieRecord],
    train: &[RatingRecord],
    test: &[RatingRecord],
    k: usize,
    params: &RecommendParams,
    seed: u64,
) -> Result<EvalReport> {
    if k == 0 {
        return Err(Error::invalid_parameter("k must be >= 1"));
    }

    let (graph, _) = build_graph(movies, train)?;
    let mut recommender = Recommender::new(&graph, seed);

    let mut relevant_per_user: BTreeMap<u32, HashSet<String>> = BTreeMap::new();
    for rating in test {
        relevant_per_user
            .entry(rating.user_id)
            .or_default()
            .insert(movie_node_id(rating.movie_id));
    }

    let params = RecommendParams {
        top_n: k,
        ..params.clone()
    };

    let mut report = EvalReport::default();
    let mut recommended_overall: HashSet<String> = HashSet::new();
    let mut sums = (0.0, 0.0, 0.0, 0.0, 0.0); // precision, recall, map, ndcg, hits

    for (user_id, relevant) in &relevant_per_user {
        let recommendation =
            recommender.recommend_for_user(&user_node_id(*user_id), &params)?;
        let recommended: Vec<String> = recommendation
            .items
            .into_iter()
            .map(|item| item.movie_id)
            .collect();

        if !recommended.is_empty() {
            report.users_with_recs += 1;
            recommended_overall.extend(recommended.iter().cloned());
        }

        sums.0 += precision_at_k(&recommended, relevant, k);
        sums.1 += recall_at_k(&recommended, relevant, k);
        sums.2 += average_precision_at_k(&recommended, relevant, k);
        sums.3 += ndcg_at_k(&recommended, relevant, k);
        if recommended.iter().take(k).any(|m| relevant.contains(m)) {
            sums.4 += 1.0;
        }
        report.users_evaluated += 1;

        debug!("evaluated user {user_id}: {} relevant", relevant.len());
    }

    if report.users_evaluated > 0 {
        let n = report.users_evaluated as f64;
        report.precision = sums.0 / n;
        report.recall = sums.1 / n;
        report.map = sums.2 / n;
        report.ndcg = sums.3 / n;
        report.hit_rate = sums.4 / n;
    }
    if !movies.is_empty() {
        report.coverage = recommended_overall.len() as f64 / movies.len() as f64;
    }

    Ok(report)
}
