//! Random walk with restart.
//!
//! Monte Carlo approximation of personalized PageRank restricted to a seed
//! set: walks step across edges with probability proportional to edge
//! weight, occasionally teleporting back to the start distribution, and the
//! normalized visit tally is the relevance score.
//!
//! The engine owns an explicit [`ChaCha8Rng`] — no global random state —
//! so a fixed seed reproduces the exact ranking.

use crate::sampling::WeightedSampler;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use reelgraph_core::{Error, Result};
use reelgraph_graph::GraphData;
use std::collections::HashMap;

/// Default number of walks.
pub const DEFAULT_NUM_WALKS: usize = 1000;
/// Default number of steps per walk.
pub const DEFAULT_WALK_LENGTH: usize = 10;
/// Default restart probability for user-recommendation mode (wide
/// exploration).
pub const DEFAULT_RESTART_PROB_USER: f64 = 0.15;
/// Default restart probability for item-similarity mode (local
/// exploration, biased to stay near the reference movie).
pub const DEFAULT_RESTART_PROB_SIMILAR: f64 = 0.30;

/// Parameters of a walk simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WalkParams {
    /// Number of independent walks (≥ 1).
    pub num_walks: usize,
    /// Steps per walk (≥ 1); each step records one visit.
    pub walk_length: usize,
    /// Probability of teleporting back to the start distribution, in [0, 1].
    pub restart_prob: f64,
}

impl Default for WalkParams {
    fn default() -> Self {
        Self {
            num_walks: DEFAULT_NUM_WALKS,
            walk_length: DEFAULT_WALK_LENGTH,
            restart_prob: DEFAULT_RESTART_PROB_USER,
        }
    }
}

impl WalkParams {
    /// Fails fast on out-of-range parameters; the engine never clamps.
    pub fn validate(&self) -> Result<()> {
        if self.num_walks == 0 {
            return Err(Error::invalid_parameter("num_walks must be >= 1"));
        }
        if self.walk_length == 0 {
            return Err(Error::invalid_parameter("walk_length must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.restart_prob) || self.restart_prob.is_nan() {
            return Err(Error::invalid_parameter(
                "restart_prob must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// The stochastic ranking engine.
pub struct RandomWalkEngine {
    rng: ChaCha8Rng,
}

impl RandomWalkEngine {
    /// Creates an engine with a fixed root seed (reproducible rankings).
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates an engine seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Simulates walks from the given start distribution and returns the
    /// visit frequency per visited node, normalized to sum to 1.
    ///
    /// `start` pairs node ids with positive start weights; the distribution
    /// is normalized once, not per walk. Start entries naming nodes absent
    /// from the graph are dropped; an empty start set (or one that is empty
    /// after dropping) yields an empty map with zero walks executed.
    pub fn scores(
        &mut self,
        graph: &GraphData,
        start: &[(String, f64)],
        params: &WalkParams,
    ) -> Result<HashMap<String, f64>> {
        params.validate()?;
        for (id, weight) in start {
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(Error::invalid_parameter(format!(
                    "start weight for '{id}' must be a positive real"
                )));
            }
        }

        let start: Vec<&(String, f64)> = start
            .iter()
            .filter(|(id, _)| graph.contains_node(id))
            .collect();
        if start.is_empty() {
            return Ok(HashMap::new());
        }

        let start_weights: Vec<f64> = start.iter().map(|(_, w)| *w).collect();
        // The start sampler is built once per call and reused by every
        // restart draw. `start` is non-empty here, so construction succeeds.
        let start_sampler = WeightedSampler::new(&start_weights)
            .ok_or_else(|| Error::invalid_parameter("start distribution is empty"))?;

        // Adjacency is read through `neighbors` only; cache the per-node
        // distribution on first visit so repeated steps don't rebuild it.
        let mut adjacency: HashMap<String, Option<(Vec<String>, WeightedSampler)>> = HashMap::new();

        let mut visits: HashMap<String, u64> = HashMap::new();
        let mut total_visits: u64 = 0;

        for _ in 0..params.num_walks {
            let mut current = start[start_sampler.sample(&mut self.rng)].0.clone();

            for _ in 0..params.walk_length {
                *visits.entry(current.clone()).or_insert(0) += 1;
                total_visits += 1;

                if self.rng.gen::<f64>() < params.restart_prob {
                    current = start[start_sampler.sample(&mut self.rng)].0.clone();
                    continue;
                }

                let entry = adjacency
                    .entry(current.clone())
                    .or_insert_with(|| neighbor_distribution(graph, &current));
                match entry {
                    Some((ids, sampler)) => {
                        current = ids[sampler.sample(&mut self.rng)].clone();
                    }
                    // Dead end: implicit restart.
                    None => {
                        current = start[start_sampler.sample(&mut self.rng)].0.clone();
                    }
                }
            }
        }

        let total = total_visits as f64;
        Ok(visits
            .into_iter()
            .map(|(id, count)| (id, count as f64 / total))
            .collect())
    }
}

/// Builds the weighted neighbor distribution for one node, or `None` for a
/// node with no edges. A neighbor set whose total weight is zero still
/// samples (uniformly, via the sampler's fallback) rather than dividing by
/// zero.
fn neighbor_distribution(
    graph: &GraphData,
    id: &str,
) -> Option<(Vec<String>, WeightedSampler)> {
    let neighbors = graph.neighbors(id);
    if neighbors.is_empty() {
        return None;
    }
    let weights: Vec<f64> = neighbors.iter().map(|n| f64::from(n.weight)).collect();
    let sampler = WeightedSampler::new(&weights)?;
    let ids = neighbors.into_iter().map(|n| n.id).collect();
    Some((ids, sampler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgraph_graph::{build_graph, MovieRecord, RatingRecord};

    fn sample_graph() -> GraphData {
        let movies = vec![
            MovieRecord {
                movie_id: 1,
                title: "One".into(),
                genres: vec!["Action".into()],
            },
            MovieRecord {
                movie_id: 2,
                title: "Two".into(),
                genres: vec!["Action".into(), "Comedy".into()],
            },
            MovieRecord {
                movie_id: 3,
                title: "Three".into(),
                genres: vec!["Comedy".into()],
            },
        ];
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 3.0),
            rating(2, 1, 4.0),
            rating(2, 2, 4.5),
            rating(2, 3, 2.0),
        ];
        build_graph(&movies, &ratings).unwrap().0
    }

    fn rating(user: u32, movie: u32, value: f32) -> RatingRecord {
        RatingRecord {
            user_id: user,
            movie_id: movie,
            rating: value,
            timestamp: None,
        }
    }

    #[test]
    fn test_params_validation() {
        assert!(WalkParams::default().validate().is_ok());
        assert!(WalkParams {
            num_walks: 0,
            ..WalkParams::default()
        }
        .validate()
        .is_err());
        assert!(WalkParams {
            walk_length: 0,
            ..WalkParams::default()
        }
        .validate()
        .is_err());
        assert!(WalkParams {
            restart_prob: 1.5,
            ..WalkParams::default()
        }
        .validate()
        .is_err());
        assert!(WalkParams {
            restart_prob: -0.1,
            ..WalkParams::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_scores_normalized() {
        let graph = sample_graph();
        let mut engine = RandomWalkEngine::from_seed(42);
        let scores = engine
            .scores(
                &graph,
                &[("M1".to_string(), 1.0)],
                &WalkParams {
                    num_walks: 200,
                    walk_length: 5,
                    restart_prob: 0.3,
                },
            )
            .unwrap();

        let sum: f64 = scores.values().sum();
        assert!((sum - 1.0).abs() < 1e-9, "scores sum to {sum}");
        assert!(scores.values().all(|&s| s > 0.0));
    }

    #[test]
    fn test_empty_start_short_circuits() {
        let graph = sample_graph();
        let mut engine = RandomWalkEngine::from_seed(42);
        let scores = engine.scores(&graph, &[], &WalkParams::default()).unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_unknown_start_nodes_dropped() {
        let graph = sample_graph();
        let mut engine = RandomWalkEngine::from_seed(42);
        let scores = engine
            .scores(
                &graph,
                &[("M999".to_string(), 1.0)],
                &WalkParams::default(),
            )
            .unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn test_nonpositive_start_weight_rejected() {
        let graph = sample_graph();
        let mut engine = RandomWalkEngine::from_seed(42);
        let result = engine.scores(
            &graph,
            &[("M1".to_string(), 0.0)],
            &WalkParams::default(),
        );
        assert!(matches!(
            result,
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_isolated_start_node_gets_all_visits() {
        let mut graph = GraphData::new();
        graph.add_node(reelgraph_graph::Node::movie("M1", "Lonely"));
        let mut engine = RandomWalkEngine::from_seed(7);
        // Every step dead-ends and implicitly restarts to M1.
        let scores = engine
            .scores(
                &graph,
                &[("M1".to_string(), 1.0)],
                &WalkParams {
                    num_walks: 10,
                    walk_length: 4,
                    restart_prob: 0.0,
                },
            )
            .unwrap();
        assert_eq!(scores.len(), 1);
        assert!((scores["M1"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_scores() {
        let graph = sample_graph();
        let params = WalkParams {
            num_walks: 100,
            walk_length: 8,
            restart_prob: 0.15,
        };
        let start = vec![("U1".to_string(), 1.0)];

        let a = RandomWalkEngine::from_seed(11)
            .scores(&graph, &start, &params)
            .unwrap();
        let b = RandomWalkEngine::from_seed(11)
            .scores(&graph, &start, &params)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_full_restart_stays_near_start() {
        let graph = sample_graph();
        let mut engine = RandomWalkEngine::from_seed(5);
        // restart_prob 1.0 teleports on every step, so only start nodes are
        // ever visited.
        let scores = engine
            .scores(
                &graph,
                &[("M1".to_string(), 1.0), ("M2".to_string(), 3.0)],
                &WalkParams {
                    num_walks: 100,
                    walk_length: 5,
                    restart_prob: 1.0,
                },
            )
            .unwrap();
        assert!(scores.keys().all(|id| id == "M1" || id == "M2"));
        assert!(scores["M2"] > scores["M1"]);
    }
}
