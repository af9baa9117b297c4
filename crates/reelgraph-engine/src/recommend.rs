//! Recommendation orchestrator.
//!
//! Selects an engine, applies eligibility thresholds, excludes already-seen
//! movies, filters by genre, ranks and truncates, and falls back to a
//! global-popularity ranking when an engine yields nothing. The two entry
//! points are [`Recommender::find_similar`] and
//! [`Recommender::recommend_for_user`].

use crate::similarity::{sort_ranked, Metric, SimilarityEngine};
use crate::walk::{RandomWalkEngine, WalkParams, DEFAULT_RESTART_PROB_SIMILAR};
use log::debug;
use reelgraph_core::{ids, Error, Result};
use reelgraph_graph::{GraphData, GraphSummary, NodeKind, Relation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which ranking engine serves a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Monte Carlo random walk with restart (the default).
    #[default]
    RandomWalk,
    /// Deterministic item–item similarity.
    Similarity,
}

impl EngineKind {
    /// Returns the engine name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RandomWalk => "random-walk",
            Self::Similarity => "similarity",
        }
    }
}

/// Parameters for [`Recommender::find_similar`].
#[derive(Clone, Debug, PartialEq)]
pub struct FindSimilarParams {
    /// Engine selection.
    pub engine: EngineKind,
    /// Result list size (≥ 1).
    pub k: usize,
    /// Similarity metric (similarity engine only).
    pub metric: Metric,
    /// Minimum shared raters (similarity engine only).
    pub min_co_raters: usize,
    /// Walk parameters (random-walk engine only).
    pub walk: WalkParams,
}

impl Default for FindSimilarParams {
    fn default() -> Self {
        Self {
            engine: EngineKind::RandomWalk,
            k: 10,
            metric: Metric::Jaccard,
            min_co_raters: 3,
            walk: WalkParams {
                restart_prob: DEFAULT_RESTART_PROB_SIMILAR,
                ..WalkParams::default()
            },
        }
    }
}

/// Parameters for [`Recommender::recommend_for_user`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecommendParams {
    /// Engine selection.
    pub engine: EngineKind,
    /// Result list size (≥ 1).
    pub top_n: usize,
    /// Ratings below this do not qualify as preference seeds.
    pub min_user_rating: f64,
    /// Optional genre name; candidates outside it are dropped before
    /// ranking, and the popularity fallback is restricted to it.
    pub genre_filter: Option<String>,
    /// Similarity metric (similarity engine only).
    pub metric: Metric,
    /// Minimum shared raters (similarity engine only).
    pub min_co_raters: usize,
    /// Per-seed similar-list size for aggregation (similarity engine only).
    pub k_similar: usize,
    /// Walk parameters (random-walk engine only).
    pub walk: WalkParams,
}

impl Default for RecommendParams {
    fn default() -> Self {
        Self {
            engine: EngineKind::RandomWalk,
            top_n: 10,
            min_user_rating: 4.0,
            genre_filter: None,
            metric: Metric::Jaccard,
            min_co_raters: 3,
            k_similar: 20,
            walk: WalkParams::default(),
        }
    }
}

/// One ranked recommendation entry.
///
/// `score` is `None` for popularity-fallback entries: the score is
/// undefined there, not zero, so the marker never implies relevance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedMovie {
    /// Movie node id.
    pub movie_id: String,
    /// Engine score, or `None` for unscored fallback entries.
    pub score: Option<f64>,
}

/// A ranked recommendation list plus its ranking explanation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Ranked entries, best first.
    pub items: Vec<RankedMovie>,
    /// The engine that served the request.
    pub engine: EngineKind,
    /// Whether the popularity fallback produced the entries.
    pub fallback_used: bool,
}

/// The orchestrator: owns one engine of each kind over a shared, read-only
/// graph.
pub struct Recommender<'g> {
    graph: &'g GraphData,
    similarity: SimilarityEngine,
    walker: RandomWalkEngine,
}

impl<'g> Recommender<'g> {
    /// Creates a recommender over a built graph with a fixed root seed for
    /// the stochastic engine.
    pub fn new(graph: &'g GraphData, seed: u64) -> Self {
        Self {
            graph,
            similarity: SimilarityEngine::new(graph),
            walker: RandomWalkEngine::from_seed(seed),
        }
    }

    /// Diagnostic node/edge counts of the underlying graph.
    pub fn summary(&self) -> GraphSummary {
        self.graph.summary()
    }

    /// Ranks the movies most similar to a reference movie.
    ///
    /// Delegates to exactly one engine and returns its ranking directly; an
    /// unknown reference movie yields an empty list, and no fallback applies
    /// on this path.
    pub fn find_similar(
        &mut self,
        movie_id: &str,
        params: &FindSimilarParams,
    ) -> Result<Vec<(String, f64)>> {
        if params.k == 0 {
            return Err(Error::invalid_parameter("k must be >= 1"));
        }

        match params.engine {
            EngineKind::Similarity => Ok(self.similarity.top_k_similar(
                movie_id,
                params.k,
                params.metric,
                params.min_co_raters,
            )),
            EngineKind::RandomWalk => {
                let start = vec![(movie_id.to_string(), 1.0)];
                let scores = self.walker.scores(self.graph, &start, &params.walk)?;
                let mut ranked: Vec<(String, f64)> = scores
                    .into_iter()
                    .filter(|(id, _)| ids::is_movie(id) && id.as_str() != movie_id)
                    .collect();
                sort_ranked(&mut ranked);
                ranked.truncate(params.k);
                Ok(ranked)
            }
        }
    }

    /// Produces a ranked top-N list for a user.
    ///
    /// A user with no interactions yields an empty, non-fallback result. If
    /// the engine's (genre-filtered) candidate list comes up empty for a
    /// user who does have interactions, the genre-restricted popularity
    /// ranking takes over with unscored entries.
    pub fn recommend_for_user(
        &mut self,
        user_id: &str,
        params: &RecommendParams,
    ) -> Result<Recommendation> {
        if params.top_n == 0 {
            return Err(Error::invalid_parameter("top_n must be >= 1"));
        }

        let rated = self.similarity.rated_by(user_id);
        if rated.is_empty() {
            return Ok(Recommendation {
                items: Vec::new(),
                engine: params.engine,
                fallback_used: false,
            });
        }
        let seen: HashSet<&str> = rated.iter().map(|(id, _)| id.as_str()).collect();

        let mut candidates = match params.engine {
            EngineKind::Similarity => self.similarity.recommend_by_aggregation(
                user_id,
                params.k_similar,
                usize::MAX,
                params.metric,
                params.min_co_raters,
                params.min_user_rating,
            ),
            EngineKind::RandomWalk => {
                let mut seeds: Vec<(String, f64)> = rated
                    .iter()
                    .filter(|(_, rating)| *rating >= params.min_user_rating)
                    .cloned()
                    .collect();
                if seeds.is_empty() {
                    // No movie passed the threshold; widen to everything the
                    // user rated rather than giving up outright.
                    seeds = rated.clone();
                }
                let scores = self.walker.scores(self.graph, &seeds, &params.walk)?;
                scores
                    .into_iter()
                    .filter(|(id, _)| ids::is_movie(id) && !seen.contains(id.as_str()))
                    .collect()
            }
        };

        // Genre filtering happens before ranking and truncation, so a
        // filtered list is still top_n long whenever enough candidates
        // exist.
        if let Some(genre) = params.genre_filter.as_deref() {
            candidates.retain(|(id, _)| self.movie_in_genre(id, genre));
        }

        sort_ranked(&mut candidates);
        candidates.truncate(params.top_n);

        if candidates.is_empty() {
            debug!(
                "engine {} produced nothing for {user_id}; using popularity fallback",
                params.engine.name()
            );
            let popular = self.popularity(params.top_n, params.genre_filter.as_deref(), &seen);
            return Ok(Recommendation {
                items: popular
                    .into_iter()
                    .map(|movie_id| RankedMovie {
                        movie_id,
                        score: None,
                    })
                    .collect(),
                engine: params.engine,
                fallback_used: true,
            });
        }

        Ok(Recommendation {
            items: candidates
                .into_iter()
                .map(|(movie_id, score)| RankedMovie {
                    movie_id,
                    score: Some(score),
                })
                .collect(),
            engine: params.engine,
            fallback_used: false,
        })
    }

    /// Global popularity ranking: movies by interaction count, optionally
    /// genre-restricted, excluding movies the user has already rated.
    fn popularity(
        &self,
        top_n: usize,
        genre_filter: Option<&str>,
        seen: &HashSet<&str>,
    ) -> Vec<String> {
        let mut counts: Vec<(String, usize)> = self
            .graph
            .iter_nodes()
            .filter(|node| matches!(node.kind, NodeKind::Movie { .. }))
            .filter(|node| !seen.contains(node.id.as_str()))
            .filter(|node| {
                genre_filter
                    .map(|genre| self.movie_in_genre(&node.id, genre))
                    .unwrap_or(true)
            })
            .map(|node| {
                let interactions = self
                    .graph
                    .neighbors(&node.id)
                    .iter()
                    .filter(|n| n.relation == Relation::Rated)
                    .count();
                (node.id.clone(), interactions)
            })
            .filter(|(_, interactions)| *interactions > 0)
            .collect();

        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(top_n);
        counts.into_iter().map(|(id, _)| id).collect()
    }

    /// Whether a movie carries a membership edge to the named genre.
    fn movie_in_genre(&self, movie_id: &str, genre: &str) -> bool {
        self.graph
            .neighbors(movie_id)
            .iter()
            .filter(|n| n.relation == Relation::BelongsToGenre)
            .any(|n| {
                matches!(
                    self.graph.get_node(&n.id).map(|node| &node.kind),
                    Some(NodeKind::Genre { name }) if name.eq_ignore_ascii_case(genre)
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelgraph_graph::{build_graph, MovieRecord, RatingRecord};

    fn movie(id: u32, title: &str, genres: &[&str]) -> MovieRecord {
        MovieRecord {
            movie_id: id,
            title: title.to_string(),
            genres: genres.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn rating(user: u32, movie: u32, value: f32) -> RatingRecord {
        RatingRecord {
            user_id: user,
            movie_id: movie,
            rating: value,
            timestamp: None,
        }
    }

    fn sample_graph() -> GraphData {
        let movies = vec![
            movie(1, "One", &["Action"]),
            movie(2, "Two", &["Action", "Comedy"]),
            movie(3, "Three", &["Comedy"]),
            movie(4, "Four", &["Drama"]),
        ];
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 3.0),
            rating(2, 1, 4.0),
            rating(2, 2, 4.5),
            rating(2, 3, 2.0),
            rating(3, 2, 4.0),
            rating(3, 3, 5.0),
            rating(3, 4, 3.5),
        ];
        build_graph(&movies, &ratings).unwrap().0
    }

    #[test]
    fn test_find_similar_similarity_engine() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let params = FindSimilarParams {
            engine: EngineKind::Similarity,
            k: 1,
            min_co_raters: 1,
            ..FindSimilarParams::default()
        };
        let similar = recommender.find_similar("M1", &params).unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].0, "M2");
    }

    #[test]
    fn test_find_similar_unknown_movie_empty() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let similar = recommender
            .find_similar("M999", &FindSimilarParams::default())
            .unwrap();
        assert!(similar.is_empty());
    }

    #[test]
    fn test_find_similar_excludes_reference_and_non_movies() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let similar = recommender
            .find_similar("M2", &FindSimilarParams::default())
            .unwrap();
        assert!(!similar.is_empty());
        for (id, _) in &similar {
            assert_ne!(id, "M2");
            assert!(ids::is_movie(id));
        }
    }

    #[test]
    fn test_find_similar_zero_k_rejected() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let params = FindSimilarParams {
            k: 0,
            ..FindSimilarParams::default()
        };
        assert!(matches!(
            recommender.find_similar("M1", &params),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_recommend_unknown_user_empty_without_fallback() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let rec = recommender
            .recommend_for_user("U999", &RecommendParams::default())
            .unwrap();
        assert!(rec.items.is_empty());
        assert!(!rec.fallback_used);
    }

    #[test]
    fn test_recommend_never_returns_seen_movies() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let params = RecommendParams {
            min_user_rating: 4.0,
            ..RecommendParams::default()
        };
        let rec = recommender.recommend_for_user("U1", &params).unwrap();
        // U1 rated M1 and M2; neither may ever be recommended.
        for item in &rec.items {
            assert_ne!(item.movie_id, "M1");
            assert_ne!(item.movie_id, "M2");
        }
    }

    #[test]
    fn test_recommend_similarity_engine_scored() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let params = RecommendParams {
            engine: EngineKind::Similarity,
            min_co_raters: 1,
            min_user_rating: 4.0,
            ..RecommendParams::default()
        };
        let rec = recommender.recommend_for_user("U1", &params).unwrap();
        assert!(!rec.fallback_used);
        assert!(!rec.items.is_empty());
        assert!(rec.items.iter().all(|i| i.score.is_some()));
    }

    #[test]
    fn test_recommend_fallback_unscored_and_genre_restricted() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        // Similarity engine with an impossible co-rater threshold forces the
        // fallback; the Drama filter restricts it to M4.
        let params = RecommendParams {
            engine: EngineKind::Similarity,
            min_co_raters: 100,
            genre_filter: Some("Drama".to_string()),
            ..RecommendParams::default()
        };
        let rec = recommender.recommend_for_user("U1", &params).unwrap();
        assert!(rec.fallback_used);
        assert_eq!(rec.items.len(), 1);
        assert_eq!(rec.items[0].movie_id, "M4");
        assert_eq!(rec.items[0].score, None);
    }

    #[test]
    fn test_recommend_fallback_excludes_seen() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let params = RecommendParams {
            engine: EngineKind::Similarity,
            min_co_raters: 100,
            ..RecommendParams::default()
        };
        // U3 rated M2, M3, M4: only M1 is left for the fallback.
        let rec = recommender.recommend_for_user("U3", &params).unwrap();
        assert!(rec.fallback_used);
        assert_eq!(rec.items.len(), 1);
        assert_eq!(rec.items[0].movie_id, "M1");
    }

    #[test]
    fn test_recommend_genre_filter_selecting_nothing_yields_empty_fallback() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let params = RecommendParams {
            genre_filter: Some("Documentary".to_string()),
            ..RecommendParams::default()
        };
        let rec = recommender.recommend_for_user("U1", &params).unwrap();
        assert!(rec.fallback_used);
        assert!(rec.items.is_empty());
    }

    #[test]
    fn test_recommend_deterministic_with_fixed_seed() {
        let graph = sample_graph();
        let params = RecommendParams::default();

        let a = Recommender::new(&graph, 7)
            .recommend_for_user("U1", &params)
            .unwrap();
        let b = Recommender::new(&graph, 7)
            .recommend_for_user("U1", &params)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_recommend_zero_top_n_rejected() {
        let graph = sample_graph();
        let mut recommender = Recommender::new(&graph, 42);
        let params = RecommendParams {
            top_n: 0,
            ..RecommendParams::default()
        };
        assert!(recommender.recommend_for_user("U1", &params).is_err());
    }

    #[test]
    fn test_summary_passthrough() {
        let graph = sample_graph();
        let recommender = Recommender::new(&graph, 42);
        let summary = recommender.summary();
        assert_eq!(summary.users, 3);
        assert_eq!(summary.movies, 4);
        assert_eq!(summary.genres, 3);
    }
}
