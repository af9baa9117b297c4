//! Deterministic item–item similarity over shared raters.
//!
//! The engine derives three maps from the graph once at construction —
//! user → rated movies, movie → co-rater set, (user, movie) → rating — and
//! answers every query from those. Scores are deterministic; ties are broken
//! by movie id ascending so identical inputs always rank identically.

use reelgraph_core::ids;
use reelgraph_graph::{GraphData, Relation};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Similarity metric selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Set overlap of co-rater sets.
    #[default]
    Jaccard,
    /// Rating-weighted cosine over the co-rater intersection.
    Cosine,
}

/// The deterministic ranking engine.
pub struct SimilarityEngine {
    user_movies: HashMap<String, HashSet<String>>,
    movie_users: HashMap<String, HashSet<String>>,
    ratings: HashMap<(String, String), f64>,
}

impl SimilarityEngine {
    /// Derives the rater maps from the graph's adjacency.
    ///
    /// Parallel rating edges for the same (user, movie) pair keep the last
    /// rating seen, matching a re-rating interpretation.
    pub fn new(graph: &GraphData) -> Self {
        let mut user_movies: HashMap<String, HashSet<String>> = HashMap::new();
        let mut movie_users: HashMap<String, HashSet<String>> = HashMap::new();
        let mut ratings: HashMap<(String, String), f64> = HashMap::new();

        for node in graph.iter_nodes() {
            if !ids::is_user(&node.id) {
                continue;
            }
            for neighbor in graph.neighbors(&node.id) {
                if neighbor.relation != Relation::Rated || !ids::is_movie(&neighbor.id) {
                    continue;
                }
                user_movies
                    .entry(node.id.clone())
                    .or_default()
                    .insert(neighbor.id.clone());
                movie_users
                    .entry(neighbor.id.clone())
                    .or_default()
                    .insert(node.id.clone());
                ratings.insert(
                    (node.id.clone(), neighbor.id.clone()),
                    f64::from(neighbor.weight),
                );
            }
        }

        Self {
            user_movies,
            movie_users,
            ratings,
        }
    }

    /// The set of users who rated a movie (its co-rater set).
    pub fn co_raters(&self, movie: &str) -> Option<&HashSet<String>> {
        self.movie_users.get(movie)
    }

    /// The movies a user has rated, with their ratings.
    pub fn rated_by(&self, user: &str) -> Vec<(String, f64)> {
        let Some(movies) = self.user_movies.get(user) else {
            return Vec::new();
        };
        let mut out: Vec<(String, f64)> = movies
            .iter()
            .map(|m| {
                let rating = self
                    .ratings
                    .get(&(user.to_string(), m.clone()))
                    .copied()
                    .unwrap_or(1.0);
                (m.clone(), rating)
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Jaccard similarity of two movies' co-rater sets.
    ///
    /// `|A ∩ B| / |A ∪ B|`; 0.0 if either set is empty.
    pub fn jaccard(&self, movie_a: &str, movie_b: &str) -> f64 {
        let (Some(a), Some(b)) = (self.movie_users.get(movie_a), self.movie_users.get(movie_b))
        else {
            return 0.0;
        };
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        let intersection = a.intersection(b).count();
        if intersection == 0 {
            return 0.0;
        }
        let union = a.union(b).count();
        intersection as f64 / union as f64
    }

    /// Rating-weighted cosine similarity of two movies.
    ///
    /// Numerator over the co-rater intersection, denominators over each
    /// movie's full rater set; 0.0 if either denominator is zero.
    pub fn weighted_cosine(&self, movie_a: &str, movie_b: &str) -> f64 {
        let (Some(a), Some(b)) = (self.movie_users.get(movie_a), self.movie_users.get(movie_b))
        else {
            return 0.0;
        };

        let numerator: f64 = a
            .intersection(b)
            .map(|u| self.rating_of(u, movie_a) * self.rating_of(u, movie_b))
            .sum();
        if numerator == 0.0 {
            return 0.0;
        }

        let norm_a: f64 = a.iter().map(|u| self.rating_of(u, movie_a).powi(2)).sum();
        let norm_b: f64 = b.iter().map(|u| self.rating_of(u, movie_b).powi(2)).sum();
        let denominator = norm_a.sqrt() * norm_b.sqrt();
        if denominator == 0.0 {
            return 0.0;
        }
        numerator / denominator
    }

    /// Scores one candidate pair with the selected metric.
    pub fn score(&self, metric: Metric, movie_a: &str, movie_b: &str) -> f64 {
        match metric {
            Metric::Jaccard => self.jaccard(movie_a, movie_b),
            Metric::Cosine => self.weighted_cosine(movie_a, movie_b),
        }
    }

    /// Ranks the `k` movies most similar to a reference movie.
    ///
    /// Candidates are the movies co-rated by any rater of the reference
    /// (2-hop via user nodes), excluding the reference itself. Candidates
    /// with fewer than `min_co_raters` shared raters or a zero score are
    /// discarded. An unknown reference yields an empty result.
    pub fn top_k_similar(
        &self,
        movie: &str,
        k: usize,
        metric: Metric,
        min_co_raters: usize,
    ) -> Vec<(String, f64)> {
        let Some(raters) = self.movie_users.get(movie) else {
            return Vec::new();
        };

        let mut candidates: HashSet<&str> = HashSet::new();
        for user in raters {
            if let Some(rated) = self.user_movies.get(user) {
                candidates.extend(
                    rated
                        .iter()
                        .map(String::as_str)
                        .filter(|&other| other != movie),
                );
            }
        }

        let mut scored: Vec<(String, f64)> = Vec::new();
        for candidate in candidates {
            let shared = self
                .movie_users
                .get(candidate)
                .map(|users| raters.intersection(users).count())
                .unwrap_or(0);
            if shared < min_co_raters {
                continue;
            }
            let score = self.score(metric, movie, candidate);
            if score > 0.0 {
                scored.push((candidate.to_string(), score));
            }
        }

        sort_ranked(&mut scored);
        scored.truncate(k);
        scored
    }

    /// Top-N recommendations for a user by similarity aggregation.
    ///
    /// For every movie the user rated at or above `min_user_rating`, the
    /// seed's `top_k_similar` candidates accumulate
    /// `similarity × rating(user, seed)`; movies the user has already rated
    /// never appear. A user with no qualifying seeds yields an empty result
    /// (the orchestrator's fallback signal).
    pub fn recommend_by_aggregation(
        &self,
        user: &str,
        k_similar: usize,
        top_n: usize,
        metric: Metric,
        min_co_raters: usize,
        min_user_rating: f64,
    ) -> Vec<(String, f64)> {
        let seen: HashSet<&str> = self
            .user_movies
            .get(user)
            .map(|movies| movies.iter().map(String::as_str).collect())
            .unwrap_or_default();
        if seen.is_empty() {
            return Vec::new();
        }

        let mut accumulated: HashMap<String, f64> = HashMap::new();
        // Seeds in id order, so float accumulation order is reproducible.
        for (seed, rating) in self.rated_by(user) {
            if rating < min_user_rating {
                continue;
            }
            for (candidate, similarity) in
                self.top_k_similar(&seed, k_similar, metric, min_co_raters)
            {
                if seen.contains(candidate.as_str()) {
                    continue;
                }
                *accumulated.entry(candidate).or_insert(0.0) += similarity * rating;
            }
        }

        let mut ranked: Vec<(String, f64)> = accumulated.into_iter().collect();
        sort_ranked(&mut ranked);
        ranked.truncate(top_n);
        ranked
    }

    fn rating_of(&self, user: &str, movie: &str) -> f64 {
        self.ratings
            .get(&(user.to_string(), movie.to_string()))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Ranking order used everywhere: score descending, movie id ascending.
pub(crate) fn sort_ranked(items: &mut [(String, f64)]) {
    items.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
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

    /// The two-movie, two-user scenario: both users rated both movies.
    fn shared_raters_engine() -> SimilarityEngine {
        let movies = vec![
            movie(1, "One", &["Action"]),
            movie(2, "Two", &["Action", "Comedy"]),
        ];
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 3.0),
            rating(2, 1, 4.0),
            rating(2, 2, 4.5),
        ];
        let (graph, _) = build_graph(&movies, &ratings).unwrap();
        SimilarityEngine::new(&graph)
    }

    #[test]
    fn test_jaccard_identical_rater_sets() {
        let engine = shared_raters_engine();
        // Both raters shared, union size 2.
        assert_eq!(engine.jaccard("M1", "M2"), 1.0);
    }

    #[test]
    fn test_jaccard_symmetry_and_bounds() {
        let engine = shared_raters_engine();
        let ab = engine.jaccard("M1", "M2");
        let ba = engine.jaccard("M2", "M1");
        assert_eq!(ab, ba);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_jaccard_unknown_movie_is_zero() {
        let engine = shared_raters_engine();
        assert_eq!(engine.jaccard("M1", "M999"), 0.0);
    }

    #[test]
    fn test_cosine_symmetry() {
        let engine = shared_raters_engine();
        let ab = engine.weighted_cosine("M1", "M2");
        let ba = engine.weighted_cosine("M2", "M1");
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab > 0.0);
    }

    #[test]
    fn test_cosine_value() {
        let engine = shared_raters_engine();
        // num = 5*3 + 4*4.5 = 33; |M1| = sqrt(25+16); |M2| = sqrt(9+20.25)
        let expected = 33.0 / ((41.0f64).sqrt() * (29.25f64).sqrt());
        assert!((engine.weighted_cosine("M1", "M2") - expected).abs() < 1e-12);
    }

    #[test]
    fn test_top_k_similar_concrete_scenario() {
        let engine = shared_raters_engine();
        let similar = engine.top_k_similar("M1", 1, Metric::Jaccard, 1);
        assert_eq!(similar, vec![("M2".to_string(), 1.0)]);
    }

    #[test]
    fn test_top_k_similar_respects_min_co_raters() {
        let engine = shared_raters_engine();
        assert!(engine.top_k_similar("M1", 10, Metric::Jaccard, 3).is_empty());
    }

    #[test]
    fn test_top_k_similar_unknown_reference_empty() {
        let engine = shared_raters_engine();
        assert!(engine.top_k_similar("M999", 5, Metric::Jaccard, 1).is_empty());
    }

    #[test]
    fn test_top_k_ties_broken_by_id() {
        // U1 rates M1, M2, M3; U2 rates the same three. M2 and M3 tie as
        // neighbors of M1.
        let movies = vec![
            movie(1, "One", &[]),
            movie(2, "Two", &[]),
            movie(3, "Three", &[]),
        ];
        let ratings = vec![
            rating(1, 1, 4.0),
            rating(1, 2, 4.0),
            rating(1, 3, 4.0),
            rating(2, 1, 4.0),
            rating(2, 2, 4.0),
            rating(2, 3, 4.0),
        ];
        let (graph, _) = build_graph(&movies, &ratings).unwrap();
        let engine = SimilarityEngine::new(&graph);

        let similar = engine.top_k_similar("M1", 2, Metric::Jaccard, 1);
        let ids: Vec<&str> = similar.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["M2", "M3"]);
    }

    #[test]
    fn test_aggregation_excludes_seen_movies() {
        let movies = vec![
            movie(1, "One", &[]),
            movie(2, "Two", &[]),
            movie(3, "Three", &[]),
        ];
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(2, 1, 4.0),
            rating(2, 2, 4.0),
            rating(2, 3, 4.0),
            rating(3, 1, 4.0),
            rating(3, 2, 3.0),
        ];
        let (graph, _) = build_graph(&movies, &ratings).unwrap();
        let engine = SimilarityEngine::new(&graph);

        let recs = engine.recommend_by_aggregation("U1", 10, 10, Metric::Jaccard, 1, 4.0);
        assert!(!recs.is_empty());
        assert!(recs.iter().all(|(id, _)| id != "M1"));
    }

    #[test]
    fn test_aggregation_no_qualifying_seeds_is_empty() {
        let engine = shared_raters_engine();
        // U1's ratings are 5.0 and 3.0; a 5.5 threshold disqualifies both.
        let recs = engine.recommend_by_aggregation("U1", 10, 10, Metric::Jaccard, 1, 5.5);
        assert!(recs.is_empty());
    }

    #[test]
    fn test_aggregation_unknown_user_is_empty() {
        let engine = shared_raters_engine();
        assert!(engine
            .recommend_by_aggregation("U999", 10, 10, Metric::Jaccard, 1, 0.0)
            .is_empty());
    }

    proptest::proptest! {
        // Metric invariants over arbitrary small rating tables: symmetric,
        // bounded, and zero against an unknown movie.
        #[test]
        fn test_metrics_symmetric_and_bounded(
            table in proptest::collection::vec((1u32..=4, 1u32..=4, 1u8..=10), 1..24)
        ) {
            let movies: Vec<MovieRecord> =
                (1..=4).map(|i| movie(i, &format!("Movie {i}"), &[])).collect();
            let ratings: Vec<RatingRecord> = table
                .into_iter()
                .map(|(u, m, r)| rating(u, m, f32::from(r) * 0.5))
                .collect();
            let (graph, _) = build_graph(&movies, &ratings).unwrap();
            let engine = SimilarityEngine::new(&graph);

            for a in 1..=4u32 {
                for b in 1..=4u32 {
                    let (a, b) = (format!("M{a}"), format!("M{b}"));
                    for metric in [Metric::Jaccard, Metric::Cosine] {
                        let ab = engine.score(metric, &a, &b);
                        let ba = engine.score(metric, &b, &a);
                        proptest::prop_assert!((ab - ba).abs() < 1e-9);
                        proptest::prop_assert!((0.0..=1.0 + 1e-9).contains(&ab));
                    }
                    proptest::prop_assert_eq!(engine.score(Metric::Jaccard, &a, "M999"), 0.0);
                }
            }
        }
    }

    #[test]
    fn test_sort_ranked_order() {
        let mut items = vec![
            ("M3".to_string(), 0.5),
            ("M1".to_string(), 0.9),
            ("M2".to_string(), 0.5),
        ];
        sort_ranked(&mut items);
        let ids: Vec<&str> = items.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["M1", "M2", "M3"]);
    }
}
