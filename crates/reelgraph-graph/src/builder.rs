//! Graph construction from catalog and rating tables.
//!
//! Two-phase build, so edges never reference a missing node:
//!
//! 1. Genre nodes, from the catalog's distinct genre labels (sorted, so
//!    genre ids are stable across rebuilds).
//! 2. Movie nodes plus movie→genre membership edges.
//! 3. Rating edges; user nodes are created lazily, the first time an
//!    interaction referencing that user is processed.
//!
//! Rebuilding for train/test evaluation constructs a brand-new graph from a
//! filtered rating table — a published graph is never mutated.

use crate::types::{Edge, GraphData, Node, Relation};
use log::{debug, info};
use reelgraph_core::ids::{genre_node_id, movie_node_id, user_node_id};
use reelgraph_core::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::collections::HashMap;

/// Sentinel "no category" label in the MovieLens catalog. Filtered out, not
/// treated as a real genre.
pub const NO_GENRES_LABEL: &str = "(no genres listed)";

// ============================================================================
// Input record types
// ============================================================================

/// One movie-catalog record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    /// External movie id.
    pub movie_id: u32,
    /// Display title.
    pub title: String,
    /// Genre labels, already split (the sentinel label may still appear).
    pub genres: Vec<String>,
}

/// One interaction record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    /// External user id.
    pub user_id: u32,
    /// External movie id; must exist in the catalog.
    pub movie_id: u32,
    /// Positive rating value, carried as the edge weight.
    pub rating: f32,
    /// Optional interaction timestamp (seconds), used by evaluation splits.
    pub timestamp: Option<i64>,
}

/// Statistics from a graph build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Genre nodes created.
    pub genres: usize,
    /// Movie nodes created.
    pub movies: usize,
    /// User nodes created (lazily).
    pub users: usize,
    /// Movie→genre membership edges created.
    pub genre_edges: usize,
    /// User→movie rating edges created.
    pub rating_edges: usize,
}

// ============================================================================
// Build functions
// ============================================================================

/// Extracts the sorted distinct genre labels from a catalog, excluding the
/// sentinel label and empty strings.
pub fn extract_genres(movies: &[MovieRecord]) -> Vec<String> {
    let distinct: BTreeSet<&str> = movies
        .iter()
        .flat_map(|m| m.genres.iter())
        .map(String::as_str)
        .filter(|g| !g.is_empty() && *g != NO_GENRES_LABEL)
        .collect();
    distinct.into_iter().map(str::to_string).collect()
}

/// Builds a recommendation graph from a movie catalog and a rating table.
///
/// A rating referencing a movie absent from the catalog propagates
/// [`reelgraph_core::Error::MissingNode`]: that is an insertion-ordering bug
/// in the caller, not a condition to recover from.
pub fn build_graph(
    movies: &[MovieRecord],
    ratings: &[RatingRecord],
) -> Result<(GraphData, BuildStats)> {
    let mut graph = GraphData::new();
    let mut stats = BuildStats::default();

    // Phase 1: genre nodes.
    let genre_labels = extract_genres(movies);
    let mut genre_ids: HashMap<&str, String> = HashMap::new();
    for (i, label) in genre_labels.iter().enumerate() {
        let node_id = genre_node_id(i as u32);
        graph.add_node(Node::genre(node_id.clone(), label.clone()));
        genre_ids.insert(label.as_str(), node_id);
        stats.genres += 1;
    }

    // Phase 2: movie nodes and membership edges.
    for movie in movies {
        let movie_node = movie_node_id(movie.movie_id);
        graph.add_node(Node::movie(movie_node.clone(), movie.title.clone()));
        stats.movies += 1;

        for genre in &movie.genres {
            let Some(genre_node) = genre_ids.get(genre.as_str()) else {
                continue; // sentinel or empty label
            };
            graph.add_edge(Edge::new(
                movie_node.clone(),
                genre_node.clone(),
                1.0,
                Relation::BelongsToGenre,
            ))?;
            stats.genre_edges += 1;
        }
    }

    // Phase 3: rating edges, users created lazily.
    for rating in ratings {
        let user_node = user_node_id(rating.user_id);
        let movie_node = movie_node_id(rating.movie_id);

        if !graph.contains_node(&user_node) {
            graph.add_node(Node::user(user_node.clone()));
            stats.users += 1;
        }

        graph.add_edge(Edge::new(
            user_node,
            movie_node,
            rating.rating,
            Relation::Rated,
        ))?;
        stats.rating_edges += 1;
    }

    info!(
        "graph built: {} users, {} movies, {} genres, {} edges",
        stats.users,
        stats.movies,
        stats.genres,
        stats.genre_edges + stats.rating_edges
    );
    debug!("genre labels: {genre_labels:?}");

    Ok((graph, stats))
}

// ============================================================================
// Tests
// ============================================================================
