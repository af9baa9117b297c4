//! # reelgraph-graph
//!
//! Graph store for ReelGraph: an in-memory, undirected, weighted multigraph
//! over users, movies, and genres, plus the builder that constructs it from
//! a movie catalog and a rating table.
//!
//! The store owns nodes and adjacency and nothing else — all scoring logic
//! lives in `reelgraph-engine`. Once built, a graph is treated as read-only
//! for the duration of a query session; corrections are made by rebuilding
//! from scratch.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod types;

pub use builder::{build_graph, extract_genres, BuildStats, MovieRecord, RatingRecord};
pub use types::{Edge, GraphData, GraphSummary, Neighbor, Node, NodeKind, Relation};
