//! Core graph types for ReelGraph.
//!
//! Wraps a petgraph `DiGraph` with an id → index lookup table. Undirected
//! edges are stored as two directed adjacency records with identical weight
//! and relation, which keeps the symmetry invariant enforced structurally.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use reelgraph_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Relation enum
// ============================================================================

/// Relation kinds for graph edges.
///
/// The two relations the recommender relies on are first-class variants;
/// anything else uses `Custom(String)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// A user rated a movie; the edge weight carries the rating.
    Rated,
    /// A movie belongs to a genre; weight is 1.0.
    BelongsToGenre,
    /// Domain-specific relation not covered above.
    Custom(String),
}

impl Relation {
    /// Returns the relation name as a string.
    pub fn name(&self) -> &str {
        match self {
            Self::Rated => "rated",
            Self::BelongsToGenre => "belongs-to-genre",
            Self::Custom(name) => name,
        }
    }
}

// ============================================================================
// Node types
// ============================================================================

/// Per-kind node attributes.
///
/// An explicit tagged variant rather than an open attribute bag: users carry
/// no extra data, movies a title, genres a name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A user node.
    User,
    /// A movie node with its display title.
    Movie {
        /// Human-readable movie title.
        title: String,
    },
    /// A genre node with its display name.
    Genre {
        /// Genre name, e.g. "Comedy".
        name: String,
    },
}

impl NodeKind {
    /// Returns the kind name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Movie { .. } => "movie",
            Self::Genre { .. } => "genre",
        }
    }
}

/// A node in the recommendation graph, uniquely keyed by its id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier (e.g. "U1", "M318", "G4").
    pub id: String,
    /// Kind plus kind-specific attributes.
    pub kind: NodeKind,
}

impl Node {
    /// Creates a user node.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::User,
        }
    }

    /// Creates a movie node with a title.
    pub fn movie(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Movie {
                title: title.into(),
            },
        }
    }

    /// Creates a genre node with a name.
    pub fn genre(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Genre { name: name.into() },
        }
    }

    /// The movie title, if this is a movie node.
    pub fn title(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Movie { title } => Some(title),
            _ => None,
        }
    }
}

// ============================================================================
// Edge types
// ============================================================================

/// An undirected edge between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// One endpoint node id.
    pub from: String,
    /// The other endpoint node id.
    pub to: String,
    /// Positive edge weight (a rating, or 1.0 for membership edges).
    pub weight: f32,
    /// Relation kind.
    pub relation: Relation,
}

impl Edge {
    /// Creates a new edge.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        weight: f32,
        relation: Relation,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            weight,
            relation,
        }
    }
}

/// One adjacency record as returned by [`GraphData::neighbors`].
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbor {
    /// The neighboring node id.
    pub id: String,
    /// Weight of the connecting edge.
    pub weight: f32,
    /// Relation kind of the connecting edge.
    pub relation: Relation,
}

// ============================================================================
// GraphSummary
// ============================================================================

/// Diagnostic node/edge counts for a built graph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    /// Number of user nodes.
    pub users: usize,
    /// Number of movie nodes.
    pub movies: usize,
    /// Number of genre nodes.
    pub genres: usize,
    /// Number of undirected edges.
    pub edges: usize,
}

// ============================================================================
// GraphData
// ============================================================================

/// The recommendation graph.
///
/// Multigraph semantics: adding the same node pair twice yields a parallel
/// edge (re-rating scenarios). There is no deletion or weight-update API —
/// correcting data means rebuilding the graph.
#[derive(Clone, Debug, Default)]
pub struct GraphData {
    graph: DiGraph<Node, Edge>,
    node_indices: HashMap<String, NodeIndex>,
}

impl GraphData {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of undirected edges.
    ///
    /// Each undirected edge is stored as two directed records.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count() / 2
    }

    /// Gets a node by id.
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.node_indices.get(id).map(|&idx| &self.graph[idx])
    }

    /// Checks whether a node exists.
    pub fn contains_node(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    /// Returns an iterator over all nodes.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_weights()
    }

    /// Adds a node to the graph. Idempotent: re-adding an existing id is a
    /// no-op and the attributes of the first insert win.
    pub fn add_node(&mut self, node: Node) {
        if self.node_indices.contains_key(&node.id) {
            return;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(id, idx);
    }

    /// Adds an undirected edge between two existing nodes.
    ///
    /// Fails with [`Error::MissingNode`] if either endpoint is absent, in
    /// which case the graph is left unmodified (no half-edge). Both directed
    /// adjacency records are inserted with identical weight and relation.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        let from_idx = self
            .node_indices
            .get(&edge.from)
            .copied()
            .ok_or_else(|| Error::missing_node(&edge.from))?;
        let to_idx = self
            .node_indices
            .get(&edge.to)
            .copied()
            .ok_or_else(|| Error::missing_node(&edge.to))?;

        let reversed = Edge {
            from: edge.to.clone(),
            to: edge.from.clone(),
            weight: edge.weight,
            relation: edge.relation.clone(),
        };
        self.graph.add_edge(from_idx, to_idx, edge);
        self.graph.add_edge(to_idx, from_idx, reversed);
        Ok(())
    }

    /// Returns the adjacency records of a node, in edge-insertion order.
    ///
    /// Unknown or isolated nodes yield an empty list, never an error. This
    /// is the single adjacency capability of the store; no component reads
    /// the internal representation directly.
    pub fn neighbors(&self, id: &str) -> Vec<Neighbor> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<Neighbor> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge_ref| {
                let edge = edge_ref.weight();
                Neighbor {
                    id: self.graph[edge_ref.target()].id.clone(),
                    weight: edge.weight,
                    relation: edge.relation.clone(),
                }
            })
            .collect();
        // petgraph iterates adjacency newest-first; present insertion order.
        out.reverse();
        out
    }

    /// Computes diagnostic per-kind node counts and the undirected edge count.
    pub fn summary(&self) -> GraphSummary {
        let mut summary = GraphSummary {
            edges: self.edge_count(),
            ..GraphSummary::default()
        };
        for node in self.iter_nodes() {
            match node.kind {
                NodeKind::User => summary.users += 1,
                NodeKind::Movie { .. } => summary.movies += 1,
                NodeKind::Genre { .. } => summary.genres += 1,
            }
        }
        summary
    }
}

// ============================================================================
// Tests
// ============================================================================
