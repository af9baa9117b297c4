//! Error types for reelgraph-core

use thiserror::Error;

/// Result type alias for ReelGraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the ReelGraph core
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// An edge referenced a node that has not been added to the graph.
    ///
    /// This is a loader bug (insertion ordering), not a runtime condition
    /// to recover from, so it is never caught internally.
    #[error("Node '{id}' does not exist; add it before connecting edges")]
    MissingNode {
        /// The identifier of the absent node.
        id: String,
    },

    /// A caller-supplied parameter was outside its valid range.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// What was wrong with the parameter.
        message: String,
    },
}

impl Error {
    /// Creates a [`Error::MissingNode`] for the given node id.
    pub fn missing_node(id: impl Into<String>) -> Self {
        Self::MissingNode { id: id.into() }
    }

    /// Creates an [`Error::InvalidParameter`] with the given message.
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}
