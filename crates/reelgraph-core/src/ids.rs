//! Node-identifier scheme.
//!
//! Every graph node is keyed by a string of the form `<prefix><integer>`:
//! `U1` for users, `M318` for movies, `G4` for genres. The numeric part is
//! the external id from the source tables (user id, movie id, or the genre
//! index assigned by the graph builder).

/// Prefix for user node ids.
pub const USER_PREFIX: char = 'U';
/// Prefix for movie node ids.
pub const MOVIE_PREFIX: char = 'M';
/// Prefix for genre node ids.
pub const GENRE_PREFIX: char = 'G';

/// Builds a user node id, e.g. `user_node_id(7) == "U7"`.
pub fn user_node_id(user_id: u32) -> String {
    format!("{USER_PREFIX}{user_id}")
}

/// Builds a movie node id, e.g. `movie_node_id(318) == "M318"`.
pub fn movie_node_id(movie_id: u32) -> String {
    format!("{MOVIE_PREFIX}{movie_id}")
}

/// Builds a genre node id, e.g. `genre_node_id(4) == "G4"`.
pub fn genre_node_id(genre_id: u32) -> String {
    format!("{GENRE_PREFIX}{genre_id}")
}

/// Whether the id names a user node.
pub fn is_user(id: &str) -> bool {
    id.starts_with(USER_PREFIX)
}

/// Whether the id names a movie node.
pub fn is_movie(id: &str) -> bool {
    id.starts_with(MOVIE_PREFIX)
}

/// Whether the id names a genre node.
pub fn is_genre(id: &str) -> bool {
    id.starts_with(GENRE_PREFIX)
}

/// Extracts the numeric part of a node id with the given prefix.
///
/// Returns `None` if the prefix does not match or the remainder is not a
/// valid integer.
///
/// # Examples
///
/// ```
/// use reelgraph_core::ids::{numeric_part, MOVIE_PREFIX};
///
/// assert_eq!(numeric_part("M318", MOVIE_PREFIX), Some(318));
/// assert_eq!(numeric_part("U318", MOVIE_PREFIX), None);
/// assert_eq!(numeric_part("Mabc", MOVIE_PREFIX), None);
/// ```
pub fn numeric_part(id: &str, prefix: char) -> Option<u32> {
    id.strip_prefix(prefix)?.parse().ok()
}
