//! MovieLens-style CSV loading.
//!
//! `movies.csv` carries `movieId,title,genres` with genres pipe-separated
//! (the `(no genres listed)` sentinel passes through untouched; the graph
//! builder filters it). `ratings.csv` carries
//! `userId,movieId,rating,timestamp`.

use anyhow::{Context, Result};
use reelgraph_graph::{MovieRecord, RatingRecord};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "movieId")]
    movie_id: u32,
    title: String,
    genres: String,
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    #[serde(rename = "userId")]
    user_id: u32,
    #[serde(rename = "movieId")]
    movie_id: u32,
    rating: f32,
    timestamp: Option<i64>,
}

/// Loads the movie catalog, splitting each pipe-separated genre field.
pub fn load_movies(path: &Path) -> Result<Vec<MovieRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut movies = Vec::new();
    for row in reader.deserialize() {
        let row: MovieRow =
            row.with_context(|| format!("malformed movie row in {}", path.display()))?;
        movies.push(MovieRecord {
            movie_id: row.movie_id,
            title: row.title,
            genres: row
                .genres
                .split('|')
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }
    Ok(movies)
}

/// Loads the rating table.
pub fn load_ratings(path: &Path) -> Result<Vec<RatingRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut ratings = Vec::new();
    for row in reader.deserialize() {
        let row: RatingRow =
            row.with_context(|| format!("malformed rating row in {}", path.display()))?;
        ratings.push(RatingRecord {
            user_id: row.user_id,
            movie_id: row.movie_id,
            rating: row.rating,
            timestamp: row.timestamp,
        });
    }
    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_movies_splits_genres() {
        let file = write_csv(
            "movieId,title,genres\n\
             1,Toy Story (1995),Adventure|Animation|Comedy\n\
             2,Jumanji (1995),Adventure|Fantasy\n",
        );
        let movies = load_movies(file.path()).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].movie_id, 1);
        assert_eq!(movies[0].title, "Toy Story (1995)");
        assert_eq!(movies[0].genres, vec!["Adventure", "Animation", "Comedy"]);
    }

    #[test]
    fn test_load_movies_keeps_sentinel_label() {
        let file = write_csv("movieId,title,genres\n9,Oddity,(no genres listed)\n");
        let movies = load_movies(file.path()).unwrap();
        assert_eq!(movies[0].genres, vec!["(no genres listed)"]);
    }

    #[test]
    fn test_load_movies_quoted_title_with_comma() {
        let file = write_csv("movieId,title,genres\n3,\"Heat, The (1995)\",Action|Crime\n");
        let movies = load_movies(file.path()).unwrap();
        assert_eq!(movies[0].title, "Heat, The (1995)");
    }

    #[test]
    fn test_load_ratings() {
        let file = write_csv(
            "userId,movieId,rating,timestamp\n\
             1,1,4.0,964982703\n\
             1,3,4.5,964981247\n",
        );
        let ratings = load_ratings(file.path()).unwrap();
        assert_eq!(ratings.len(), 2);
        assert_eq!(ratings[0].user_id, 1);
        assert_eq!(ratings[1].rating, 4.5);
        assert_eq!(ratings[0].timestamp, Some(964982703));
    }

    #[test]
    fn test_load_ratings_malformed_row_fails() {
        let file = write_csv("userId,movieId,rating,timestamp\n1,not-a-number,4.0,0\n");
        assert!(load_ratings(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_fails_with_path_in_error() {
        let err = load_movies(Path::new("/nonexistent/movies.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/movies.csv"));
    }
}
