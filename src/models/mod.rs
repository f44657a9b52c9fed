use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod tmdb;

/// TMDB identifier of a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog entry: one row of the precomputed movie table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
}

impl Movie {
    pub fn new(movie_id: u64, title: impl Into<String>) -> Self {
        Self {
            movie_id: MovieId(movie_id),
            title: title.into(),
        }
    }
}

/// One ranked entry produced by the similarity index
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Neighbor {
    /// Row of the neighbor in the catalog
    pub index: usize,
    pub movie_id: MovieId,
    pub title: String,
    pub score: f64,
}

/// A streaming service offering a movie on a flat-rate subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchProvider {
    pub name: String,
    pub logo_url: Option<String>,
}

/// Movie metadata assembled from TMDB
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub movie_id: MovieId,
    pub title: Option<String>,
    pub overview: Option<String>,
    /// Average vote on a 0-10 scale
    pub rating: Option<f64>,
    pub release_date: Option<NaiveDate>,
    pub genres: Vec<String>,
    pub poster_url: String,
    pub streaming: Vec<WatchProvider>,
}

/// A recommendation enriched with poster and metadata
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedMovie {
    /// 1-based position in the ranking
    pub rank: usize,
    pub movie_id: MovieId,
    pub title: String,
    pub score: f64,
    pub poster_url: String,
    pub details: Option<MovieDetails>,
}
