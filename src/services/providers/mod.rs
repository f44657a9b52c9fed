use crate::{
    error::AppResult,
    models::{MovieDetails, MovieId, WatchProvider},
};

pub mod tmdb;

/// Poster shown when a movie has no poster on record
pub const NO_IMAGE_PLACEHOLDER: &str =
    "https://via.placeholder.com/500x750?text=No+Image+Available";

/// Poster shown when the poster lookup itself failed
pub const ERROR_IMAGE_PLACEHOLDER: &str =
    "https://via.placeholder.com/500x750?text=Error+Fetching+Image";

/// Source of posters, metadata and streaming availability for movies
///
/// Keyed by the TMDB movie id stored in the catalog. Implementations are
/// shared between request handlers behind an `Arc`.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Full poster URL for a movie
    ///
    /// Never fails: a missing poster yields [`NO_IMAGE_PLACEHOLDER`] and a
    /// failed lookup yields [`ERROR_IMAGE_PLACEHOLDER`].
    async fn poster_url(&self, movie_id: MovieId) -> String;

    /// Title, overview, rating, release date, genres and streaming providers
    async fn movie_details(&self, movie_id: MovieId) -> AppResult<MovieDetails>;

    /// Flat-rate streaming providers in the configured region
    async fn watch_providers(&self, movie_id: MovieId) -> AppResult<Vec<WatchProvider>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
