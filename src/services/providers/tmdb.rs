//! TMDB (The Movie Database) v3 provider
//!
//! API Flow:
//! 1. Details: /movie/{id} → title, overview, vote average, genres, poster path
//! 2. Streaming: /movie/{id}/watch/providers → flat-rate providers per country
//!
//! Image paths returned by the API are relative; they are joined onto the
//! image CDN base with a size segment (w500 for posters, w200 for logos).

use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        tmdb::{TmdbMovie, TmdbWatchProviders},
        MovieDetails, MovieId, WatchProvider,
    },
    services::providers::{MetadataProvider, ERROR_IMAGE_PLACEHOLDER, NO_IMAGE_PLACEHOLDER},
};

const POSTER_SIZE: &str = "w500";
const LOGO_SIZE: &str = "w200";

/// Drops the request URL, which carries the API key, from a transport error
fn redact(error: reqwest::Error) -> AppError {
    AppError::HttpClient(error.without_url())
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
    language: String,
    region: String,
}

impl TmdbProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        image_url: String,
        language: String,
        region: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
            language,
            region,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_image_url.clone(),
            config.tmdb_language.clone(),
            config.watch_region.clone(),
            config.http_timeout(),
        )
    }

    /// Joins a relative TMDB image path onto the CDN base
    fn image(&self, size: &str, path: &str) -> String {
        format!("{}/{}/{}", self.image_url, size, path.trim_start_matches('/'))
    }

    fn poster_or_placeholder(&self, movie: &TmdbMovie) -> String {
        movie
            .poster()
            .map(|path| self.image(POSTER_SIZE, path))
            .unwrap_or_else(|| NO_IMAGE_PLACEHOLDER.to_string())
    }

    /// Sends a GET to the API and decodes the JSON body
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        movie_id: MovieId,
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!(
                "Movie {} not found on TMDB",
                movie_id
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                movie_id = %movie_id,
                status = %status,
                body = %body,
                "TMDB request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let response_text = response.text().await.map_err(redact)?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                movie_id = %movie_id,
                "Failed to deserialize TMDB response"
            );
            AppError::ExternalApi(format!("Failed to parse TMDB response: {}", e))
        })
    }

    async fn fetch_movie(&self, movie_id: MovieId) -> AppResult<TmdbMovie> {
        self.get_json(
            &format!("/movie/{}", movie_id),
            &[("language", self.language.as_str())],
            movie_id,
        )
        .await
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    #[tracing::instrument(skip_all, fields(movie_id = %movie_id, provider = "tmdb"))]
    async fn poster_url(&self, movie_id: MovieId) -> String {
        match self.fetch_movie(movie_id).await {
            Ok(movie) => self.poster_or_placeholder(&movie),
            Err(e) => {
                tracing::error!(movie_id = %movie_id, error = %e, "Error fetching poster");
                ERROR_IMAGE_PLACEHOLDER.to_string()
            }
        }
    }

    #[tracing::instrument(skip_all, fields(movie_id = %movie_id, provider = "tmdb"))]
    async fn movie_details(&self, movie_id: MovieId) -> AppResult<MovieDetails> {
        let (movie, streaming) =
            tokio::join!(self.fetch_movie(movie_id), self.watch_providers(movie_id));
        let movie = movie?;

        let streaming = streaming.unwrap_or_else(|e| {
            tracing::warn!(
                movie_id = %movie_id,
                error = %e,
                "Error fetching streaming providers, reporting none"
            );
            Vec::new()
        });

        tracing::info!(
            movie_id = %movie_id,
            providers = streaming.len(),
            provider = self.name(),
            "Movie details fetched"
        );

        Ok(MovieDetails {
            movie_id,
            poster_url: self.poster_or_placeholder(&movie),
            release_date: movie.parsed_release_date(),
            genres: movie.genre_names(),
            title: movie.title,
            overview: movie.overview,
            rating: movie.vote_average,
            streaming,
        })
    }

    #[tracing::instrument(skip_all, fields(movie_id = %movie_id, provider = "tmdb"))]
    async fn watch_providers(&self, movie_id: MovieId) -> AppResult<Vec<WatchProvider>> {
        let mut response: TmdbWatchProviders = self
            .get_json(&format!("/movie/{}/watch/providers", movie_id), &[], movie_id)
            .await?;

        let providers = response
            .results
            .remove(&self.region)
            .map(|region| {
                region
                    .flatrate
                    .into_iter()
                    .map(|p| WatchProvider {
                        logo_url: p.logo_path.as_deref().map(|path| self.image(LOGO_SIZE, path)),
                        name: p.provider_name,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(providers)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
