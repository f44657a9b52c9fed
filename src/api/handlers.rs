use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Movie, MovieDetails, MovieId, RecommendedMovie},
    services::{
        accounts::{self, AccountForm, ACCOUNT_CREATED_MESSAGE},
        recommendations,
    },
};

use super::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 50;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub movies: usize,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct MoviesQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub title: String,
    pub k: Option<usize>,
    #[serde(default = "default_include_details")]
    pub include_details: bool,
}

fn default_include_details() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub query: String,
    pub recommendations: Vec<RecommendedMovie>,
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub username: String,
    pub message: &'static str,
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        movies: state.index.len(),
        loaded_at: state.index.loaded_at(),
    })
}

/// Lists catalog titles, optionally filtered by a search term
pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<MoviesQuery>,
) -> Json<Vec<Movie>> {
    let movies: Vec<Movie> = match params.q {
        Some(q) => state
            .index
            .search(&q, params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .into_iter()
            .cloned()
            .collect(),
        None => state.index.movies().to_vec(),
    };
    Json(movies)
}

/// Recommends movies similar to the requested title
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let k = request.k.unwrap_or(state.default_count);
    if k == 0 || k > state.max_count {
        return Err(AppError::InvalidInput(format!(
            "k must be between 1 and {}",
            state.max_count
        )));
    }

    tracing::info!(
        request_id = %request_id,
        title = %request.title,
        k,
        include_details = request.include_details,
        "Processing recommendation request"
    );

    let recommendations = recommendations::recommend(
        &state.index,
        state.provider.clone(),
        &request.title,
        k,
        request.include_details,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        results = recommendations.len(),
        "Recommendations completed"
    );

    Ok(Json(RecommendationResponse {
        query: request.title,
        recommendations,
    }))
}

/// Fetches TMDB metadata for a single movie
pub async fn movie_details(
    State(state): State<AppState>,
    Path(movie_id): Path<u64>,
) -> AppResult<Json<MovieDetails>> {
    let details = state.provider.movie_details(MovieId(movie_id)).await?;
    Ok(Json(details))
}

/// Validates a sign-up form without storing anything
pub async fn create_account(
    Json(form): Json<AccountForm>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let username = accounts::validate_account(&form)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    tracing::info!(username = %username, "Account form accepted");

    Ok((
        StatusCode::CREATED,
        Json(AccountResponse {
            username,
            message: ACCOUNT_CREATED_MESSAGE,
        }),
    ))
}
