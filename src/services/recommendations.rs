use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Neighbor, RecommendedMovie},
    services::{providers::MetadataProvider, similarity::SimilarityIndex},
};

/// Recommends the `k` movies most similar to `title`, enriched for display
///
/// Ranking comes from the similarity index; an unknown title fails with
/// `NotFound` before any metadata is fetched. Each recommendation is then
/// enriched in its own task. A metadata failure for one movie leaves that
/// entry without details instead of failing the whole request.
pub async fn recommend(
    index: &SimilarityIndex,
    provider: Arc<dyn MetadataProvider>,
    title: &str,
    k: usize,
    include_details: bool,
) -> AppResult<Vec<RecommendedMovie>> {
    let neighbors = index.rank_neighbors(title, k)?;

    tracing::info!(
        title = %title,
        requested = k,
        ranked = neighbors.len(),
        provider = provider.name(),
        "Ranked similar movies"
    );

    let mut tasks = Vec::with_capacity(neighbors.len());
    for (position, neighbor) in neighbors.into_iter().enumerate() {
        let provider = Arc::clone(&provider);
        let task = tokio::spawn(async move {
            enrich(provider.as_ref(), neighbor, position + 1, include_details).await
        });
        tasks.push(task);
    }

    let mut recommendations = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(recommended) => recommendations.push(recommended),
            Err(e) => {
                tracing::error!(error = %e, "Task join error");
                return Err(AppError::Internal(e.to_string()));
            }
        }
    }

    let missing_details = recommendations
        .iter()
        .filter(|r| include_details && r.details.is_none())
        .count();
    if missing_details > 0 {
        tracing::warn!(
            title = %title,
            missing_details,
            "Partial metadata fetch failure"
        );
    }

    Ok(recommendations)
}

async fn enrich(
    provider: &dyn MetadataProvider,
    neighbor: Neighbor,
    rank: usize,
    include_details: bool,
) -> RecommendedMovie {
    let details = if include_details {
        match provider.movie_details(neighbor.movie_id).await {
            Ok(details) => Some(details),
            Err(e) => {
                tracing::error!(
                    movie_id = %neighbor.movie_id,
                    error = %e,
                    "Error fetching movie details"
                );
                None
            }
        }
    } else {
        None
    };

    // Details already carry the poster; only look it up again when they are missing
    let poster_url = match &details {
        Some(details) => details.poster_url.clone(),
        None => provider.poster_url(neighbor.movie_id).await,
    };

    RecommendedMovie {
        rank,
        movie_id: neighbor.movie_id,
        title: neighbor.title,
        score: neighbor.score,
        poster_url,
        details,
    }
}
