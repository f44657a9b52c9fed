use std::sync::Arc;

use crate::services::{MetadataProvider, SimilarityIndex};

/// Shared application state
///
/// The similarity index is immutable after startup, so handlers share it
/// without locking.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<SimilarityIndex>,
    pub provider: Arc<dyn MetadataProvider>,
    /// Recommendation count used when a request does not specify one
    pub default_count: usize,
    pub max_count: usize,
}

impl AppState {
    pub fn new(
        index: Arc<SimilarityIndex>,
        provider: Arc<dyn MetadataProvider>,
        default_count: usize,
        max_count: usize,
    ) -> Self {
        Self {
            index,
            provider,
            default_count,
            max_count,
        }
    }
}
