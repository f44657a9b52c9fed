use std::collections::hash_map::Entry;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, Neighbor},
};

/// Movie catalog paired with its precomputed pairwise similarity matrix
///
/// Built once at startup and shared read-only between requests. Row `i` of the
/// matrix holds the similarity of catalog entry `i` to every other entry.
#[derive(Debug)]
pub struct SimilarityIndex {
    catalog: Vec<Movie>,
    /// Row-major N x N scores
    scores: Vec<f64>,
    by_title: HashMap<String, usize>,
    by_id: HashMap<MovieId, usize>,
    loaded_at: DateTime<Utc>,
}

impl SimilarityIndex {
    /// Validates the catalog and matrix and builds the lookup tables
    ///
    /// The matrix must be square with one row per catalog entry and contain only
    /// finite scores. Duplicate titles are kept; the first occurrence owns the
    /// title and later ones stay reachable through their movie id.
    pub fn new(catalog: Vec<Movie>, matrix: Vec<Vec<f64>>) -> AppResult<Self> {
        let n = catalog.len();

        if n == 0 {
            return Err(AppError::DataUnavailable(
                "movie catalog is empty".to_string(),
            ));
        }

        if matrix.len() != n {
            return Err(AppError::DataUnavailable(format!(
                "similarity matrix has {} rows but the catalog has {} movies",
                matrix.len(),
                n
            )));
        }

        // Shape and values are checked before the flat buffer is allocated
        for (i, row) in matrix.iter().enumerate() {
            if row.len() != n {
                return Err(AppError::DataUnavailable(format!(
                    "similarity matrix row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            if let Some(j) = row.iter().position(|s| !s.is_finite()) {
                return Err(AppError::DataUnavailable(format!(
                    "similarity matrix entry ({}, {}) is not a finite number",
                    i, j
                )));
            }
        }

        let cells = n.checked_mul(n).ok_or_else(|| {
            AppError::DataUnavailable(format!("similarity matrix of {} rows is too large", n))
        })?;
        let mut scores = Vec::with_capacity(cells);
        for row in matrix {
            scores.extend(row);
        }

        let mut by_title = HashMap::with_capacity(n);
        let mut by_id = HashMap::with_capacity(n);
        let mut duplicate_titles = 0usize;

        for (index, movie) in catalog.iter().enumerate() {
            match by_title.entry(movie.title.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(index);
                }
                Entry::Occupied(first) => {
                    duplicate_titles += 1;
                    tracing::warn!(
                        title = %movie.title,
                        first_index = *first.get(),
                        duplicate_index = index,
                        movie_id = %movie.movie_id,
                        "Duplicate title in catalog, title lookups resolve to the first occurrence"
                    );
                }
            }
            by_id.entry(movie.movie_id).or_insert(index);
        }

        tracing::info!(
            movies = n,
            duplicate_titles,
            "Similarity index built"
        );

        Ok(Self {
            catalog,
            scores,
            by_title,
            by_id,
            loaded_at: Utc::now(),
        })
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// All catalog entries in catalog order
    pub fn movies(&self) -> &[Movie] {
        &self.catalog
    }

    /// Catalog titles in catalog order, duplicates included
    pub fn titles(&self) -> impl Iterator<Item = &str> + '_ {
        self.catalog.iter().map(|movie| movie.title.as_str())
    }

    /// Row index of the first movie whose title matches exactly
    pub fn resolve(&self, title: &str) -> Option<usize> {
        self.by_title.get(title).copied()
    }

    /// Row index of the first movie with the given id
    pub fn resolve_id(&self, movie_id: MovieId) -> Option<usize> {
        self.by_id.get(&movie_id).copied()
    }

    /// Similarity of movie `i` to every catalog entry
    fn row(&self, i: usize) -> &[f64] {
        let n = self.catalog.len();
        &self.scores[i * n..(i + 1) * n]
    }

    /// Returns the `k` movies most similar to `title`, best first
    ///
    /// The queried movie itself is never part of the result. Fewer than `k`
    /// entries come back when the catalog is smaller than `k + 1`.
    pub fn rank_neighbors(&self, title: &str, k: usize) -> AppResult<Vec<Neighbor>> {
        let i = self.resolve(title).ok_or_else(|| {
            AppError::NotFound(format!("Movie not found in the dataset: {}", title))
        })?;
        Ok(self.neighbors_of(i, k))
    }

    /// Same as [`rank_neighbors`](Self::rank_neighbors), keyed by movie id
    pub fn rank_neighbors_by_id(&self, movie_id: MovieId, k: usize) -> AppResult<Vec<Neighbor>> {
        let i = self.resolve_id(movie_id).ok_or_else(|| {
            AppError::NotFound(format!("Movie id not found in the dataset: {}", movie_id))
        })?;
        Ok(self.neighbors_of(i, k))
    }

    fn neighbors_of(&self, i: usize, k: usize) -> Vec<Neighbor> {
        let mut ranked: Vec<(usize, f64)> = self.row(i).iter().copied().enumerate().collect();

        // Stable sort: equal scores keep ascending column order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        ranked
            .into_iter()
            .filter(|&(j, _)| j != i)
            .take(k)
            .map(|(j, score)| {
                let movie = &self.catalog[j];
                Neighbor {
                    index: j,
                    movie_id: movie.movie_id,
                    title: movie.title.clone(),
                    score,
                }
            })
            .collect()
    }

    /// Case-insensitive title search
    ///
    /// Titles starting with the query come first, then titles containing it
    /// elsewhere; both groups stay in catalog order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Movie> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.catalog.iter().take(limit).collect();
        }

        let mut prefix = Vec::new();
        let mut infix = Vec::new();
        for movie in &self.catalog {
            let haystack = movie.title.to_lowercase();
            if haystack.starts_with(&needle) {
                prefix.push(movie);
            } else if haystack.contains(&needle) {
                infix.push(movie);
            }
        }

        prefix.extend(infix);
        prefix.truncate(limit);
        prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio_test::{assert_err, assert_ok};

    /// A, B, C, D with A's row = [1.0, 0.9, 0.5, 0.1]
    fn abcd_index() -> SimilarityIndex {
        let catalog = vec![
            Movie::new(1, "A"),
            Movie::new(2, "B"),
            Movie::new(3, "C"),
            Movie::new(4, "D"),
        ];
        let matrix = vec![
            vec![1.0, 0.9, 0.5, 0.1],
            vec![0.9, 1.0, 0.3, 0.2],
            vec![0.5, 0.3, 1.0, 0.7],
            vec![0.1, 0.2, 0.7, 1.0],
        ];
        SimilarityIndex::new(catalog, matrix).unwrap()
    }

    fn titles(neighbors: &[Neighbor]) -> Vec<&str> {
        neighbors.iter().map(|n| n.title.as_str()).collect()
    }

    #[test]
    fn test_top_two_for_a() {
        let index = abcd_index();
        let result = index.rank_neighbors("A", 2).unwrap();
        assert_eq!(titles(&result), vec!["B", "C"]);
        assert_eq!(result[0].score, 0.9);
        assert_eq!(result[1].score, 0.5);
        assert_eq!(result[0].movie_id, MovieId(2));
    }

    #[test]
    fn test_k_larger_than_catalog_returns_all_others() {
        let index = abcd_index();
        let result = index.rank_neighbors("A", 10).unwrap();
        assert_eq!(titles(&result), vec!["B", "C", "D"]);
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let index = abcd_index();
        let result = index.rank_neighbors("Z", 2);
        assert_err!(&result);
        match result {
            Err(AppError::NotFound(msg)) => assert!(msg.contains("Z")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_title_match_is_exact() {
        let index = abcd_index();
        assert_err!(index.rank_neighbors("a", 2));
        assert_err!(index.rank_neighbors(" A", 2));
    }

    #[test]
    fn test_k_zero_returns_empty() {
        let index = abcd_index();
        let result = index.rank_neighbors("A", 0);
        assert_ok!(&result);
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_self_excluded_and_order_non_increasing_for_every_row() {
        let index = abcd_index();
        for (i, movie) in index.movies().iter().enumerate() {
            let result = index.rank_neighbors(&movie.title, 3).unwrap();
            assert_eq!(result.len(), 3);
            assert!(result.iter().all(|n| n.index != i));
            assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
        }
    }

    #[test]
    fn test_self_excluded_when_tied_at_maximum() {
        // Row 0 has another entry equal to the self score, and it comes first
        let catalog = vec![Movie::new(1, "X"), Movie::new(2, "Y"), Movie::new(3, "Z")];
        let matrix = vec![
            vec![1.0, 1.0, 0.2],
            vec![1.0, 1.0, 0.4],
            vec![0.2, 0.4, 1.0],
        ];
        let index = SimilarityIndex::new(catalog, matrix).unwrap();

        let result = index.rank_neighbors("Y", 2).unwrap();
        assert_eq!(titles(&result), vec!["X", "Z"]);

        let result = index.rank_neighbors("X", 1).unwrap();
        assert_eq!(titles(&result), vec!["Y"]);
    }

    #[test]
    fn test_ties_resolve_by_catalog_order() {
        let catalog = vec![
            Movie::new(1, "Q"),
            Movie::new(2, "R"),
            Movie::new(3, "S"),
            Movie::new(4, "T"),
        ];
        let matrix = vec![
            vec![1.0, 0.5, 0.5, 0.5],
            vec![0.5, 1.0, 0.0, 0.0],
            vec![0.5, 0.0, 1.0, 0.0],
            vec![0.5, 0.0, 0.0, 1.0],
        ];
        let index = SimilarityIndex::new(catalog, matrix).unwrap();

        let first = index.rank_neighbors("Q", 2).unwrap();
        let second = index.rank_neighbors("Q", 2).unwrap();
        assert_eq!(titles(&first), vec!["R", "S"]);

        let a: HashSet<_> = first.iter().map(|n| n.index).collect();
        let b: HashSet<_> = second.iter().map(|n| n.index).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_movie_catalog_has_no_neighbors() {
        let index = SimilarityIndex::new(vec![Movie::new(1, "Solo")], vec![vec![1.0]]).unwrap();
        let result = index.rank_neighbors("Solo", 8).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_duplicate_titles_resolve_to_first() {
        let catalog = vec![
            Movie::new(10, "The Host"),
            Movie::new(11, "Other"),
            Movie::new(12, "The Host"),
        ];
        let matrix = vec![
            vec![1.0, 0.8, 0.1],
            vec![0.8, 1.0, 0.6],
            vec![0.1, 0.6, 1.0],
        ];
        let index = SimilarityIndex::new(catalog, matrix).unwrap();

        assert_eq!(index.resolve("The Host"), Some(0));
        assert_eq!(index.resolve_id(MovieId(12)), Some(2));

        let by_title = index.rank_neighbors("The Host", 1).unwrap();
        assert_eq!(by_title[0].movie_id, MovieId(11));

        let by_id = index.rank_neighbors_by_id(MovieId(12), 2).unwrap();
        assert_eq!(by_id[0].movie_id, MovieId(11));
        assert_eq!(by_id[1].movie_id, MovieId(10));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let index = abcd_index();
        assert!(matches!(
            index.rank_neighbors_by_id(MovieId(99), 2),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_rejects_empty_catalog() {
        let result = SimilarityIndex::new(vec![], vec![]);
        assert!(matches!(result, Err(AppError::DataUnavailable(_))));
    }

    #[test]
    fn test_rejects_row_count_mismatch() {
        let catalog = vec![Movie::new(1, "A"), Movie::new(2, "B")];
        let result = SimilarityIndex::new(catalog, vec![vec![1.0, 0.5]]);
        assert!(matches!(result, Err(AppError::DataUnavailable(_))));
    }

    #[test]
    fn test_rejects_ragged_matrix() {
        let catalog = vec![Movie::new(1, "A"), Movie::new(2, "B")];
        let result = SimilarityIndex::new(catalog, vec![vec![1.0, 0.5], vec![0.5]]);
        assert!(matches!(result, Err(AppError::DataUnavailable(_))));
    }

    #[test]
    fn test_rejects_short_rows_for_large_catalog() {
        let n = 100_000;
        let catalog: Vec<Movie> = (0..n as u64).map(|id| Movie::new(id, id.to_string())).collect();
        let matrix = vec![Vec::new(); n];

        match SimilarityIndex::new(catalog, matrix) {
            Err(AppError::DataUnavailable(msg)) => assert!(msg.contains("row 0 has 0 columns")),
            other => panic!("expected DataUnavailable, got {:?}", other.map(|i| i.len())),
        }
    }

    #[test]
    fn test_keeps_full_precision_scores() {
        // Distinct as f64, equal once narrowed to f32
        let catalog = vec![Movie::new(1, "A"), Movie::new(2, "B"), Movie::new(3, "C")];
        let matrix = vec![
            vec![1.0, 0.300_000_000_1, 0.300_000_000_2],
            vec![0.300_000_000_1, 1.0, 0.0],
            vec![0.300_000_000_2, 0.0, 1.0],
        ];
        let index = SimilarityIndex::new(catalog, matrix).unwrap();

        let result = index.rank_neighbors("A", 2).unwrap();
        assert_eq!(titles(&result), vec!["C", "B"]);
        assert_eq!(result[0].score, 0.300_000_000_2);
    }

    #[test]
    fn test_titles_in_catalog_order() {
        let index = abcd_index();
        let listed: Vec<&str> = index.titles().collect();
        assert_eq!(listed, vec!["A", "B", "C", "D"]);
        assert_eq!(index.movies().len(), 4);
    }

    #[test]
    fn test_rejects_non_finite_scores() {
        let catalog = vec![Movie::new(1, "A"), Movie::new(2, "B")];
        let result = SimilarityIndex::new(catalog, vec![vec![1.0, f64::NAN], vec![0.5, 1.0]]);
        match result {
            Err(AppError::DataUnavailable(msg)) => assert!(msg.contains("(0, 1)")),
            other => panic!("expected DataUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_search_prefers_prefix_matches() {
        let catalog = vec![
            Movie::new(1, "The Dark Knight"),
            Movie::new(2, "Dark Shadows"),
            Movie::new(3, "Avatar"),
            Movie::new(4, "Darkman"),
        ];
        let matrix = vec![vec![0.0; 4]; 4];
        let index = SimilarityIndex::new(catalog, matrix).unwrap();

        let found: Vec<&str> = index
            .search("dark", 10)
            .iter()
            .map(|m| m.title.as_str())
            .collect();
        assert_eq!(found, vec!["Dark Shadows", "Darkman", "The Dark Knight"]);

        assert_eq!(index.search("DARK", 1).len(), 1);
        assert!(index.search("zzz", 10).is_empty());
        assert_eq!(index.search("  ", 2).len(), 2);
    }
}
