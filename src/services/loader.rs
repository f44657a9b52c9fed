//! Loads the precomputed movie table and similarity matrix from disk
//!
//! Both artifacts are JSON. The movie table is accepted either as a list of
//! records or as the column-oriented mapping a dataframe produces with
//! `to_dict()`, where each column maps a row label to a value.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::Movie,
    services::similarity::SimilarityIndex,
};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MoviesArtifact {
    Records(Vec<MovieRecord>),
    Columns(MovieColumns),
}

#[derive(Debug, Deserialize)]
struct MovieRecord {
    movie_id: u64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct MovieColumns {
    movie_id: HashMap<String, u64>,
    title: HashMap<String, String>,
}

impl MovieColumns {
    /// Joins the two columns on their row labels, ordered numerically
    fn into_movies(self) -> Result<Vec<Movie>, String> {
        let ids = label_rows("movie_id", self.movie_id)?;
        let mut titles = label_rows("title", self.title)?;

        if ids.len() != titles.len() {
            return Err(format!(
                "movie_id column has {} rows but title column has {}",
                ids.len(),
                titles.len()
            ));
        }

        ids.into_iter()
            .map(|(label, movie_id)| {
                titles
                    .remove(&label)
                    .map(|title| Movie::new(movie_id, title))
                    .ok_or_else(|| format!("row {} has a movie_id but no title", label))
            })
            .collect()
    }
}

/// Keys one column by numeric row label; two labels naming the same row are rejected
fn label_rows<T>(column: &str, cells: HashMap<String, T>) -> Result<BTreeMap<u64, T>, String> {
    let mut rows = BTreeMap::new();
    for (label, value) in cells {
        let row = parse_label(&label)?;
        if rows.insert(row, value).is_some() {
            return Err(format!(
                "{} column has more than one label for row {}",
                column, row
            ));
        }
    }
    Ok(rows)
}

fn parse_label(label: &str) -> Result<u64, String> {
    label
        .parse::<u64>()
        .map_err(|_| format!("row label {:?} is not a non-negative integer", label))
}

fn open(path: &Path) -> AppResult<BufReader<File>> {
    File::open(path).map(BufReader::new).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            AppError::DataUnavailable(format!("required file is missing: {}", path.display()))
        } else {
            AppError::DataUnavailable(format!("cannot open {}: {}", path.display(), e))
        }
    })
}

/// Parses a movie table from any reader
pub fn parse_catalog<R: Read>(reader: R) -> AppResult<Vec<Movie>> {
    let artifact: MoviesArtifact = serde_json::from_reader(reader)
        .map_err(|e| AppError::DataUnavailable(format!("malformed movie table: {}", e)))?;

    match artifact {
        MoviesArtifact::Records(records) => Ok(records
            .into_iter()
            .map(|r| Movie::new(r.movie_id, r.title))
            .collect()),
        MoviesArtifact::Columns(columns) => columns
            .into_movies()
            .map_err(|e| AppError::DataUnavailable(format!("malformed movie table: {}", e))),
    }
}

/// Parses a similarity matrix from any reader
pub fn parse_matrix<R: Read>(reader: R) -> AppResult<Vec<Vec<f64>>> {
    serde_json::from_reader(reader)
        .map_err(|e| AppError::DataUnavailable(format!("malformed similarity matrix: {}", e)))
}

pub fn load_catalog(path: impl AsRef<Path>) -> AppResult<Vec<Movie>> {
    let path = path.as_ref();
    parse_catalog(open(path)?).map_err(|e| with_path(e, path))
}

pub fn load_matrix(path: impl AsRef<Path>) -> AppResult<Vec<Vec<f64>>> {
    let path = path.as_ref();
    parse_matrix(open(path)?).map_err(|e| with_path(e, path))
}

fn with_path(error: AppError, path: &Path) -> AppError {
    match error {
        AppError::DataUnavailable(msg) => {
            AppError::DataUnavailable(format!("{}: {}", path.display(), msg))
        }
        other => other,
    }
}

/// Loads both artifacts and builds the similarity index
pub fn load_index(
    movies_path: impl AsRef<Path>,
    similarity_path: impl AsRef<Path>,
) -> AppResult<SimilarityIndex> {
    let movies_path = movies_path.as_ref();
    let similarity_path = similarity_path.as_ref();

    let catalog = load_catalog(movies_path)?;
    tracing::info!(
        path = %movies_path.display(),
        movies = catalog.len(),
        "Loaded movie table"
    );

    let matrix = load_matrix(similarity_path)?;
    tracing::info!(
        path = %similarity_path.display(),
        rows = matrix.len(),
        "Loaded similarity matrix"
    );

    SimilarityIndex::new(catalog, matrix)
}
