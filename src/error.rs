// ⚠️ Error Types
// Typed failures for every stage of the map pipeline

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapError>;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Boundary provider error: {0}")]
    Provider(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Invalid identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: String },

    #[error("Column {column:?} not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Invalid metric value {value:?} on line {line}")]
    InvalidValue { value: String, line: usize },

    #[error("Duplicate metric rows for tracts: {}", .ids.join(", "))]
    DuplicateTractIds { ids: Vec<String> },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl MapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MapError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<reqwest::Error> for MapError {
    fn from(err: reqwest::Error) -> Self {
        MapError::Http(err.to_string())
    }
}

impl From<geojson::Error> for MapError {
    fn from(err: geojson::Error) -> Self {
        MapError::Geometry(err.to_string())
    }
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Config(err.to_string())
    }
}
