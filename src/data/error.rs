//! Error taxonomy of the data pipeline.

use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, DatasetError>;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    #[error("manifest schema error: {0}")]
    Schema(String),

    #[error("image {path} decoded to shape {actual:?}, expected {expected:?}")]
    DecodeShape {
        path: PathBuf,
        expected: [usize; 3],
        actual: [usize; 3],
    },

    #[error("image decode error at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("batch of {count} examples carries no labels")]
    MissingLabels { count: usize },

    #[error("invalid dataset options: {0}")]
    Config(String),
}
