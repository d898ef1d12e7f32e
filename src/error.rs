//! Error type shared by the filters, the batch converter and the front-ends.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("filter produced no output for {name}")]
    NoOutput { name: String },

    #[error("failed to encode {path:?}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("invalid custom filter description: {0}")]
    CustomFilter(#[from] serde_json::Error),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}
