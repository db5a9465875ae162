//! Error types for the conversion pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate a conversion run.
///
/// Every variant is terminal. The pipeline writes its output exactly once at
/// the end of the run, so none of these leave a partial file at the final
/// output path.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("expected a top-level JSON array, found '{found}'")]
    NotAnArray { found: char },

    #[error("malformed JSON array: {0}")]
    Malformed(String),

    #[error("field `{field}` is not a number: {value}")]
    NumericField { field: String, value: String },

    #[error("no records produced from input")]
    EmptyResult,

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
