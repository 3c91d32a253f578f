//! Error types for the extraction pipeline.

use std::path::PathBuf;

/// Everything that can abort an extraction run.
///
/// Numeric corner cases (dark images, degenerate dimensions, zero-area regions) are not
/// errors; they are absorbed by the pipeline and produce a valid, possibly empty, report.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The input file is missing, unreadable, or in a format the decoder does not support.
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The in-memory pixel buffer does not match its declared dimensions.
    #[error("invalid image buffer: {0}")]
    InvalidImage(String),

    /// Failed to read a configuration file from disk.
    #[error("failed to read config: {0}")]
    ConfigRead(#[source] std::io::Error),

    /// Failed to parse JSON configuration content.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),

    /// A configuration value is outside its documented range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to write the JSON report.
    #[error("failed to write report: {0}")]
    Write(#[from] std::io::Error),

    /// A batch worker task panicked or was cancelled.
    #[error("batch worker failed: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, ExtractError>;
