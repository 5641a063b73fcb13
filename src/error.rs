//! Error type shared by the aggregator, the stats log and the pipeline.

use thiserror::Error;

/// Errors produced by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid font file {path}: {reason}")]
    Font { path: String, reason: String },

    #[error("invalid track row {line}: {reason}")]
    TrackRow { line: u64, reason: String },

    /// An observation arrived after the log was finalized.
    #[error("aggregator is finalized")]
    Finalized,

    #[error("aggregator was already finalized")]
    AlreadyFinalized,
}

pub type Result<T> = std::result::Result<T, Error>;
