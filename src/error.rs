use std::io;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building snapshots or running queries.
///
/// Join, aggregation, and ordering are total over a valid snapshot, so the
/// query path only fails on cancellation or on the boundary-level
/// [`Error::NotFound`] outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// Rating outside `1..=5`.
    #[error("rating must be between 1 and 5 (got {0})")]
    InvalidRating(u8),
    /// Negative, non-finite, or oversized price.
    #[error("price must be a finite non-negative amount (got {0})")]
    InvalidPrice(String),
    /// Two records in one collection share a primary key.
    #[error("duplicate {entity} id {id}")]
    DuplicateId {
        /// Collection that holds the duplicate.
        entity: &'static str,
        /// The repeated key.
        id: u32,
    },
    /// A specifically requested resource yielded nothing.
    #[error("{0}")]
    NotFound(String),
    /// Query name did not match any catalog entry.
    #[error("unknown query '{0}'")]
    UnknownQuery(String),
    /// The executor observed its cancel token.
    #[error("query cancelled")]
    Cancelled,
    /// Snapshot file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Snapshot file could not be decoded.
    #[error("snapshot decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidRating(_) => "InvalidRating",
            Error::InvalidPrice(_) => "InvalidPrice",
            Error::DuplicateId { .. } => "DuplicateId",
            Error::NotFound(_) => "NotFound",
            Error::UnknownQuery(_) => "UnknownQuery",
            Error::Cancelled => "Cancelled",
            Error::Io(_) => "Io",
            Error::Json(_) => "Json",
        }
    }

    /// Whether the error is the boundary "not found" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
