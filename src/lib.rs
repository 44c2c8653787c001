//! Relational joins over in-memory product and review snapshots.
//!
//! [`snapshot::Snapshot`] holds the records, [`query::Queries`] runs the named
//! join pipelines over it.

#![warn(missing_docs)]

/// Error taxonomy shared by snapshot loading and query execution.
pub mod error;
pub mod model;
pub mod query;
pub mod snapshot;

pub use error::{Error, Result};
