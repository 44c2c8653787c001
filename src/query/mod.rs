#![forbid(unsafe_code)]

//! Join and aggregation engine.
//!
//! Records flow through key extraction, a hash join, an optional
//! aggregation feeding a second join, and a final ordering step before being
//! projected into rows.

/// Key selectors, scalar and composite.
pub mod key;

/// Hash-based inner, left-outer, right-outer, and group joins.
///
/// Builds one lookup over the inner side and probes it with the outer side in
/// input order.
pub mod join;

/// Group-by and reductions (count, average, max).
pub mod aggregate;

/// Stable multi-key ordering with defaults for absent keys.
pub mod order;

/// Query execution engine.
///
/// Runs join phases under a cancel token, with profiling and tracing.
pub mod executor;

/// Named product/review queries.
pub mod catalog;

/// Serializable row shapes.
pub mod projection;

/// Performance profiling for query operations.
///
/// Collects timing and count statistics per pipeline phase.
pub mod profile;

pub use catalog::{Queries, QueryKind, QueryOptions, QueryOutput};
pub use executor::Executor;
pub use join::{Lookup, Match};
pub use order::{Direction, Orderer};
