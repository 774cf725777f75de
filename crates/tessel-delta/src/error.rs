use thiserror::Error;

/// Errors produced while decoding deltas from their JSON shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeltaError {
    /// An op object carried none of `insert`, `retain` or `delete`.
    #[error("op has no insert, retain or delete")]
    EmptyOp,

    /// An op object carried more than one of `insert`, `retain` or `delete`.
    #[error("op has more than one of insert, retain or delete")]
    AmbiguousOp,

    /// An embed insert was not a single-key object.
    #[error("invalid embed insert: {0}")]
    InvalidEmbed(String),
}
