//! Error types for the core engine.

use thiserror::Error;

/// Problems building a jurisdiction table from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("invalid state code {0:?}: expected \"NN-Name\"")]
    InvalidStateCode(String),

    #[error("alias {alias:?} points at {target:?}, which is not a canonical state name")]
    UnknownAliasTarget { alias: String, target: String },

    #[error("alias keys must not be blank")]
    BlankAlias,
}

/// Why a batch cannot proceed without a supplier identifier from the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingSupplierId {
    /// No record in the batch carries a supplier identifier.
    #[error("all {records} records are missing the supplier GSTIN; supply one to continue")]
    AllMissing { records: usize },

    /// Some records lack one and the others disagree on which it should be.
    #[error(
        "{missing} records have no supplier GSTIN and the batch names {} different ones ({}); \
         fill them in and re-run",
        .distinct.len(),
        .distinct.join(", ")
    )]
    Ambiguous { missing: usize, distinct: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The caller must supply input before the batch can be processed.
    #[error("input required: {0}")]
    BlockingInputRequired(MissingSupplierId),

    #[error(transparent)]
    Table(#[from] TableError),
}
