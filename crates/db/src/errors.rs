use rockbound::CodecError;
use thiserror::Error;

use crate::types::ProofRequestStatus;

/// Simple result type used across the ledger interface.
pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("no proof request with id {0}")]
    EntryNotFound(u64),

    #[error("invalid status transition {0:?} -> {1:?} for request {2}")]
    InvalidStatusTransition(ProofRequestStatus, ProofRequestStatus, u64),

    /// Raised by `add_proof` when the row is not in the requested state, and
    /// when a completing proof arrives empty.
    #[error("cannot attach proof to request {0} in status {1:?}")]
    ProofNotAttachable(u64, ProofRequestStatus),

    #[error("no completed span proofs tiling [{0}, {1}]")]
    MissingSpanProof(u64, u64),

    #[error("no unrequested agg request covering [{0}, {1}]")]
    AggRequestNotFound(u64, u64),

    #[error("rocksdb: {0}")]
    Rocksdb(#[from] rockbound::rocksdb::Error),

    #[error("transaction: {0}")]
    TransactionError(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for DbError {
    fn from(value: anyhow::Error) -> Self {
        Self::Other(value.to_string())
    }
}

impl From<CodecError> for DbError {
    fn from(value: CodecError) -> Self {
        Self::Other(value.to_string())
    }
}
