use pylon_db::DbError;
use pylon_derivation::DerivationError;
use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum ProposerError {
    /// The retry policy cannot bisect a single-block span; something is
    /// deeply wrong with the prover or the range.
    #[error("cannot split failed single-block span proof [{0}, {1}]")]
    UnsplittableRange(u64, u64),

    #[error("agg request {0} reached the request path without an L1 checkpoint")]
    MissingCheckpoint(u64),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Derivation(#[from] DerivationError),

    #[error("client: {0}")]
    Client(#[from] anyhow::Error),
}
