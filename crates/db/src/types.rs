// Module for ledger local types

use borsh::{BorshDeserialize, BorshSerialize};
use pylon_primitives::Bytes32;

use crate::errors::{DbError, DbResult};

/// The two kinds of proofs the proposer tracks: span proofs over a contiguous
/// L2 block range, and aggregate proofs compressing a run of span proofs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ProofRequestType {
    Span,
    Agg,
}

/// Lifecycle status of a proof request.
///
/// ## State Transitions
///
/// - `Unrequested` -> `Requested`: when the request is sent to the prover.
/// - `Requested` -> `Complete`: when the proof comes back fulfilled.
/// - Any state -> `Failed`: if the request fails at any point.
///
/// `Complete` and `Failed` are terminal per row; failed work is inherited by
/// fresh `Unrequested` successor rows, never by mutating the failed row back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ProofRequestStatus {
    Unrequested,
    Requested,
    Complete,
    Failed,
}

impl ProofRequestStatus {
    /// Attempts to transition the current status to `target`, returning the
    /// id-annotated error on an invalid edge.
    pub fn transition(&mut self, target: ProofRequestStatus, id: u64) -> DbResult<()> {
        let valid = matches!(
            (*self, target),
            (_, ProofRequestStatus::Failed)
                | (ProofRequestStatus::Unrequested, ProofRequestStatus::Requested)
                | (ProofRequestStatus::Requested, ProofRequestStatus::Complete)
        );

        if valid {
            *self = target;
            Ok(())
        } else {
            Err(DbError::InvalidStatusTransition(*self, target, id))
        }
    }
}

/// A single proof request row.  Rows are append-only; status and the
/// prover-assigned fields are the only things that ever change.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ProofRequestEntry {
    pub request_type: ProofRequestType,
    /// Inclusive L2 block range covered by the proof.
    pub start_block: u64,
    pub end_block: u64,
    pub status: ProofRequestStatus,
    /// Id assigned by the external prover; empty until assignment.
    pub prover_request_id: String,
    /// Unix seconds when the row was created.
    pub request_added_time: u64,
    /// Unix seconds when the row transitioned to `Requested`; 0 otherwise.
    pub proof_request_time: u64,
    /// L1 checkpoint for agg requests; unset until checkpointed.
    pub l1_block_number: u64,
    pub l1_block_hash: Option<Bytes32>,
    /// Proof blob; non-empty iff `status == Complete`.
    pub proof: Vec<u8>,
}

impl ProofRequestEntry {
    pub fn new(
        request_type: ProofRequestType,
        start_block: u64,
        end_block: u64,
        request_added_time: u64,
    ) -> Self {
        Self {
            request_type,
            start_block,
            end_block,
            status: ProofRequestStatus::Unrequested,
            prover_request_id: String::new(),
            request_added_time,
            proof_request_time: 0,
            l1_block_number: 0,
            l1_block_hash: None,
            proof: Vec::new(),
        }
    }

    /// Failed before the prover ever assigned an id, as opposed to failing
    /// on the prover's side.
    pub fn is_failed_on_server(&self) -> bool {
        self.status == ProofRequestStatus::Failed && self.prover_request_id.is_empty()
    }

    /// In flight against the prover.
    pub fn is_pending(&self) -> bool {
        self.status == ProofRequestStatus::Requested && !self.prover_request_id.is_empty()
    }
}
