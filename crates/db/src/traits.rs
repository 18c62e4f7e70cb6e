//! Trait definitions for the proof-request ledger.

use pylon_primitives::Bytes32;

use crate::types::{ProofRequestEntry, ProofRequestStatus, ProofRequestType};
use crate::DbResult;

/// Durable store of proof-request rows.  Every method is atomic; after a
/// crash the visible rows reflect exactly the last committed mutation.
///
/// Ids are assigned densely ascending at insert and never reused; rows are
/// never deleted.  Mutations on a single row are serialized by the store.
pub trait ProofRequestDatabase {
    /// Creates a new row in `Unrequested` with empty prover id and proof,
    /// returning its id.
    fn insert_request(
        &self,
        request_type: ProofRequestType,
        start_block: u64,
        end_block: u64,
        request_added_time: u64,
    ) -> DbResult<u64>;

    /// Gets a row by id, if present.
    fn get_request(&self, id: u64) -> DbResult<Option<ProofRequestEntry>>;

    /// Returns the `Unrequested` row with the lowest id, if any.
    fn next_unrequested(&self) -> DbResult<Option<(u64, ProofRequestEntry)>>;

    /// Counts rows currently in `status`.
    fn count_by_status(&self, status: ProofRequestStatus) -> DbResult<u64>;

    /// Rows that failed before the prover assigned an id.  These never
    /// reached the prover network, unlike prover-side failures.
    fn get_failed_on_server(&self) -> DbResult<Vec<(u64, ProofRequestEntry)>>;

    /// Rows in `Requested` with a prover id, i.e. in flight.
    fn get_all_pending(&self) -> DbResult<Vec<(u64, ProofRequestEntry)>>;

    /// Records the id the prover assigned to this request.
    fn set_prover_request_id(&self, id: u64, prover_request_id: &str) -> DbResult<()>;

    /// Applies a checked status transition.  `now` stamps
    /// `proof_request_time` when the target status is `Requested`.
    fn update_status(&self, id: u64, status: ProofRequestStatus, now: u64) -> DbResult<()>;

    /// Stores the proof blob and transitions to `Complete` in one step.
    /// Fails unless the row is currently `Requested` and the blob non-empty.
    fn add_proof(&self, id: u64, proof: Vec<u8>) -> DbResult<()>;

    /// Attaches the L1 checkpoint to the unrequested agg row covering
    /// exactly `[start_block, end_block]`, returning the updated row.
    fn attach_l1_checkpoint(
        &self,
        start_block: u64,
        end_block: u64,
        l1_block_number: u64,
        l1_block_hash: Bytes32,
    ) -> DbResult<ProofRequestEntry>;

    /// Ordered proof blobs of completed span rows tiling `[start, end]`
    /// exactly, no gap and no overlap.  Errors if no such tiling exists.
    fn get_consecutive_span_proofs(&self, start: u64, end: u64) -> DbResult<Vec<Vec<u8>>>;

    /// Walks completed span rows from `from`; if the contiguous run reaches
    /// at least `min_to`, inserts an `Unrequested` agg row covering the full
    /// run (stamped `now`) and returns its end block.
    fn try_create_agg_from_spans(&self, from: u64, min_to: u64, now: u64) -> DbResult<Option<u64>>;

    /// Highest `end_block` across span rows of any status, used to pick the
    /// next range to derive.
    fn get_latest_span_end(&self) -> DbResult<Option<u64>>;
}
