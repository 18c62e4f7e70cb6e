//! Narrow read-only client interfaces the derivation pipeline consumes.
//! Concrete RPC clients are injected by the binary.

use alloy_primitives::Address;
use async_trait::async_trait;
use pylon_primitives::Bytes32;

/// L2 output as reported by the rollup node, reduced to the fields the
/// deriver reads.
#[derive(Clone, Debug)]
pub struct OutputAtBlock {
    pub l2_block_number: u64,
    pub l1_origin_number: u64,
}

#[derive(Clone, Debug)]
pub struct SyncStatus {
    pub finalized_l2: u64,
}

#[derive(Clone, Debug)]
pub struct L1Transaction {
    pub from: Address,
    pub to: Option<Address>,
    pub input: Vec<u8>,
    pub blob_versioned_hashes: Vec<Bytes32>,
}

#[derive(Clone, Debug)]
pub struct L1BlockInfo {
    pub number: u64,
    pub timestamp: u64,
    pub hash: Bytes32,
    pub transactions: Vec<L1Transaction>,
}

#[derive(Clone, Debug)]
pub struct BlobSidecar {
    pub index: u64,
    pub blob: Vec<u8>,
}

#[async_trait]
pub trait RollupClient: Sync + Send + 'static {
    /// Corresponds to `optimism_outputAtBlock`.
    async fn output_at_block(&self, block_num: u64) -> anyhow::Result<OutputAtBlock>;

    /// Corresponds to `optimism_syncStatus`.
    async fn sync_status(&self) -> anyhow::Result<SyncStatus>;
}

#[async_trait]
pub trait L1Client: Sync + Send + 'static {
    /// Fetches the block at given height with full transactions.
    async fn block_by_number(&self, number: u64) -> anyhow::Result<L1BlockInfo>;
}

#[async_trait]
pub trait BeaconClient: Sync + Send + 'static {
    async fn get_version(&self) -> anyhow::Result<String>;

    async fn genesis_time(&self) -> anyhow::Result<u64>;

    /// Fetches only the requested blob sidecars for the slot, never the full
    /// set.
    async fn fetch_sidecars(&self, slot: u64, indices: &[u64]) -> anyhow::Result<Vec<BlobSidecar>>;
}
