//! Concrete clients behind the capability traits: rollup node and L1
//! execution RPC over jsonrpsee, beacon API over plain HTTP, plus the
//! output-oracle reader and the L1 checkpointer.

pub mod types;

use std::time::Duration;

use alloy_primitives::{hex, keccak256, Address};
use anyhow::Context;
use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use pylon_derivation::traits::{
    BeaconClient, BlobSidecar, L1BlockInfo, L1Client, L1Transaction, OutputAtBlock, RollupClient,
    SyncStatus,
};
use pylon_primitives::Bytes32;

use crate::driver::{Checkpointer, OutputOracle};
use types::*;

const RPC_TIMEOUT: Duration = Duration::from_secs(10);

pub fn build_rpc_client(url: &str) -> anyhow::Result<HttpClient> {
    HttpClientBuilder::default()
        .request_timeout(RPC_TIMEOUT)
        .build(url)
        .with_context(|| format!("building RPC client for {url}"))
}

pub struct RollupRpcClient {
    client: HttpClient,
}

impl RollupRpcClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            client: build_rpc_client(url)?,
        })
    }
}

#[async_trait]
impl RollupClient for RollupRpcClient {
    async fn output_at_block(&self, block_num: u64) -> anyhow::Result<OutputAtBlock> {
        let output: RpcOutputAtBlock = self
            .client
            .request("optimism_outputAtBlock", rpc_params![format!("0x{block_num:x}")])
            .await
            .context("optimism_outputAtBlock")?;
        Ok(OutputAtBlock {
            l2_block_number: output.block_ref.number,
            l1_origin_number: output.block_ref.l1_origin.number,
        })
    }

    async fn sync_status(&self) -> anyhow::Result<SyncStatus> {
        let status: RpcSyncStatus = self
            .client
            .request("optimism_syncStatus", rpc_params![])
            .await
            .context("optimism_syncStatus")?;
        Ok(SyncStatus {
            finalized_l2: status.finalized_l2.number,
        })
    }
}

pub struct L1RpcClient {
    client: HttpClient,
}

impl L1RpcClient {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl L1Client for L1RpcClient {
    async fn block_by_number(&self, number: u64) -> anyhow::Result<L1BlockInfo> {
        let block: RpcBlock = self
            .client
            .request(
                "eth_getBlockByNumber",
                rpc_params![format!("0x{number:x}"), true],
            )
            .await
            .context("eth_getBlockByNumber")?;

        Ok(L1BlockInfo {
            number: block.number,
            timestamp: block.timestamp,
            hash: block.hash,
            transactions: block
                .transactions
                .into_iter()
                .map(|tx| L1Transaction {
                    from: tx.from,
                    to: tx.to,
                    input: tx.input,
                    blob_versioned_hashes: tx.blob_versioned_hashes,
                })
                .collect(),
        })
    }
}

pub struct BeaconRpcClient {
    base_url: String,
    client: reqwest::Client,
}

impl BeaconRpcClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(RPC_TIMEOUT)
            .build()
            .expect("Failed to build beacon client!");
        Self { base_url, client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl BeaconClient for BeaconRpcClient {
    async fn get_version(&self) -> anyhow::Result<String> {
        let resp: BeaconVersionResponse = self.get_json("/eth/v1/node/version").await?;
        Ok(resp.data.version)
    }

    async fn genesis_time(&self) -> anyhow::Result<u64> {
        let resp: BeaconGenesisResponse = self.get_json("/eth/v1/beacon/genesis").await?;
        Ok(resp.data.genesis_time)
    }

    async fn fetch_sidecars(&self, slot: u64, indices: &[u64]) -> anyhow::Result<Vec<BlobSidecar>> {
        // Only the requested indices, never the full sidecar set.
        let indices_param = indices
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let resp: BlobSidecarsResponse = self
            .get_json(&format!(
                "/eth/v1/beacon/blob_sidecars/{slot}?indices={indices_param}"
            ))
            .await?;
        Ok(resp
            .data
            .into_iter()
            .map(|sc| BlobSidecar {
                index: sc.index,
                blob: sc.blob,
            })
            .collect())
    }
}

/// Reader for the on-chain output oracle.  Call data is just the function
/// selector; both reads take no arguments.
pub struct OutputOracleClient {
    client: HttpClient,
    address: Address,
}

impl OutputOracleClient {
    pub fn new(client: HttpClient, address: Address) -> Self {
        Self { client, address }
    }

    async fn call_u64(&self, signature: &str) -> anyhow::Result<u64> {
        let selector = &keccak256(signature.as_bytes())[..4];
        let call = serde_json::json!({
            "to": self.address.to_string(),
            "data": format!("0x{}", hex::encode(selector)),
        });
        let result: String = self
            .client
            .request("eth_call", rpc_params![call, "latest"])
            .await
            .with_context(|| format!("eth_call {signature}"))?;

        let word: Bytes32 = result
            .parse()
            .with_context(|| format!("decoding {signature} return"))?;
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&word.as_slice()[24..]);
        Ok(u64::from_be_bytes(tail))
    }
}

#[async_trait]
impl OutputOracle for OutputOracleClient {
    async fn latest_block_number(&self) -> anyhow::Result<u64> {
        self.call_u64("latestBlockNumber()").await
    }

    async fn next_block_number(&self) -> anyhow::Result<u64> {
        self.call_u64("nextBlockNumber()").await
    }
}

/// Anchors aggregate proofs to the latest finalized L1 block.  Recording the
/// hash on-chain rides with the submitter's checkpoint transaction.
pub struct FinalizedL1Checkpointer {
    client: HttpClient,
}

impl FinalizedL1Checkpointer {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Checkpointer for FinalizedL1Checkpointer {
    async fn checkpoint_block_hash(&self) -> anyhow::Result<(u64, Bytes32)> {
        let header: RpcBlockHeader = self
            .client
            .request("eth_getBlockByNumber", rpc_params!["finalized", false])
            .await
            .context("eth_getBlockByNumber(finalized)")?;
        Ok((header.number, header.hash))
    }
}
