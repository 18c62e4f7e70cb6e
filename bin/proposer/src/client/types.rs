//! Minimal response types for the JSON-RPC and beacon endpoints we read.
//! Only the fields the proposer consumes are modeled.

use alloy_primitives::Address;
use pylon_primitives::Bytes32;
use serde::{Deserialize, Deserializer};

/// Quantities in execution-layer responses arrive `0x`-hex encoded.
pub fn u64_from_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let s = String::deserialize(deserializer)?;
    let hex = s.strip_prefix("0x").unwrap_or(&s);
    u64::from_str_radix(hex, 16).map_err(serde::de::Error::custom)
}

/// Beacon-API quantities arrive as decimal strings.
pub fn u64_from_dec_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

pub fn bytes_from_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(deserializer)?;
    alloy_primitives::hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcBlockNumHash {
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcL2BlockRef {
    pub number: u64,
    #[serde(rename = "l1origin")]
    pub l1_origin: RpcBlockNumHash,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcOutputAtBlock {
    #[serde(rename = "blockRef")]
    pub block_ref: RpcL2BlockRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcSyncStatus {
    pub finalized_l2: RpcL2BlockRef,
}

/// `eth_getBlockByNumber` with full transaction objects.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcBlock {
    #[serde(deserialize_with = "u64_from_hex")]
    pub number: u64,
    #[serde(deserialize_with = "u64_from_hex")]
    pub timestamp: u64,
    pub hash: Bytes32,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

/// `eth_getBlockByNumber` without transaction objects.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcBlockHeader {
    #[serde(deserialize_with = "u64_from_hex")]
    pub number: u64,
    pub hash: Bytes32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcTransaction {
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(deserialize_with = "bytes_from_hex")]
    pub input: Vec<u8>,
    #[serde(default, rename = "blobVersionedHashes")]
    pub blob_versioned_hashes: Vec<Bytes32>,
}

#[derive(Debug, Deserialize)]
pub struct BeaconVersionResponse {
    pub data: BeaconVersionData,
}

#[derive(Debug, Deserialize)]
pub struct BeaconVersionData {
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct BeaconGenesisResponse {
    pub data: BeaconGenesisData,
}

#[derive(Debug, Deserialize)]
pub struct BeaconGenesisData {
    #[serde(deserialize_with = "u64_from_dec_str")]
    pub genesis_time: u64,
}

#[derive(Debug, Deserialize)]
pub struct BlobSidecarsResponse {
    pub data: Vec<RpcBlobSidecar>,
}

#[derive(Debug, Deserialize)]
pub struct RpcBlobSidecar {
    #[serde(deserialize_with = "u64_from_dec_str")]
    pub index: u64,
    #[serde(deserialize_with = "bytes_from_hex")]
    pub blob: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_block() {
        let json = r#"{
            "number": "0x10",
            "timestamp": "0x64",
            "hash": "0x438335a20d98863a4c0c97999eb2481921ccd28553eac6f913af7c12aec04108",
            "transactions": [{
                "from": "0x6887246668a3b87f54deb3b94ba47a6f63f32985",
                "to": "0xff00000000000000000000000000000000000010",
                "input": "0x00aabb",
                "blobVersionedHashes": ["0x01aa00000000000000000000000000000000000000000000000000000000aa01"]
            }]
        }"#;
        let block: RpcBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.number, 16);
        assert_eq!(block.timestamp, 100);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].input, vec![0x00, 0xaa, 0xbb]);
        assert_eq!(block.transactions[0].blob_versioned_hashes.len(), 1);
    }

    #[test]
    fn test_parse_header_ignores_tx_hashes() {
        let json = r#"{
            "number": "0x10",
            "timestamp": "0x64",
            "hash": "0x438335a20d98863a4c0c97999eb2481921ccd28553eac6f913af7c12aec04108",
            "transactions": ["0xdeadbeef"]
        }"#;
        let header: RpcBlockHeader = serde_json::from_str(json).unwrap();
        assert_eq!(header.number, 16);
    }

    #[test]
    fn test_parse_output_at_block() {
        let json = r#"{
            "version": "0x0",
            "outputRoot": "0x1",
            "blockRef": {
                "number": 8000,
                "timestamp": 1700000000,
                "l1origin": {"hash": "0x2", "number": 17000000}
            }
        }"#;
        let output: RpcOutputAtBlock = serde_json::from_str(json).unwrap();
        assert_eq!(output.block_ref.number, 8000);
        assert_eq!(output.block_ref.l1_origin.number, 17000000);
    }

    #[test]
    fn test_parse_sidecars_response() {
        let json = r#"{"data":[{"index":"2","blob":"0x0102"}]}"#;
        let resp: BlobSidecarsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.data[0].index, 2);
        assert_eq!(resp.data[0].blob, vec![1, 2]);
    }
}
