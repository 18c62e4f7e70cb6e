//! Rollup chain parameters, loaded from the per-chain JSON shipped in
//! `rollup-configs/<chain_id>.json`.
//!
//! Registry files are inconsistent about number encoding: some chains ship
//! `genesis.l1.number` as decimal, others as `"0x…"` hex, and the
//! system-config words come as minimal-length hex. The deserializers here
//! accept all of those forms.

use std::path::Path;

use alloy_primitives::Address;
use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};

use crate::buf::Bytes32;

/// Deserializes a `u64` from a JSON number, a decimal string, or a `0x` hex
/// string.
fn number_or_hex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => {
            let parsed = match s.strip_prefix("0x") {
                Some(hex) => u64::from_str_radix(hex, 16),
                None => s.parse(),
            };
            parsed.map_err(serde::de::Error::custom)
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockRef {
    pub hash: Bytes32,
    #[serde(deserialize_with = "number_or_hex")]
    pub number: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemConfig {
    #[serde(rename = "batcherAddr")]
    pub batcher_addr: Address,
    pub overhead: Bytes32,
    pub scalar: Bytes32,
    #[serde(rename = "gasLimit")]
    pub gas_limit: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genesis {
    pub l1: BlockRef,
    pub l2: BlockRef,
    pub l2_time: u64,
    pub system_config: SystemConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BaseFeeParams {
    #[serde(deserialize_with = "number_or_hex")]
    pub max_change_denominator: u64,
    pub elasticity_multiplier: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RollupConfig {
    pub genesis: Genesis,
    pub block_time: u64,
    pub max_sequencer_drift: u64,
    pub seq_window_size: u64,
    pub channel_timeout: u64,
    pub l1_chain_id: u64,
    pub l2_chain_id: u64,
    pub batch_inbox_address: Address,
    pub deposit_contract_address: Address,
    pub l1_system_config_address: Address,

    #[serde(default)]
    pub regolith_time: Option<u64>,
    #[serde(default)]
    pub canyon_time: Option<u64>,
    #[serde(default)]
    pub delta_time: Option<u64>,
    #[serde(default)]
    pub ecotone_time: Option<u64>,

    #[serde(default)]
    pub base_fee_params: Option<BaseFeeParams>,
    #[serde(default)]
    pub canyon_base_fee_params: Option<BaseFeeParams>,
}

impl RollupConfig {
    /// Sanity checks applied after load, before the config is handed to the
    /// rest of the service.
    pub fn check_well_formed(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.block_time > 0, "params: zero L2 block time");
        anyhow::ensure!(self.l2_chain_id > 0, "params: zero L2 chain id");
        anyhow::ensure!(
            self.batch_inbox_address != Address::ZERO,
            "params: zero batch inbox address"
        );
        Ok(())
    }
}

/// Loads and validates the rollup config for `chain_id` from `config_dir`.
pub fn load_rollup_config(config_dir: &Path, chain_id: u64) -> anyhow::Result<RollupConfig> {
    let path = config_dir.join(format!("{chain_id}.json"));
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("params: reading rollup config {}", path.display()))?;
    let config = serde_json::from_str::<RollupConfig>(&json)
        .with_context(|| format!("params: parsing rollup config {}", path.display()))?;
    config.check_well_formed()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config_json(l1_number: &str, overhead: &str) -> String {
        format!(
            r#"{{
                "genesis": {{
                    "l1": {{
                        "hash": "0x438335a20d98863a4c0c97999eb2481921ccd28553eac6f913af7c12aec04108",
                        "number": {l1_number}
                    }},
                    "l2": {{
                        "hash": "0xdbf6a80fef073de06add9b0d14026d6e5a86c85f6d102c36d3d8e9cf89c2afd3",
                        "number": "0x0"
                    }},
                    "l2_time": 1686068903,
                    "system_config": {{
                        "batcherAddr": "0x6887246668a3b87f54deb3b94ba47a6f63f32985",
                        "overhead": "{overhead}",
                        "scalar": "0x1",
                        "gasLimit": 30000000
                    }}
                }},
                "block_time": 2,
                "max_sequencer_drift": 600,
                "seq_window_size": 3600,
                "channel_timeout": 300,
                "l1_chain_id": 1,
                "l2_chain_id": 10,
                "batch_inbox_address": "0xff00000000000000000000000000000000000010",
                "deposit_contract_address": "0xbeb5fc579115071764c7423a4f12edde41f106ed",
                "l1_system_config_address": "0x229047fed2591dbec1ef1118d64f7af3db9eb290",
                "base_fee_params": {{
                    "max_change_denominator": "0x32",
                    "elasticity_multiplier": 6
                }}
            }}"#
        )
    }

    #[test]
    fn test_parse_decimal_and_hex_numbers() {
        let dec: RollupConfig =
            serde_json::from_str(&sample_config_json("17422590", "0xbc")).unwrap();
        let hex: RollupConfig =
            serde_json::from_str(&sample_config_json("\"0x109dcfe\"", "0xbc")).unwrap();
        assert_eq!(dec.genesis.l1.number, 17422590);
        assert_eq!(hex.genesis.l1.number, 0x109dcfe);
        assert_eq!(
            dec.base_fee_params.as_ref().unwrap().max_change_denominator,
            50
        );
    }

    #[test]
    fn test_minimal_hex_system_config_words() {
        let cfg: RollupConfig =
            serde_json::from_str(&sample_config_json("17422590", "0xbc")).unwrap();
        let full: Bytes32 = format!("0x{:0>64}", "bc").parse().unwrap();
        assert_eq!(cfg.genesis.system_config.overhead, full);
        assert_eq!(cfg.genesis.system_config.scalar.as_slice()[31], 1);
    }

    #[test]
    fn test_well_formed_rejects_zero_block_time() {
        let mut cfg: RollupConfig =
            serde_json::from_str(&sample_config_json("17422590", "0xbc")).unwrap();
        cfg.check_well_formed().unwrap();
        cfg.block_time = 0;
        assert!(cfg.check_well_formed().is_err());
    }
}
