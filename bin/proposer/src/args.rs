use std::path::PathBuf;

use alloy_primitives::Address;
use argh::FromArgs;

use crate::config::{
    ProposerConfig, DEFAULT_LOOP_INTERVAL, DEFAULT_MAX_BLOCK_RANGE_PER_SPAN_PROOF,
    DEFAULT_MAX_CONCURRENT_SPAN_REQUESTS, DEFAULT_PROOF_TIMEOUT,
};

fn parse_address(value: &str) -> Result<Address, String> {
    value
        .parse()
        .map_err(|e| format!("invalid address '{value}': {e}"))
}

/// Command-line arguments
#[derive(Debug, FromArgs)]
pub struct Args {
    /// directory for the request ledger database
    #[argh(option, short = 'd', description = "ledger database directory")]
    pub datadir: PathBuf,

    /// directory holding per-chain rollup configs (`<chain_id>.json`)
    #[argh(option, description = "rollup config directory")]
    pub rollup_config_dir: PathBuf,

    #[argh(option, description = "L2 chain id")]
    pub l2_chain_id: u64,

    #[argh(option, description = "L1 execution RPC url")]
    pub l1_rpc: String,

    /// optional; without it post-ecotone blob batches cannot be fetched
    #[argh(option, description = "L1 beacon API url")]
    pub l1_beacon: Option<String>,

    #[argh(option, description = "rollup node RPC url")]
    pub rollup_rpc: String,

    #[argh(option, description = "prover service url")]
    pub prover_url: String,

    #[argh(
        option,
        from_str_fn(parse_address),
        description = "output oracle contract address"
    )]
    pub output_oracle: Address,

    #[argh(option, description = "scratch directory for batch frames")]
    pub scratch_dir: PathBuf,

    #[argh(
        option,
        description = "driver tick interval in seconds",
        default = "DEFAULT_LOOP_INTERVAL"
    )]
    pub loop_interval: u64,

    #[argh(
        option,
        description = "max concurrent span proof requests",
        default = "DEFAULT_MAX_CONCURRENT_SPAN_REQUESTS"
    )]
    pub max_concurrent_span_requests: u64,

    #[argh(
        option,
        description = "seconds before an in-flight proof request is retried",
        default = "DEFAULT_PROOF_TIMEOUT"
    )]
    pub proof_timeout: u64,

    #[argh(
        option,
        description = "widest L2 range per span proof",
        default = "DEFAULT_MAX_BLOCK_RANGE_PER_SPAN_PROOF"
    )]
    pub max_block_range_per_span_proof: u64,
}

impl Args {
    pub fn proposer_config(&self) -> ProposerConfig {
        ProposerConfig {
            loop_interval: self.loop_interval,
            max_concurrent_span_requests: self.max_concurrent_span_requests,
            proof_timeout: self.proof_timeout,
            max_block_range_per_span_proof: self.max_block_range_per_span_proof,
        }
    }
}
