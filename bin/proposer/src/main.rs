//! Validity-proof proposer service.

use std::sync::Arc;

use args::Args;
use pylon_common::logging;
use pylon_derivation::traits::BeaconClient;
use pylon_derivation::{DeriverConfig, SpanBatchDeriver};
use pylon_primitives::params::load_rollup_config;
use pylon_rocksdb::{DbOpsConfig, ProofRequestDb};
use tracing::*;

use crate::client::{
    build_rpc_client, BeaconRpcClient, FinalizedL1Checkpointer, L1RpcClient, OutputOracleClient,
    RollupRpcClient,
};
use crate::driver::Driver;
use crate::gateway::HttpProverGateway;
use crate::ranges::DerivationRangeSource;

mod args;
mod client;
mod config;
mod db;
mod driver;
mod errors;
mod gateway;
mod ranges;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args: Args = argh::from_env();
    let rollup_config = load_rollup_config(&args.rollup_config_dir, args.l2_chain_id)?;
    info!(chain_id = %args.l2_chain_id, "loaded rollup config");

    let rbdb = db::open_rocksdb_database(&args.datadir)?;
    let ledger = Arc::new(ProofRequestDb::new(rbdb, DbOpsConfig { retry_count: 5 }));

    let gateway = Arc::new(HttpProverGateway::new(args.prover_url.clone()));

    let l1_rpc = build_rpc_client(&args.l1_rpc)?;
    let rollup_client = Arc::new(RollupRpcClient::new(&args.rollup_rpc)?);
    let l1_client = Arc::new(L1RpcClient::new(l1_rpc.clone()));
    let oracle = Arc::new(OutputOracleClient::new(l1_rpc.clone(), args.output_oracle));
    let checkpointer = Arc::new(FinalizedL1Checkpointer::new(l1_rpc));

    let beacon_client = match &args.l1_beacon {
        Some(url) => {
            let beacon = Arc::new(BeaconRpcClient::new(url.clone()));
            let version = beacon.get_version().await?;
            info!(%version, "L1 beacon API reachable");
            Some(beacon)
        }
        None => {
            warn!("L1 beacon endpoint not set, unable to fetch post-ecotone blob batches");
            None
        }
    };

    let deriver_config = DeriverConfig {
        l2_genesis_time: rollup_config.genesis.l2_time,
        l2_genesis_block: rollup_config.genesis.l2.number,
        l2_block_time: rollup_config.block_time,
        batch_inbox: rollup_config.batch_inbox_address,
        batch_sender: rollup_config.genesis.system_config.batcher_addr,
        scratch_dir: args.scratch_dir.clone(),
        max_span_batch_deviation: config::DEFAULT_MAX_SPAN_BATCH_DEVIATION,
    };
    let deriver = SpanBatchDeriver::new(
        rollup_client.clone(),
        l1_client,
        beacon_client,
        deriver_config,
    );
    let range_source = Arc::new(DerivationRangeSource::new(rollup_client, deriver));

    let driver = Driver::new(
        ledger,
        gateway,
        oracle,
        checkpointer,
        range_source,
        args.proposer_config(),
    );

    tokio::select! {
        _ = driver.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("received interrupt, shutting down");
        }
    }

    Ok(())
}
