//! Batcher-transaction fetching.  Walks an L1 block range, pulls every
//! transaction the batch sender posted to the inbox, decodes its frames
//! (calldata or blob sidecars) and writes them to the scratch directory for
//! reassembly.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use futures_util::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::*;

use crate::blob::decode_blob;
use crate::errors::DerivationError;
use crate::frame::{parse_frames, Frame};
use crate::traits::{BeaconClient, L1BlockInfo, L1Client};

pub const DEFAULT_CONCURRENT_REQUESTS: usize = 10;

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
const SECONDS_PER_SLOT: u64 = 12;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub batch_inbox: Address,
    pub batch_sender: Address,
    pub scratch_dir: PathBuf,
    pub concurrent_requests: usize,
}

/// A frame together with where it was found on L1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameWithMetadata {
    pub inclusion_block: u64,
    pub timestamp: u64,
    pub frame: Frame,
}

/// On-disk layout of one batcher transaction's frames.
#[derive(Debug, Serialize, Deserialize)]
struct FramesFile {
    inclusion_block: u64,
    timestamp: u64,
    frames: Vec<Frame>,
}

/// Fetches every batcher transaction in `[l1_start, l1_end)` and writes the
/// decoded frames into the scratch directory, which is cleared first so a
/// later load sees only this fetch.  At most `concurrent_requests` block
/// fetches are in flight.
pub async fn fetch_frames_between<L: L1Client, B: BeaconClient>(
    l1_client: &Arc<L>,
    beacon_client: Option<&Arc<B>>,
    config: &FetchConfig,
    l1_start: u64,
    l1_end: u64,
) -> Result<(), DerivationError> {
    if config.scratch_dir.exists() {
        fs::remove_dir_all(&config.scratch_dir)?;
    }
    fs::create_dir_all(&config.scratch_dir)?;

    let beacon_genesis = match beacon_client {
        Some(beacon) => Some(
            timeout(CLIENT_TIMEOUT, beacon.genesis_time())
                .await
                .map_err(|_| DerivationError::ClientTimeout("genesis_time"))??,
        ),
        None => None,
    };

    let mut blocks = stream::iter(l1_start..l1_end)
        .map(|number| {
            let l1_client = l1_client.clone();
            async move {
                timeout(CLIENT_TIMEOUT, l1_client.block_by_number(number))
                    .await
                    .map_err(|_| DerivationError::ClientTimeout("block_by_number"))?
                    .map_err(DerivationError::from)
            }
        })
        .buffer_unordered(config.concurrent_requests);

    let mut valid = 0usize;
    let mut invalid = 0usize;
    while let Some(block) = blocks.next().await {
        let block = block?;
        extract_block_frames(
            beacon_client,
            beacon_genesis,
            config,
            &block,
            &mut valid,
            &mut invalid,
        )
        .await?;
    }

    info!(%l1_start, %l1_end, %valid, %invalid, "fetched batcher transactions");
    Ok(())
}

async fn extract_block_frames<B: BeaconClient>(
    beacon_client: Option<&Arc<B>>,
    beacon_genesis: Option<u64>,
    config: &FetchConfig,
    block: &L1BlockInfo,
    valid: &mut usize,
    invalid: &mut usize,
) -> Result<(), DerivationError> {
    // Sidecar indices count blob hashes across the whole block, batcher or
    // not, so the counter advances on every transaction.
    let mut blob_index: u64 = 0;

    for (tx_index, tx) in block.transactions.iter().enumerate() {
        let blob_count = tx.blob_versioned_hashes.len() as u64;
        if tx.to != Some(config.batch_inbox) || tx.from != config.batch_sender {
            blob_index += blob_count;
            continue;
        }

        let mut payloads: Vec<Vec<u8>> = Vec::new();
        if blob_count == 0 {
            payloads.push(tx.input.clone());
        } else {
            let indices: Vec<u64> = (blob_index..blob_index + blob_count).collect();
            blob_index += blob_count;

            let (Some(beacon), Some(genesis)) = (beacon_client, beacon_genesis) else {
                warn!(
                    block = %block.number,
                    "beacon endpoint not set, unable to fetch blob batch"
                );
                *invalid += 1;
                continue;
            };

            let slot = (block.timestamp - genesis) / SECONDS_PER_SLOT;
            let sidecars = timeout(CLIENT_TIMEOUT, beacon.fetch_sidecars(slot, &indices))
                .await
                .map_err(|_| DerivationError::ClientTimeout("fetch_sidecars"))??;
            for sidecar in sidecars {
                match decode_blob(&sidecar.blob) {
                    Ok(data) => payloads.push(data),
                    Err(err) => {
                        warn!(block = %block.number, index = %sidecar.index, %err, "undecodable blob");
                        *invalid += 1;
                    }
                }
            }
        }

        let mut frames = Vec::new();
        let mut bad_payload = false;
        for payload in &payloads {
            match parse_frames(payload) {
                Ok(mut parsed) => frames.append(&mut parsed),
                Err(err) => {
                    warn!(block = %block.number, %tx_index, %err, "unparseable batcher payload");
                    bad_payload = true;
                }
            }
        }
        if bad_payload {
            *invalid += 1;
        }
        if frames.is_empty() {
            continue;
        }
        *valid += 1;

        let file = FramesFile {
            inclusion_block: block.number,
            timestamp: block.timestamp,
            frames,
        };
        let path = config
            .scratch_dir
            .join(format!("{}_{}.json", block.number, tx_index));
        fs::write(&path, serde_json::to_vec(&file)?)?;
    }

    Ok(())
}

/// Loads every frame written by the last fetch.
pub fn load_frames(scratch_dir: &PathBuf) -> Result<Vec<FrameWithMetadata>, DerivationError> {
    let mut out = Vec::new();
    for dirent in fs::read_dir(scratch_dir)? {
        let path = dirent?.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let file: FramesFile = serde_json::from_slice(&fs::read(&path)?)?;
        for frame in file.frames {
            out.push(FrameWithMetadata {
                inclusion_block: file.inclusion_block,
                timestamp: file.timestamp,
                frame,
            });
        }
    }
    Ok(out)
}
