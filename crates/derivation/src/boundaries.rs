//! Translation of an L2 block range into the L1 range to search for batches.

use std::time::Duration;

use tokio::time::timeout;
use tracing::*;

use crate::errors::DerivationError;
use crate::traits::{L1Client, RollupClient};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wall-clock grace period granted to batch posters past the last L1
/// origin, in seconds.
const BATCH_POSTING_GRACE_SECS: u64 = 600;

/// Returns `(l1_start, l1_end)` bracketing the L1 blocks where the batches
/// for `[l2_start, l2_end]` can have landed.  The upper bound extends past
/// the end block's L1 origin by ten minutes of L1 blocks so that batches
/// posted late are still found.
pub async fn l1_search_boundaries(
    rollup_client: &impl RollupClient,
    l1_client: &impl L1Client,
    l2_start: u64,
    l2_end: u64,
) -> Result<(u64, u64), DerivationError> {
    let start_output = timeout(CLIENT_TIMEOUT, rollup_client.output_at_block(l2_start))
        .await
        .map_err(|_| DerivationError::ClientTimeout("output_at_block"))??;
    let start_l1_origin = start_output.l1_origin_number;

    // L1 block time measured off the timestamp diff between the origin and
    // its parent.
    let origin_block = timeout(CLIENT_TIMEOUT, l1_client.block_by_number(start_l1_origin))
        .await
        .map_err(|_| DerivationError::ClientTimeout("block_by_number"))??;
    let parent_block = timeout(
        CLIENT_TIMEOUT,
        l1_client.block_by_number(start_l1_origin.saturating_sub(1)),
    )
    .await
    .map_err(|_| DerivationError::ClientTimeout("block_by_number"))??;
    let l1_block_time = (origin_block.timestamp - parent_block.timestamp).max(1);

    let end_output = timeout(CLIENT_TIMEOUT, rollup_client.output_at_block(l2_end))
        .await
        .map_err(|_| DerivationError::ClientTimeout("output_at_block"))??;

    let l1_end = end_output.l1_origin_number + (60 / l1_block_time) * (BATCH_POSTING_GRACE_SECS / 60);
    debug!(%start_l1_origin, %l1_end, %l1_block_time, "L1 search boundaries");

    Ok((start_l1_origin, l1_end))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pylon_primitives::Bytes32;

    use super::*;
    use crate::traits::{L1BlockInfo, OutputAtBlock, SyncStatus};

    struct FixedRollup {
        start_origin: u64,
        end_origin: u64,
    }

    #[async_trait]
    impl RollupClient for FixedRollup {
        async fn output_at_block(&self, block_num: u64) -> anyhow::Result<OutputAtBlock> {
            let l1_origin_number = if block_num < 500 {
                self.start_origin
            } else {
                self.end_origin
            };
            Ok(OutputAtBlock {
                l2_block_number: block_num,
                l1_origin_number,
            })
        }

        async fn sync_status(&self) -> anyhow::Result<SyncStatus> {
            unimplemented!("not used by boundary search")
        }
    }

    struct FixedBlockTime(u64);

    #[async_trait]
    impl L1Client for FixedBlockTime {
        async fn block_by_number(&self, number: u64) -> anyhow::Result<L1BlockInfo> {
            Ok(L1BlockInfo {
                number,
                timestamp: number * self.0,
                hash: Bytes32::zero(),
                transactions: vec![],
            })
        }
    }

    #[tokio::test]
    async fn test_end_extends_ten_minutes_of_l1_blocks() {
        let rollup = FixedRollup {
            start_origin: 1000,
            end_origin: 1200,
        };

        // 12s L1 block time: extension is 50 blocks.
        let (start, end) = l1_search_boundaries(&rollup, &FixedBlockTime(12), 100, 900)
            .await
            .unwrap();
        assert_eq!(start, 1000);
        assert_eq!(end, 1200 + 50);

        // 2s block time: 300 blocks.
        let (_, end) = l1_search_boundaries(&rollup, &FixedBlockTime(2), 100, 900)
            .await
            .unwrap();
        assert_eq!(end, 1200 + 300);
    }
}
