//! Bridges the driver's range-source interface onto the derivation
//! pipeline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pylon_derivation::traits::{BeaconClient, L1Client, RollupClient};
use pylon_derivation::{DerivationError, SpanBatchDeriver, SpanBatchRange};
use tokio::time::timeout;

use crate::driver::RangeSource;

const SYNC_STATUS_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DerivationRangeSource<R, L, B> {
    rollup_client: Arc<R>,
    deriver: SpanBatchDeriver<R, L, B>,
}

impl<R, L, B> DerivationRangeSource<R, L, B> {
    pub fn new(rollup_client: Arc<R>, deriver: SpanBatchDeriver<R, L, B>) -> Self {
        Self {
            rollup_client,
            deriver,
        }
    }
}

#[async_trait]
impl<R: RollupClient, L: L1Client, B: BeaconClient> RangeSource
    for DerivationRangeSource<R, L, B>
{
    async fn finalized_l2_block(&self) -> anyhow::Result<u64> {
        let status = timeout(SYNC_STATUS_TIMEOUT, self.rollup_client.sync_status())
            .await
            .map_err(|_| anyhow::anyhow!("optimism_syncStatus timed out"))??;
        Ok(status.finalized_l2)
    }

    async fn derive_span_batch_ranges(
        &self,
        start: u64,
        end: u64,
    ) -> Result<Vec<SpanBatchRange>, DerivationError> {
        self.deriver.derive_span_batch_ranges(start, end).await
    }
}
