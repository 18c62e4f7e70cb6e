//! Span-range derivation: given an L2 block range, locate the batch frames
//! posted to the inbox on L1, reassemble them into channels and span batches,
//! and compute the L2 sub-ranges a span proof must cover.

pub mod batch;
pub mod blob;
pub mod boundaries;
pub mod channel;
pub mod errors;
pub mod fetch;
pub mod frame;
pub mod traits;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use tracing::*;

use crate::batch::Batch;
use crate::channel::process_frames;
use crate::fetch::{fetch_frames_between, load_frames, FetchConfig, FrameWithMetadata};
use crate::frame::ChannelId;
use crate::traits::{BeaconClient, L1Client, RollupClient};

pub use errors::DerivationError;

/// A range of L2 blocks covered by one span batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanBatchRange {
    pub start: u64,
    pub end: u64,
}

/// Chain constants and fetch parameters for one derivation pass.
#[derive(Debug, Clone)]
pub struct DeriverConfig {
    pub l2_genesis_time: u64,
    pub l2_genesis_block: u64,
    pub l2_block_time: u64,
    pub batch_inbox: Address,
    pub batch_sender: Address,
    /// Scratch directory for fetched frames.  Owned by a single derivation
    /// invocation; it is cleared before every fetch.
    pub scratch_dir: PathBuf,
    /// Upper bound on how far past the requested range a span batch may
    /// start before the pass is aborted.
    pub max_span_batch_deviation: u64,
}

/// L2 block number a batch timestamp materializes into.
pub fn timestamp_to_block(config: &DeriverConfig, l2_timestamp: u64) -> u64 {
    (l2_timestamp - config.l2_genesis_time) / config.l2_block_time + config.l2_genesis_block
}

/// Drives the full pipeline: search-bound translation, frame fetch, channel
/// reassembly, batch extraction, range clipping.
pub struct SpanBatchDeriver<R, L, B> {
    rollup_client: Arc<R>,
    l1_client: Arc<L>,
    beacon_client: Option<Arc<B>>,
    config: DeriverConfig,
}

impl<R: RollupClient, L: L1Client, B: BeaconClient> SpanBatchDeriver<R, L, B> {
    pub fn new(
        rollup_client: Arc<R>,
        l1_client: Arc<L>,
        beacon_client: Option<Arc<B>>,
        config: DeriverConfig,
    ) -> Self {
        Self {
            rollup_client,
            l1_client,
            beacon_client,
            config,
        }
    }

    /// Returns the (unordered) list of span-batch ranges intersecting
    /// `[l2_start, l2_end]`.  A batch that cannot be read as a span batch
    /// degrades the whole pass to the single conservative range
    /// `[l2_start, l2_end]`.
    pub async fn derive_span_batch_ranges(
        &self,
        l2_start: u64,
        l2_end: u64,
    ) -> Result<Vec<SpanBatchRange>, DerivationError> {
        let (l1_start, l1_end) = boundaries::l1_search_boundaries(
            self.rollup_client.as_ref(),
            self.l1_client.as_ref(),
            l2_start,
            l2_end,
        )
        .await?;
        debug!(%l1_start, %l1_end, "derived L1 search boundaries");

        let fetch_config = FetchConfig {
            batch_inbox: self.config.batch_inbox,
            batch_sender: self.config.batch_sender,
            scratch_dir: self.config.scratch_dir.clone(),
            concurrent_requests: fetch::DEFAULT_CONCURRENT_REQUESTS,
        };
        fetch_frames_between(
            &self.l1_client,
            self.beacon_client.as_ref(),
            &fetch_config,
            l1_start,
            l1_end,
        )
        .await?;

        let frames = load_frames(&self.config.scratch_dir)?;
        self.ranges_from_frames(frames, l2_start, l2_end)
    }

    fn ranges_from_frames(
        &self,
        mut frames: Vec<FrameWithMetadata>,
        l2_start: u64,
        l2_end: u64,
    ) -> Result<Vec<SpanBatchRange>, DerivationError> {
        frames.sort_by_key(|f| f.inclusion_block);

        let mut frames_by_channel: BTreeMap<ChannelId, Vec<FrameWithMetadata>> = BTreeMap::new();
        for frame in frames {
            frames_by_channel
                .entry(frame.frame.id)
                .or_default()
                .push(frame);
        }

        let mut ranges = Vec::new();

        for (id, channel_frames) in frames_by_channel {
            let channel = process_frames(id, channel_frames);
            if channel.batches.is_empty() {
                // Corrupt or missing batch data on L1; nothing downstream can
                // be trusted.
                return Err(DerivationError::EmptyChannel(id));
            }

            for batch in channel.batches {
                let span = match batch {
                    Batch::Span(span) => span,
                    Batch::Singular => {
                        // Cannot size a singular batch as a span; prove the
                        // whole requested range in one go instead.
                        warn!(%id, "non-span batch in channel, falling back to full range");
                        ranges.push(SpanBatchRange {
                            start: l2_start,
                            end: l2_end,
                        });
                        return Ok(ranges);
                    }
                };

                let batch_start = timestamp_to_block(
                    &self.config,
                    span.timestamp(self.config.l2_genesis_time),
                );
                let batch_end = batch_start + span.block_count - 1;

                if batch_start > l2_end || batch_end < l2_start {
                    if batch_start > l2_end
                        && batch_start - l2_end > self.config.max_span_batch_deviation
                    {
                        return Err(DerivationError::MaxDeviationExceeded {
                            span_start: batch_start,
                            requested_end: l2_end,
                        });
                    }
                    continue;
                }

                ranges.push(SpanBatchRange {
                    start: l2_start.max(batch_start),
                    end: l2_end.min(batch_end),
                });
            }
        }

        if ranges.is_empty() {
            return Err(DerivationError::NoSpanBatchFound(l2_start));
        }
        Ok(ranges)
    }
}
