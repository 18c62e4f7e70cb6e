use thiserror::Error;

use crate::batch::BatchError;
use crate::frame::{ChannelId, FrameParseError};

/// Errors that can be generated while deriving span-batch ranges.
#[derive(Debug, Error)]
pub enum DerivationError {
    /// No span batch covers the requested block.
    #[error("no span batch found for block {0}")]
    NoSpanBatchFound(u64),

    /// A span batch starts implausibly far past the requested range.
    #[error("max deviation exceeded: span starts at {span_start}, requested end {requested_end}")]
    MaxDeviationExceeded { span_start: u64, requested_end: u64 },

    /// A ready channel produced zero batches, meaning the batch data on L1
    /// is corrupt or missing.
    #[error("no batches in channel {0}")]
    EmptyChannel(ChannelId),

    #[error("{0} timed out")]
    ClientTimeout(&'static str),

    #[error("client: {0}")]
    Client(#[from] anyhow::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("scratch file: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Frame(#[from] FrameParseError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}
