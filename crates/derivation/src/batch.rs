//! Batch extraction from a reassembled channel payload.
//!
//! The payload is a zlib stream of RLP-wrapped batch items.  Only the span
//! prefix is decoded here; the proposer sizes proofs off the block count and
//! timestamp and never needs the per-block payload.

use std::io::Read;

use thiserror::Error;

pub const SINGULAR_BATCH_TYPE: u8 = 0;
pub const SPAN_BATCH_TYPE: u8 = 1;

/// Decompression bound, matching the protocol's per-channel RLP limit.
pub const MAX_RLP_BYTES_PER_CHANNEL: u64 = 10_000_000;

/// Fjord brotli channels carry this version byte instead of a zlib header.
const CHANNEL_VERSION_BROTLI: u8 = 0x01;

const SPAN_BATCH_CHECK_LEN: usize = 20;
const MAX_UVARINT_LEN: usize = 10;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("empty channel payload")]
    EmptyPayload,

    #[error("unsupported channel compression {0:#04x}")]
    UnsupportedCompression(u8),

    #[error("decompression: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("rlp: {0}")]
    Rlp(#[from] alloy_rlp::Error),

    #[error("batch item is an rlp list")]
    UnexpectedList,

    #[error("truncated batch payload")]
    Truncated,

    #[error("unknown batch type {0}")]
    UnknownBatchType(u8),

    #[error("malformed uvarint")]
    BadUvarint,

    #[error("span batch with zero blocks")]
    EmptySpanBatch,
}

/// Span batch prefix fields; everything needed to place the batch on the L2
/// chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanBatch {
    pub rel_timestamp: u64,
    pub l1_origin_num: u64,
    pub block_count: u64,
}

impl SpanBatch {
    /// Timestamp of the first block the span materializes into.
    pub fn timestamp(&self, l2_genesis_time: u64) -> u64 {
        l2_genesis_time + self.rel_timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batch {
    /// Pre-span batch kind; carries a single L2 block.
    Singular,
    Span(SpanBatch),
}

/// Streams every batch out of a ready channel's payload.
pub fn read_batches(channel_data: &[u8]) -> Result<Vec<Batch>, BatchError> {
    let first = *channel_data.first().ok_or(BatchError::EmptyPayload)?;
    if first == CHANNEL_VERSION_BROTLI {
        return Err(BatchError::UnsupportedCompression(first));
    }

    let mut decompressed = Vec::new();
    flate2::read::ZlibDecoder::new(channel_data)
        .take(MAX_RLP_BYTES_PER_CHANNEL)
        .read_to_end(&mut decompressed)?;

    let mut buf: &[u8] = &decompressed;
    let mut batches = Vec::new();
    while !buf.is_empty() {
        let header = alloy_rlp::Header::decode(&mut buf)?;
        if header.list {
            return Err(BatchError::UnexpectedList);
        }
        if buf.len() < header.payload_length {
            return Err(BatchError::Truncated);
        }
        let payload = &buf[..header.payload_length];
        buf = &buf[header.payload_length..];

        batches.push(decode_batch_item(payload)?);
    }

    Ok(batches)
}

fn decode_batch_item(payload: &[u8]) -> Result<Batch, BatchError> {
    let (batch_type, rest) = payload.split_first().ok_or(BatchError::Truncated)?;
    match *batch_type {
        SINGULAR_BATCH_TYPE => Ok(Batch::Singular),
        SPAN_BATCH_TYPE => decode_span_batch(rest).map(Batch::Span),
        other => Err(BatchError::UnknownBatchType(other)),
    }
}

fn decode_span_batch(mut buf: &[u8]) -> Result<SpanBatch, BatchError> {
    let rel_timestamp = read_uvarint(&mut buf)?;
    let l1_origin_num = read_uvarint(&mut buf)?;

    // Skip the parent and L1-origin check hashes; the proposer does not
    // validate chain linkage.
    if buf.len() < 2 * SPAN_BATCH_CHECK_LEN {
        return Err(BatchError::Truncated);
    }
    buf = &buf[2 * SPAN_BATCH_CHECK_LEN..];

    let block_count = read_uvarint(&mut buf)?;
    if block_count == 0 {
        return Err(BatchError::EmptySpanBatch);
    }

    Ok(SpanBatch {
        rel_timestamp,
        l1_origin_num,
        block_count,
    })
}

fn read_uvarint(buf: &mut &[u8]) -> Result<u64, BatchError> {
    let mut value: u64 = 0;
    for i in 0..MAX_UVARINT_LEN {
        let (byte, rest) = buf.split_first().ok_or(BatchError::BadUvarint)?;
        *buf = rest;
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(BatchError::BadUvarint)
}
