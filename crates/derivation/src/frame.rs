//! Transaction-level frame parsing.  A batcher transaction carries a version
//! byte followed by one or more channel frames:
//!
//! `channel_id (16) || frame_number (u16 BE) || frame_data_length (u32 BE) ||
//! frame_data || is_last (u8)`

use std::fmt;
use std::str::FromStr;

use alloy_primitives::hex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const DERIVATION_VERSION_0: u8 = 0;

/// Frames larger than this are rejected outright.
pub const MAX_FRAME_LEN: usize = 1_000_000;

const FRAME_OVERHEAD: usize = 16 + 2 + 4 + 1;

#[derive(Debug, Error)]
pub enum FrameParseError {
    #[error("empty frame data")]
    Empty,

    #[error("unsupported derivation version {0}")]
    UnsupportedVersion(u8),

    #[error("truncated frame at offset {0}")]
    Truncated(usize),

    #[error("frame data length {0} exceeds maximum")]
    OversizedFrame(usize),

    #[error("invalid is_last marker {0}")]
    InvalidIsLast(u8),
}

/// Transport grouping key for frames; frames of one channel reassemble into
/// one decompressed batch stream.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(pub [u8; 16]);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({self})")
    }
}

impl FromStr for ChannelId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut id = [0u8; 16];
        hex::decode_to_slice(s, &mut id)?;
        Ok(ChannelId(id))
    }
}

impl Serialize for ChannelId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One fragment of a channel as carried by a batcher transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub id: ChannelId,
    pub number: u16,
    pub data: Vec<u8>,
    pub is_last: bool,
}

/// Parses the full frame payload of one batcher transaction (calldata or a
/// decoded blob).
pub fn parse_frames(data: &[u8]) -> Result<Vec<Frame>, FrameParseError> {
    let version = *data.first().ok_or(FrameParseError::Empty)?;
    if version != DERIVATION_VERSION_0 {
        return Err(FrameParseError::UnsupportedVersion(version));
    }

    let mut frames = Vec::new();
    let mut offset = 1;
    while offset < data.len() {
        if data.len() - offset < FRAME_OVERHEAD {
            return Err(FrameParseError::Truncated(offset));
        }

        let mut id = [0u8; 16];
        id.copy_from_slice(&data[offset..offset + 16]);
        offset += 16;

        let number = u16::from_be_bytes([data[offset], data[offset + 1]]);
        offset += 2;

        let length = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as usize;
        offset += 4;
        if length > MAX_FRAME_LEN {
            return Err(FrameParseError::OversizedFrame(length));
        }
        if data.len() - offset < length + 1 {
            return Err(FrameParseError::Truncated(offset));
        }

        let frame_data = data[offset..offset + length].to_vec();
        offset += length;

        let is_last = match data[offset] {
            0 => false,
            1 => true,
            other => return Err(FrameParseError::InvalidIsLast(other)),
        };
        offset += 1;

        frames.push(Frame {
            id: ChannelId(id),
            number,
            data: frame_data,
            is_last,
        });
    }

    Ok(frames)
}
