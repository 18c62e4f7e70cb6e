use std::fmt;
use std::str::FromStr;

use alloy_primitives::{hex, FixedBytes};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 32-byte buf for L1 block hashes and system-config words.
///
/// Unlike a plain `FixedBytes<32>`, this decodes from hex of any length up to
/// 64 nibbles by left-padding with zeros, so `"0x1"` and `"0x00…01"` are the
/// same value. Chain registries ship both forms.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bytes32(pub FixedBytes<32>);

impl Bytes32 {
    pub fn zero() -> Self {
        Self([0; 32].into())
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl From<[u8; 32]> for Bytes32 {
    fn from(value: [u8; 32]) -> Self {
        Self(FixedBytes::from(value))
    }
}

impl From<FixedBytes<32>> for Bytes32 {
    fn from(value: FixedBytes<32>) -> Self {
        Self(value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseBytes32Error {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid length for 32-byte value: got {0} bytes")]
    InvalidLength(usize),
}

impl FromStr for Bytes32 {
    type Err = ParseBytes32Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        if s.len() > 64 {
            return Err(ParseBytes32Error::InvalidLength(s.len().div_ceil(2)));
        }

        // Left-pad to 64 nibbles so minimal-length hex decodes to the same
        // value as the full-width form.
        let padded = format!("{s:0>64}");
        let bytes = hex::decode(&padded)?;
        if bytes.len() != 32 {
            return Err(ParseBytes32Error::InvalidLength(bytes.len()));
        }

        let mut array = [0u8; 32];
        array.copy_from_slice(&bytes);
        Ok(array.into())
    }
}

impl fmt::Display for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Bytes32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Serialize for Bytes32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Bytes32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl BorshSerialize for Bytes32 {
    fn serialize<W: std::io::prelude::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.0.as_ref())
    }
}

impl BorshDeserialize for Bytes32 {
    fn deserialize_reader<R: std::io::prelude::Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut array = [0u8; 32];
        reader.read_exact(&mut array)?;
        Ok(array.into())
    }
}
