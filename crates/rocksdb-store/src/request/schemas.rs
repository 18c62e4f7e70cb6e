use pylon_db::types::ProofRequestEntry;

use crate::{
    define_table_with_seek_key_codec, define_table_without_codec, impl_borsh_value_codec,
};

define_table_with_seek_key_codec!(
    /// A table to store id -> proof request entry mapping
    (ProofRequestSchema) u64 => ProofRequestEntry
);
