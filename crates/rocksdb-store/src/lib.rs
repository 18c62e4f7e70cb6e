pub mod macros;
pub mod request;
#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

use rockbound::{schema::ColumnFamilyName, Schema};

use crate::request::schemas::ProofRequestSchema;

pub const ROCKSDB_NAME: &str = "pylon";

pub const PROPOSER_COLUMN_FAMILIES: &[ColumnFamilyName] =
    &[ProofRequestSchema::COLUMN_FAMILY_NAME];

// Re-exports
pub use request::db::ProofRequestDb;

/// database operations configuration
#[derive(Clone, Copy, Debug)]
pub struct DbOpsConfig {
    pub retry_count: u16,
}
