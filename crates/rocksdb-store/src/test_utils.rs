use std::sync::Arc;

use rockbound::{rocksdb, OptimisticTransactionDB};
use tempfile::TempDir;

use crate::DbOpsConfig;

pub fn get_rocksdb_tmp_instance() -> anyhow::Result<(Arc<OptimisticTransactionDB>, DbOpsConfig)> {
    let dbname = crate::ROCKSDB_NAME;
    let cfs = crate::PROPOSER_COLUMN_FAMILIES;
    let mut opts = rocksdb::Options::default();
    opts.create_missing_column_families(true);
    opts.create_if_missing(true);

    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let rbdb = rockbound::OptimisticTransactionDB::open(
        temp_dir.keep(),
        dbname,
        cfs.iter().map(|s| s.to_string()),
        &opts,
    )?;

    let db_ops = DbOpsConfig { retry_count: 5 };

    Ok((Arc::new(rbdb), db_ops))
}
