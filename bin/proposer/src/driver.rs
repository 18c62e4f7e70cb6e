//! The proposer driver: a single ticker running the pending-proof poll, the
//! request queue, aggregate planning, and span-range derivation, all against
//! the durable request ledger.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pylon_common::time::now_secs;
use pylon_db::traits::ProofRequestDatabase;
use pylon_db::types::{ProofRequestEntry, ProofRequestStatus, ProofRequestType};
use pylon_derivation::{DerivationError, SpanBatchRange};
use pylon_primitives::Bytes32;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::*;

use crate::config::ProposerConfig;
use crate::errors::ProposerError;
use crate::gateway::{ProverGateway, PROOF_STATUS_FULFILLED, PROOF_STATUS_UNCLAIMED};

/// Read access to the on-chain output oracle.
#[async_trait]
pub trait OutputOracle: Sync + Send + 'static {
    /// Highest L2 block with a posted output.
    async fn latest_block_number(&self) -> anyhow::Result<u64>;

    /// Next L2 block an output is required for.
    async fn next_block_number(&self) -> anyhow::Result<u64>;
}

/// Supplies the L1 block an aggregate proof gets anchored to.  Recording the
/// hash on-chain is the submitter's job, not ours.
#[async_trait]
pub trait Checkpointer: Sync + Send + 'static {
    async fn checkpoint_block_hash(&self) -> anyhow::Result<(u64, Bytes32)>;
}

/// Span-range discovery for newly finalized L2 blocks.
#[async_trait]
pub trait RangeSource: Sync + Send + 'static {
    async fn finalized_l2_block(&self) -> anyhow::Result<u64>;

    async fn derive_span_batch_ranges(
        &self,
        start: u64,
        end: u64,
    ) -> Result<Vec<SpanBatchRange>, DerivationError>;
}

/// Owns every collaborator of the proof-request lifecycle.  One instance per
/// chain; all state lives in the ledger.
pub struct Driver<DB, G, O, C, R> {
    db: Arc<DB>,
    gateway: Arc<G>,
    oracle: Arc<O>,
    checkpointer: Arc<C>,
    range_source: Arc<R>,
    config: ProposerConfig,
    /// Failed rows whose successors were already inserted.  A failed row
    /// never mutates back, so without this a failed-on-server row would be
    /// re-split on every tick.
    retried: Arc<Mutex<HashSet<u64>>>,
}

impl<DB, G, O, C, R> Driver<DB, G, O, C, R>
where
    DB: ProofRequestDatabase + Sync + Send + 'static,
    G: ProverGateway,
    O: OutputOracle,
    C: Checkpointer,
    R: RangeSource,
{
    pub fn new(
        db: Arc<DB>,
        gateway: Arc<G>,
        oracle: Arc<O>,
        checkpointer: Arc<C>,
        range_source: Arc<R>,
        config: ProposerConfig,
    ) -> Self {
        Self {
            db,
            gateway,
            oracle,
            checkpointer,
            range_source,
            config,
            retried: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Runs the tick loop forever.  Pass failures are logged and retried on
    /// the next tick; records keep their prior state in between.
    pub async fn run(&self) {
        info!("proposer driver started");
        let mut ticker = interval(Duration::from_secs(self.config.loop_interval));

        loop {
            ticker.tick().await;

            if let Err(err) = self.process_pending_proofs().await {
                error!(%err, "error processing pending proofs");
            }
            if let Err(err) = self.request_queued_proofs().await {
                error!(%err, "error requesting queued proofs");
            }
            if let Err(err) = self.derive_agg_proofs().await {
                error!(%err, "error deriving agg proofs");
            }
            if let Err(err) = self.derive_span_ranges().await {
                error!(%err, "error deriving span ranges");
            }
        }
    }

    /// Pass A: retries requests that never reached the prover, then polls
    /// every in-flight request, landing proofs and failing out timeouts.
    pub(crate) async fn process_pending_proofs(&self) -> Result<(), ProposerError> {
        for (id, entry) in self.db.get_failed_on_server()? {
            if self.retried.lock().await.insert(id) {
                retry_request(self.db.as_ref(), id, &entry, now_secs())?;
            }
        }

        let pending = self.db.get_all_pending()?;
        debug!(count = pending.len(), "got pending proof requests from ledger");

        for (id, entry) in pending {
            let (status, proof) = match self.gateway.get_proof_status(&entry.prover_request_id).await
            {
                Ok(res) => res,
                Err(crate::gateway::GatewayError::Timeout) => {
                    // The poll timed out, not the proof; leave the record be.
                    warn!(%id, prover_id = %entry.prover_request_id, "status poll timed out");
                    continue;
                }
                Err(err) => {
                    error!(%id, prover_id = %entry.prover_request_id, %err, "failed to get proof status");
                    return Err(err.into());
                }
            };

            if status == PROOF_STATUS_FULFILLED {
                info!(%id, prover_id = %entry.prover_request_id, "proof fulfilled");
                self.db.add_proof(id, proof)?;
                continue;
            }

            let now = now_secs();
            let timed_out = now > entry.proof_request_time + self.config.proof_timeout;
            if timed_out || status == PROOF_STATUS_UNCLAIMED {
                warn!(
                    %id,
                    prover_id = %entry.prover_request_id,
                    %status,
                    "proof request timed out or unclaimed, failing"
                );
                self.db.update_status(id, ProofRequestStatus::Failed, now)?;
                retry_request(self.db.as_ref(), id, &entry, now)?;
            }
        }

        Ok(())
    }

    /// Pass B: takes the lowest unrequested record and dispatches it to the
    /// prover in a background task.  Aggs get their L1 checkpoint attached
    /// one tick before they are requested.
    pub(crate) async fn request_queued_proofs(
        &self,
    ) -> Result<Option<JoinHandle<()>>, ProposerError> {
        let Some((id, entry)) = self.db.next_unrequested()? else {
            return Ok(None);
        };

        if entry.request_type == ProofRequestType::Agg {
            if entry.l1_block_hash.is_none() {
                let (l1_number, l1_hash) = self.checkpointer.checkpoint_block_hash().await?;
                info!(%id, %l1_number, "checkpointing agg request");
                self.db
                    .attach_l1_checkpoint(entry.start_block, entry.end_block, l1_number, l1_hash)?;
                // Request on a later tick, off the checkpointed row.
                return Ok(None);
            }
            info!(%id, "found agg request with checkpointed L1 block");
        } else {
            let requested = self.db.count_by_status(ProofRequestStatus::Requested)?;
            if requested >= self.config.max_concurrent_span_requests {
                debug!("max concurrent span proof requests reached, waiting for next cycle");
                return Ok(None);
            }
        }

        // A slow prover must not stall polling, so the request itself runs
        // detached from the tick.
        let db = self.db.clone();
        let gateway = self.gateway.clone();
        let retried = self.retried.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) =
                request_proof(db.as_ref(), gateway.as_ref(), &retried, id, &entry).await
            {
                error!(%id, %err, "proof request task failed");
            }
        });
        Ok(Some(handle))
    }

    /// Pass C: asks the output oracle which L2 range the next output must
    /// cover and queues an aggregate once consecutive span proofs reach it.
    pub(crate) async fn derive_agg_proofs(&self) -> Result<(), ProposerError> {
        let latest = self.oracle.latest_block_number().await?;
        let min_to = self.oracle.next_block_number().await?;
        let from = latest + 1;

        if let Some(end) = self.db.try_create_agg_from_spans(from, min_to, now_secs())? {
            info!(%from, %end, "created new agg proof request");
        }
        Ok(())
    }

    /// Pass D: derives span ranges for L2 blocks finalized past the last
    /// span row and inserts them, chunked to the per-proof range cap.
    pub(crate) async fn derive_span_ranges(&self) -> Result<(), ProposerError> {
        let finalized = self.range_source.finalized_l2_block().await?;
        let start = match self.db.get_latest_span_end()? {
            Some(end) => end + 1,
            None => self.oracle.latest_block_number().await? + 1,
        };
        if finalized < start {
            return Ok(());
        }

        info!(%start, %finalized, "deriving span ranges for newly finalized blocks");
        let mut ranges = self
            .range_source
            .derive_span_batch_ranges(start, finalized)
            .await?;
        ranges.sort_by_key(|r| r.start);

        let now = now_secs();
        // Ranges from distinct channels may overlap; clip each against what
        // has already been queued so span rows never overlap in the ledger.
        let mut next_free = start;
        for range in ranges {
            let range_start = range.start.max(next_free);
            if range_start > range.end {
                continue;
            }

            let mut chunk_start = range_start;
            while chunk_start <= range.end {
                let chunk_end = range
                    .end
                    .min(chunk_start + self.config.max_block_range_per_span_proof - 1);
                let id = self
                    .db
                    .insert_request(ProofRequestType::Span, chunk_start, chunk_end, now)?;
                debug!(%id, %chunk_start, %chunk_end, "queued span proof request");
                chunk_start = chunk_end + 1;
            }
            next_free = range.end + 1;
        }

        Ok(())
    }
}

/// Marks the record requested, sends it to the prover, and stores the
/// assigned id.  Prover rejection fails the record and invokes the retry
/// policy in place.
async fn request_proof<DB: ProofRequestDatabase, G: ProverGateway>(
    db: &DB,
    gateway: &G,
    retried: &Mutex<HashSet<u64>>,
    id: u64,
    entry: &ProofRequestEntry,
) -> Result<(), ProposerError> {
    info!(%id, start = %entry.start_block, end = %entry.end_block, "requesting proof from prover");
    db.update_status(id, ProofRequestStatus::Requested, now_secs())?;

    let outcome = match entry.request_type {
        ProofRequestType::Span => {
            // The prover anchors span proofs on the previous confirmed block.
            gateway
                .request_span_proof(entry.start_block.saturating_sub(1), entry.end_block)
                .await
                .map_err(ProposerError::from)
        }
        ProofRequestType::Agg => {
            let l1_head = entry
                .l1_block_hash
                .ok_or(ProposerError::MissingCheckpoint(id))?;
            match db.get_consecutive_span_proofs(entry.start_block, entry.end_block) {
                Ok(subproofs) => gateway
                    .request_agg_proof(subproofs, l1_head)
                    .await
                    .map_err(ProposerError::from),
                Err(err) => Err(err.into()),
            }
        }
    };

    match outcome {
        Ok(prover_request_id) => {
            db.set_prover_request_id(id, &prover_request_id)?;
            Ok(())
        }
        Err(err) => {
            error!(%id, %err, "failed to request proof from the prover");
            let now = now_secs();
            db.update_status(id, ProofRequestStatus::Failed, now)?;
            retried.lock().await.insert(id);
            retry_request(db, id, entry, now)
        }
    }
}

/// Retry policy.  A failed agg is re-queued unchanged; a failed span is
/// assumed to have exhausted the prover on an oversized range and is split
/// in half.
fn retry_request<DB: ProofRequestDatabase>(
    db: &DB,
    id: u64,
    entry: &ProofRequestEntry,
    now: u64,
) -> Result<(), ProposerError> {
    match entry.request_type {
        ProofRequestType::Agg => {
            error!(%id, start = %entry.start_block, end = %entry.end_block, "agg proof failed, re-queueing to retry");
            db.insert_request(
                ProofRequestType::Agg,
                entry.start_block,
                entry.end_block,
                now,
            )?;
        }
        ProofRequestType::Span => {
            if entry.end_block == entry.start_block {
                return Err(ProposerError::UnsplittableRange(
                    entry.start_block,
                    entry.end_block,
                ));
            }
            info!(%id, start = %entry.start_block, end = %entry.end_block, "span proof failed, splitting in half to retry");
            let mid = entry.start_block + (entry.end_block - entry.start_block) / 2;
            db.insert_request(ProofRequestType::Span, entry.start_block, mid, now)?;
            db.insert_request(ProofRequestType::Span, mid + 1, entry.end_block, now)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use pylon_rocksdb::test_utils::get_rocksdb_tmp_instance;
    use pylon_rocksdb::ProofRequestDb;

    use super::*;
    use crate::config::ProposerConfig;
    use crate::gateway::GatewayError;

    struct MockGateway {
        next_id: AtomicU64,
        statuses: Mutex<HashMap<String, (String, Vec<u8>)>>,
        agg_calls: Mutex<Vec<(usize, Bytes32)>>,
        reject_requests: bool,
    }

    impl MockGateway {
        fn new() -> Self {
            Self {
                next_id: AtomicU64::new(1),
                statuses: Mutex::new(HashMap::new()),
                agg_calls: Mutex::new(Vec::new()),
                reject_requests: false,
            }
        }

        fn rejecting() -> Self {
            Self {
                reject_requests: true,
                ..Self::new()
            }
        }

        fn set_status(&self, prover_id: &str, status: &str, proof: Vec<u8>) {
            self.statuses
                .lock()
                .unwrap()
                .insert(prover_id.to_owned(), (status.to_owned(), proof));
        }
    }

    #[async_trait]
    impl ProverGateway for MockGateway {
        async fn request_span_proof(&self, _start: u64, _end: u64) -> Result<String, GatewayError> {
            if self.reject_requests {
                return Err(GatewayError::BadResponse("rejected".into()));
            }
            Ok(format!("p{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
        }

        async fn request_agg_proof(
            &self,
            subproofs: Vec<Vec<u8>>,
            l1_head: Bytes32,
        ) -> Result<String, GatewayError> {
            if self.reject_requests {
                return Err(GatewayError::BadResponse("rejected".into()));
            }
            self.agg_calls.lock().unwrap().push((subproofs.len(), l1_head));
            Ok(format!("p{}", self.next_id.fetch_add(1, Ordering::SeqCst)))
        }

        async fn get_proof_status(
            &self,
            proof_id: &str,
        ) -> Result<(String, Vec<u8>), GatewayError> {
            Ok(self
                .statuses
                .lock()
                .unwrap()
                .get(proof_id)
                .cloned()
                .unwrap_or(("PROOF_REQUESTED".to_owned(), Vec::new())))
        }
    }

    struct MockOracle {
        latest: u64,
        next: u64,
    }

    #[async_trait]
    impl OutputOracle for MockOracle {
        async fn latest_block_number(&self) -> anyhow::Result<u64> {
            Ok(self.latest)
        }

        async fn next_block_number(&self) -> anyhow::Result<u64> {
            Ok(self.next)
        }
    }

    struct MockCheckpointer;

    #[async_trait]
    impl Checkpointer for MockCheckpointer {
        async fn checkpoint_block_hash(&self) -> anyhow::Result<(u64, Bytes32)> {
            Ok((777, "0xabcd".parse().unwrap()))
        }
    }

    struct MockRangeSource {
        finalized: u64,
        ranges: Vec<SpanBatchRange>,
    }

    #[async_trait]
    impl RangeSource for MockRangeSource {
        async fn finalized_l2_block(&self) -> anyhow::Result<u64> {
            Ok(self.finalized)
        }

        async fn derive_span_batch_ranges(
            &self,
            _start: u64,
            _end: u64,
        ) -> Result<Vec<SpanBatchRange>, DerivationError> {
            Ok(self.ranges.clone())
        }
    }

    type TestDriver = Driver<ProofRequestDb, MockGateway, MockOracle, MockCheckpointer, MockRangeSource>;

    fn test_driver(
        gateway: MockGateway,
        oracle: MockOracle,
        range_source: MockRangeSource,
        config: ProposerConfig,
    ) -> TestDriver {
        let (rbdb, ops) = get_rocksdb_tmp_instance().unwrap();
        let db = Arc::new(ProofRequestDb::new(rbdb, ops));
        Driver::new(
            db,
            Arc::new(gateway),
            Arc::new(oracle),
            Arc::new(MockCheckpointer),
            Arc::new(range_source),
            config,
        )
    }

    fn default_driver(gateway: MockGateway) -> TestDriver {
        test_driver(
            gateway,
            MockOracle { latest: 0, next: 0 },
            MockRangeSource {
                finalized: 0,
                ranges: vec![],
            },
            ProposerConfig::default(),
        )
    }

    fn spans_by_range(db: &ProofRequestDb) -> Vec<(u64, u64, ProofRequestStatus)> {
        let mut out = Vec::new();
        let mut id = 0;
        while let Some(entry) = db.get_request(id).unwrap() {
            if entry.request_type == ProofRequestType::Span {
                out.push((entry.start_block, entry.end_block, entry.status));
            }
            id += 1;
        }
        out.sort_by_key(|(start, end, _)| (*start, *end));
        out
    }

    #[tokio::test]
    async fn test_timed_out_request_fails_and_splits() {
        let gateway = MockGateway::new();
        gateway.set_status("p-slow", "PROOF_WITNESS_GENERATION", vec![]);
        let driver = default_driver(gateway);

        let id = driver
            .db
            .insert_request(ProofRequestType::Span, 100, 199, 1000)
            .unwrap();
        // Backdated request time puts the record past its proof timeout.
        let stale = now_secs() - driver.config.proof_timeout - 10;
        driver
            .db
            .update_status(id, ProofRequestStatus::Requested, stale)
            .unwrap();
        driver.db.set_prover_request_id(id, "p-slow").unwrap();

        driver.process_pending_proofs().await.unwrap();

        assert_eq!(
            driver.db.get_request(id).unwrap().unwrap().status,
            ProofRequestStatus::Failed
        );
        assert_eq!(
            spans_by_range(driver.db.as_ref()),
            vec![
                (100, 149, ProofRequestStatus::Unrequested),
                (100, 199, ProofRequestStatus::Failed),
                (150, 199, ProofRequestStatus::Unrequested),
            ]
        );
    }

    #[tokio::test]
    async fn test_unclaimed_fails_immediately() {
        let gateway = MockGateway::new();
        gateway.set_status("p-1", PROOF_STATUS_UNCLAIMED, vec![]);
        let driver = default_driver(gateway);

        let id = driver
            .db
            .insert_request(ProofRequestType::Span, 0, 9, 1000)
            .unwrap();
        driver
            .db
            .update_status(id, ProofRequestStatus::Requested, now_secs())
            .unwrap();
        driver.db.set_prover_request_id(id, "p-1").unwrap();

        driver.process_pending_proofs().await.unwrap();

        assert_eq!(
            driver.db.get_request(id).unwrap().unwrap().status,
            ProofRequestStatus::Failed
        );
        // Split successors, despite the request being well within timeout.
        assert_eq!(
            driver
                .db
                .count_by_status(ProofRequestStatus::Unrequested)
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_fulfilled_proof_lands() {
        let gateway = MockGateway::new();
        gateway.set_status("p-1", PROOF_STATUS_FULFILLED, vec![7, 7, 7]);
        let driver = default_driver(gateway);

        let id = driver
            .db
            .insert_request(ProofRequestType::Span, 0, 9, 1000)
            .unwrap();
        driver
            .db
            .update_status(id, ProofRequestStatus::Requested, now_secs())
            .unwrap();
        driver.db.set_prover_request_id(id, "p-1").unwrap();

        driver.process_pending_proofs().await.unwrap();

        let entry = driver.db.get_request(id).unwrap().unwrap();
        assert_eq!(entry.status, ProofRequestStatus::Complete);
        assert_eq!(entry.proof, vec![7, 7, 7]);
    }

    #[tokio::test]
    async fn test_agg_retry_preserves_range() {
        let driver = default_driver(MockGateway::new());

        let id = driver
            .db
            .insert_request(ProofRequestType::Agg, 1, 1000, 1000)
            .unwrap();
        driver
            .db
            .update_status(id, ProofRequestStatus::Failed, 1001)
            .unwrap();

        driver.process_pending_proofs().await.unwrap();

        let (new_id, successor) = driver.db.next_unrequested().unwrap().unwrap();
        assert_ne!(new_id, id);
        assert_eq!(successor.request_type, ProofRequestType::Agg);
        assert_eq!((successor.start_block, successor.end_block), (1, 1000));
        assert_eq!(
            driver
                .db
                .count_by_status(ProofRequestStatus::Unrequested)
                .unwrap(),
            1,
            "exactly one retry row"
        );
    }

    #[tokio::test]
    async fn test_concurrency_cap_holds_third_span_back() {
        let config = ProposerConfig {
            max_concurrent_span_requests: 2,
            ..Default::default()
        };
        let driver = test_driver(
            MockGateway::new(),
            MockOracle { latest: 0, next: 0 },
            MockRangeSource {
                finalized: 0,
                ranges: vec![],
            },
            config,
        );

        for i in 0..3u64 {
            driver
                .db
                .insert_request(ProofRequestType::Span, i * 10, i * 10 + 9, 1000)
                .unwrap();
        }

        for _ in 0..3 {
            if let Some(handle) = driver.request_queued_proofs().await.unwrap() {
                handle.await.unwrap();
            }
        }

        assert_eq!(
            driver
                .db
                .count_by_status(ProofRequestStatus::Requested)
                .unwrap(),
            2
        );
        assert_eq!(
            driver
                .db
                .count_by_status(ProofRequestStatus::Unrequested)
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_rejected_span_request_fails_and_splits() {
        let driver = default_driver(MockGateway::rejecting());

        let id = driver
            .db
            .insert_request(ProofRequestType::Span, 0, 99, 1000)
            .unwrap();

        let handle = driver.request_queued_proofs().await.unwrap().unwrap();
        handle.await.unwrap();

        assert_eq!(
            driver.db.get_request(id).unwrap().unwrap().status,
            ProofRequestStatus::Failed
        );
        assert_eq!(
            driver
                .db
                .count_by_status(ProofRequestStatus::Unrequested)
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_agg_checkpoints_then_requests() {
        let driver = default_driver(MockGateway::new());

        // Completed spans tiling [1, 1000].
        for (start, end) in [(1u64, 600u64), (601, 1000)] {
            let id = driver
                .db
                .insert_request(ProofRequestType::Span, start, end, 1000)
                .unwrap();
            driver
                .db
                .update_status(id, ProofRequestStatus::Requested, 1001)
                .unwrap();
            driver.db.set_prover_request_id(id, "p-span").unwrap();
            driver.db.add_proof(id, vec![1]).unwrap();
        }
        let agg_id = driver
            .db
            .insert_request(ProofRequestType::Agg, 1, 1000, 1000)
            .unwrap();

        // First tick checkpoints and yields.
        assert!(driver.request_queued_proofs().await.unwrap().is_none());
        let entry = driver.db.get_request(agg_id).unwrap().unwrap();
        assert_eq!(entry.l1_block_number, 777);
        assert!(entry.l1_block_hash.is_some());
        assert_eq!(entry.status, ProofRequestStatus::Unrequested);

        // Second tick requests the proof with the tiled subproofs.
        let handle = driver.request_queued_proofs().await.unwrap().unwrap();
        handle.await.unwrap();

        let entry = driver.db.get_request(agg_id).unwrap().unwrap();
        assert_eq!(entry.status, ProofRequestStatus::Requested);
        assert!(!entry.prover_request_id.is_empty());

        let agg_calls = driver.gateway.agg_calls.lock().unwrap();
        assert_eq!(agg_calls.len(), 1);
        assert_eq!(agg_calls[0].0, 2, "two span subproofs");
        assert_eq!(agg_calls[0].1, "0xabcd".parse().unwrap());
    }

    #[tokio::test]
    async fn test_derive_agg_proofs_consults_oracle() {
        let driver = test_driver(
            MockGateway::new(),
            MockOracle {
                latest: 500,
                next: 600,
            },
            MockRangeSource {
                finalized: 0,
                ranges: vec![],
            },
            ProposerConfig::default(),
        );

        for (start, end) in [(501u64, 560u64), (561, 600), (601, 640)] {
            let id = driver
                .db
                .insert_request(ProofRequestType::Span, start, end, 1000)
                .unwrap();
            driver
                .db
                .update_status(id, ProofRequestStatus::Requested, 1001)
                .unwrap();
            driver.db.set_prover_request_id(id, "p-span").unwrap();
            driver.db.add_proof(id, vec![1]).unwrap();
        }

        driver.derive_agg_proofs().await.unwrap();

        let (_, agg) = driver.db.next_unrequested().unwrap().unwrap();
        assert_eq!(agg.request_type, ProofRequestType::Agg);
        assert_eq!((agg.start_block, agg.end_block), (501, 640));
    }

    #[tokio::test]
    async fn test_derive_span_ranges_chunks_and_clips() {
        let config = ProposerConfig {
            max_block_range_per_span_proof: 10,
            ..Default::default()
        };
        let driver = test_driver(
            MockGateway::new(),
            MockOracle { latest: 9, next: 0 },
            MockRangeSource {
                finalized: 25,
                // Overlapping ranges across channels are allowed upstream.
                ranges: vec![
                    SpanBatchRange { start: 10, end: 21 },
                    SpanBatchRange { start: 20, end: 25 },
                ],
            },
            config,
        );

        driver.derive_span_ranges().await.unwrap();

        assert_eq!(
            spans_by_range(driver.db.as_ref()),
            vec![
                (10, 19, ProofRequestStatus::Unrequested),
                (20, 21, ProofRequestStatus::Unrequested),
                (22, 25, ProofRequestStatus::Unrequested),
            ]
        );
    }

    #[tokio::test]
    async fn test_single_block_span_cannot_split() {
        let driver = default_driver(MockGateway::new());

        let id = driver
            .db
            .insert_request(ProofRequestType::Span, 42, 42, 1000)
            .unwrap();
        driver
            .db
            .update_status(id, ProofRequestStatus::Failed, 1001)
            .unwrap();

        let err = driver.process_pending_proofs().await.unwrap_err();
        assert!(matches!(err, ProposerError::UnsplittableRange(42, 42)));
    }
}
