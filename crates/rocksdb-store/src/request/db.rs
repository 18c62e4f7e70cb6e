use std::sync::Arc;

use pylon_db::{
    errors::DbError,
    traits::ProofRequestDatabase,
    types::{ProofRequestEntry, ProofRequestStatus, ProofRequestType},
    DbResult,
};
use pylon_primitives::Bytes32;
use rockbound::{OptimisticTransactionDB, SchemaDBOperationsExt, TransactionRetry};

use super::schemas::ProofRequestSchema;
use crate::DbOpsConfig;

#[derive(Debug)]
pub struct ProofRequestDb {
    db: Arc<OptimisticTransactionDB>,
    ops: DbOpsConfig,
}

impl ProofRequestDb {
    pub fn new(db: Arc<OptimisticTransactionDB>, ops: DbOpsConfig) -> Self {
        Self { db, ops }
    }

    /// Full ascending scan of the request table.  The table stays small (one
    /// row per proof ever requested) so linear walks are the query plan.
    fn entries(&self) -> DbResult<Vec<(u64, ProofRequestEntry)>> {
        let mut iterator = self.db.iter::<ProofRequestSchema>()?;
        iterator.seek_to_first();

        let mut out = Vec::new();
        for res in iterator {
            let (id, entry) = res?.into_tuple();
            out.push((id, entry));
        }
        Ok(out)
    }

    /// Completed span rows at or after `from`, ascending by start block.
    fn completed_spans_from(&self, from: u64) -> DbResult<Vec<ProofRequestEntry>> {
        let mut spans: Vec<ProofRequestEntry> = self
            .entries()?
            .into_iter()
            .map(|(_, e)| e)
            .filter(|e| {
                e.request_type == ProofRequestType::Span
                    && e.status == ProofRequestStatus::Complete
                    && e.start_block >= from
            })
            .collect();
        spans.sort_by_key(|e| e.start_block);
        Ok(spans)
    }

    fn mutate_entry<F>(&self, id: u64, mutate: F) -> DbResult<ProofRequestEntry>
    where
        F: Fn(&mut ProofRequestEntry) -> DbResult<()>,
    {
        self.db
            .with_optimistic_txn(TransactionRetry::Count(self.ops.retry_count), |txn| {
                let mut entry = txn
                    .get::<ProofRequestSchema>(&id)?
                    .ok_or(DbError::EntryNotFound(id))?;
                mutate(&mut entry)?;
                txn.put::<ProofRequestSchema>(&id, &entry)?;
                Ok(entry)
            })
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }
}

impl ProofRequestDatabase for ProofRequestDb {
    fn insert_request(
        &self,
        request_type: ProofRequestType,
        start_block: u64,
        end_block: u64,
        request_added_time: u64,
    ) -> DbResult<u64> {
        self.db
            .with_optimistic_txn(TransactionRetry::Count(self.ops.retry_count), |txn| {
                let id = rockbound::utils::get_last::<ProofRequestSchema>(txn)?
                    .map(|(x, _)| x + 1)
                    .unwrap_or(0);

                let entry =
                    ProofRequestEntry::new(request_type, start_block, end_block, request_added_time);
                txn.put::<ProofRequestSchema>(&id, &entry)?;

                Ok::<_, DbError>(id)
            })
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    fn get_request(&self, id: u64) -> DbResult<Option<ProofRequestEntry>> {
        Ok(self.db.get::<ProofRequestSchema>(&id)?)
    }

    fn next_unrequested(&self) -> DbResult<Option<(u64, ProofRequestEntry)>> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|(_, e)| e.status == ProofRequestStatus::Unrequested))
    }

    fn count_by_status(&self, status: ProofRequestStatus) -> DbResult<u64> {
        Ok(self
            .entries()?
            .iter()
            .filter(|(_, e)| e.status == status)
            .count() as u64)
    }

    fn get_failed_on_server(&self) -> DbResult<Vec<(u64, ProofRequestEntry)>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(_, e)| e.is_failed_on_server())
            .collect())
    }

    fn get_all_pending(&self) -> DbResult<Vec<(u64, ProofRequestEntry)>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|(_, e)| e.is_pending())
            .collect())
    }

    fn set_prover_request_id(&self, id: u64, prover_request_id: &str) -> DbResult<()> {
        self.mutate_entry(id, |entry| {
            entry.prover_request_id = prover_request_id.to_owned();
            Ok(())
        })?;
        Ok(())
    }

    fn update_status(&self, id: u64, status: ProofRequestStatus, now: u64) -> DbResult<()> {
        self.mutate_entry(id, |entry| {
            entry.status.transition(status, id)?;
            if status == ProofRequestStatus::Requested {
                entry.proof_request_time = now;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn add_proof(&self, id: u64, proof: Vec<u8>) -> DbResult<()> {
        self.mutate_entry(id, |entry| {
            if entry.status != ProofRequestStatus::Requested || proof.is_empty() {
                return Err(DbError::ProofNotAttachable(id, entry.status));
            }
            entry.status = ProofRequestStatus::Complete;
            entry.proof = proof.clone();
            Ok(())
        })?;
        Ok(())
    }

    fn attach_l1_checkpoint(
        &self,
        start_block: u64,
        end_block: u64,
        l1_block_number: u64,
        l1_block_hash: Bytes32,
    ) -> DbResult<ProofRequestEntry> {
        let (id, _) = self
            .entries()?
            .into_iter()
            .find(|(_, e)| {
                e.request_type == ProofRequestType::Agg
                    && e.status == ProofRequestStatus::Unrequested
                    && e.start_block == start_block
                    && e.end_block == end_block
            })
            .ok_or(DbError::AggRequestNotFound(start_block, end_block))?;

        self.mutate_entry(id, |entry| {
            entry.l1_block_number = l1_block_number;
            entry.l1_block_hash = Some(l1_block_hash);
            Ok(())
        })
    }

    fn get_consecutive_span_proofs(&self, start: u64, end: u64) -> DbResult<Vec<Vec<u8>>> {
        let spans = self.completed_spans_from(start)?;

        let mut proofs = Vec::new();
        let mut cursor = start;
        loop {
            let span = spans
                .iter()
                .find(|e| e.start_block == cursor)
                .ok_or(DbError::MissingSpanProof(start, end))?;
            if span.end_block > end {
                // A span sticking out past the requested end cannot tile it.
                return Err(DbError::MissingSpanProof(start, end));
            }
            proofs.push(span.proof.clone());
            if span.end_block == end {
                return Ok(proofs);
            }
            cursor = span.end_block + 1;
        }
    }

    fn try_create_agg_from_spans(&self, from: u64, min_to: u64, now: u64) -> DbResult<Option<u64>> {
        let spans = self.completed_spans_from(from)?;

        let Some(first) = spans.first() else {
            return Ok(None);
        };
        if first.start_block != from {
            return Ok(None);
        }

        let mut end = first.end_block;
        for span in &spans[1..] {
            if span.start_block != end + 1 {
                break;
            }
            end = span.end_block;
        }

        if end < min_to {
            return Ok(None);
        }

        self.insert_request(ProofRequestType::Agg, from, end, now)?;
        Ok(Some(end))
    }

    fn get_latest_span_end(&self) -> DbResult<Option<u64>> {
        Ok(self
            .entries()?
            .iter()
            .filter(|(_, e)| e.request_type == ProofRequestType::Span)
            .map(|(_, e)| e.end_block)
            .max())
    }
}
