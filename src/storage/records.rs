//! Analysis Record Storage
//!
//! The seam between the orchestration engine and whatever persists
//! `ClinicalAnalysisRecord`s. The engine writes exactly twice per request:
//! the zero-progress record from `begin`, then the compiled (or failed)
//! record via `save`.
//!
//! Concurrent analysis of one case is rejected: while a case is claimed, a
//! second `begin` fails with `AppError::AnalysisInFlight`. The claim is held
//! by an `AnalysisClaim`, which releases it on drop, so a request whose
//! future is dropped mid-flight cannot leave its case locked.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};

use iatrikos_core::ClinicalAnalysisRecord;

use crate::utils::error::{AppError, AppResult};

#[async_trait]
pub trait AnalysisRecordStore: Send + Sync {
    /// Claim `case_id` and write its initial record.
    async fn begin(&self, case_id: &str) -> AppResult<ClinicalAnalysisRecord>;

    /// Replace the stored record. Refuses to lower `progress` of the same
    /// record.
    async fn save(&self, record: &ClinicalAnalysisRecord) -> AppResult<()>;

    /// Latest record for a case.
    async fn get(&self, case_id: &str) -> AppResult<Option<ClinicalAnalysisRecord>>;

    /// Release the claim taken by `begin`. Runs from `Drop`, so it must not
    /// block.
    fn release(&self, case_id: &str);

    /// Replace an unfinished record with its failed sentinel, then release
    /// the claim. Runs from `Drop`, so it must not block.
    fn abandon(&self, failed: &ClinicalAnalysisRecord) {
        self.release(&failed.case_id);
    }
}

/// Claim on a case, taken after a successful `begin`.
///
/// Dropping the claim releases the case. Dropping it before `complete` also
/// marks the stored record as failed.
pub struct AnalysisClaim {
    store: Arc<dyn AnalysisRecordStore>,
    case_id: String,
    failed: Option<ClinicalAnalysisRecord>,
}

impl AnalysisClaim {
    pub fn new(store: Arc<dyn AnalysisRecordStore>, initial: &ClinicalAnalysisRecord) -> Self {
        Self {
            store,
            case_id: initial.case_id.clone(),
            failed: Some(ClinicalAnalysisRecord::failed(&initial.case_id).continuing(initial)),
        }
    }

    /// The final record has been saved; dropping now only releases.
    pub fn complete(&mut self) {
        self.failed = None;
    }
}

impl Drop for AnalysisClaim {
    fn drop(&mut self) {
        match self.failed.take() {
            Some(failed) => {
                tracing::warn!(
                    case_id = %self.case_id,
                    "analysis request dropped before completion, marking record failed"
                );
                self.store.abandon(&failed);
            }
            None => self.store.release(&self.case_id),
        }
    }
}

/// Process-local record store.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: DashMap<String, ClinicalAnalysisRecord>,
    in_flight: DashSet<String>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, case_id: &str) -> bool {
        self.in_flight.contains(case_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl AnalysisRecordStore for InMemoryRecordStore {
    async fn begin(&self, case_id: &str) -> AppResult<ClinicalAnalysisRecord> {
        if !self.in_flight.insert(case_id.to_string()) {
            return Err(AppError::AnalysisInFlight(case_id.to_string()));
        }
        let record = ClinicalAnalysisRecord::initial(case_id);
        self.records.insert(case_id.to_string(), record.clone());
        Ok(record)
    }

    async fn save(&self, record: &ClinicalAnalysisRecord) -> AppResult<()> {
        match self.records.entry(record.case_id.clone()) {
            Entry::Occupied(mut existing) => {
                let current = existing.get();
                if current.id == record.id && record.progress < current.progress {
                    return Err(AppError::storage(format!(
                        "refusing to lower progress of record {} from {} to {}",
                        record.id, current.progress, record.progress
                    )));
                }
                existing.insert(record.clone());
            }
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }
        Ok(())
    }

    async fn get(&self, case_id: &str) -> AppResult<Option<ClinicalAnalysisRecord>> {
        Ok(self.records.get(case_id).map(|r| r.value().clone()))
    }

    fn release(&self, case_id: &str) {
        self.in_flight.remove(case_id);
    }

    fn abandon(&self, failed: &ClinicalAnalysisRecord) {
        if let Some(mut current) = self.records.get_mut(&failed.case_id) {
            if current.id == failed.id && !current.is_complete() {
                *current = failed.clone();
            }
        }
        self.release(&failed.case_id);
    }
}
