//! Crime Ledger - Recording and History
//!
//! `commit_crime` charges the actor and records the crime; `record_crime_history`
//! only records. The record is appended before the standing moves, so a
//! storage failure leaves the actor untouched.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::crime::{CrimeRecord, CrimeReport};
use crate::database::CrimeHistoryStore;
use crate::error::StorageResult;
use crate::events::{EventBus, Notification};
use crate::reputation::ReputationManager;
use crate::ActorId;

pub struct CrimeLedger {
    store: Arc<dyn CrimeHistoryStore>,
    reputation: Arc<ReputationManager>,
    events: EventBus,
    clock: Arc<dyn Clock>,
}

impl CrimeLedger {
    pub fn new(
        store: Arc<dyn CrimeHistoryStore>,
        reputation: Arc<ReputationManager>,
        events: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            reputation,
            events,
            clock,
        }
    }

    /// Record a crime and charge its points against the actor's standing.
    ///
    /// Returns `Ok(None)` without recording anything when the actor is not loaded.
    pub fn commit_crime(&self, report: CrimeReport) -> StorageResult<Option<CrimeRecord>> {
        if !self.reputation.is_loaded(&report.actor) {
            debug!(
                actor = %report.actor,
                kind = ?report.kind,
                "Crime ignored, actor not loaded"
            );
            return Ok(None);
        }

        let record = report.into_record(self.clock.now());
        self.store.append(&record)?;

        if self.reputation.apply_crime(&record.actor_id, record.points).is_none() {
            warn!(
                actor = %record.actor_id,
                crime_id = %record.id,
                "Actor unloaded before crime points were applied"
            );
        }

        info!(
            actor = %record.actor_id,
            kind = ?record.kind,
            points = record.points,
            victim = ?record.victim_id,
            "Crime committed"
        );

        self.events.publish(Notification::CrimeCommitted {
            actor: record.actor_id,
            kind: record.kind,
            points: record.points,
            victim: record.victim_id,
        });

        Ok(Some(record))
    }

    /// Append to history without touching standing or notifying anyone.
    pub fn record_crime_history(&self, report: CrimeReport) -> StorageResult<CrimeRecord> {
        let record = report.into_record(self.clock.now());
        self.store.append(&record)?;

        debug!(
            actor = %record.actor_id,
            kind = ?record.kind,
            "Crime recorded to history"
        );

        Ok(record)
    }

    /// Newest first, 1-based pages
    pub fn history(
        &self,
        actor: &ActorId,
        page: usize,
        page_size: usize,
    ) -> StorageResult<Vec<CrimeRecord>> {
        self.store.query(actor, page, page_size)
    }

    pub fn history_count(&self, actor: &ActorId) -> StorageResult<u64> {
        self.store.count(actor)
    }

    pub fn recent(&self, actor: &ActorId, limit: usize) -> StorageResult<Vec<CrimeRecord>> {
        self.store.query(actor, 1, limit)
    }

    pub fn crimes_against(&self, victim: &ActorId) -> StorageResult<Vec<CrimeRecord>> {
        self.store.by_victim(victim)
    }
}
