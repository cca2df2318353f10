//! Pending Crimes
//!
//! At most one pending crime per location; a second break at the same spot
//! replaces the first. Cancellation and the sweep both re-check expiry under
//! the entry lock, so a crime is either cancelled or confirmed, never both.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::clock::{is_expired, Clock};
use crate::ownership::BlockLocation;
use crate::ActorId;

/// An unauthorized break waiting out its grace period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCrime {
    pub location: BlockLocation,
    pub actor: ActorId,
    pub owner: ActorId,
    pub block_kind: String,
    pub points: i32,
    pub created_at: DateTime<Utc>,
}

pub struct PendingCrimeStore {
    entries: DashMap<BlockLocation, PendingCrime>,
    grace_period: Duration,
    clock: Arc<dyn Clock>,
}

impl PendingCrimeStore {
    pub fn new(grace_period: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            grace_period,
            clock,
        }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Last writer wins; returns the entry that was replaced.
    pub fn insert(&self, pending: PendingCrime) -> Option<PendingCrime> {
        self.entries.insert(pending.location.clone(), pending)
    }

    /// Remove the entry if the same actor put back the same kind of block in time.
    pub fn cancel(&self, location: &BlockLocation, actor: &ActorId, block_kind: &str) -> bool {
        let now = self.clock.now();
        let grace = self.grace_period;

        let removed = self.entries.remove_if(location, |_, pending| {
            pending.actor == *actor
                && pending.block_kind == block_kind
                && !is_expired(pending.created_at, now, grace)
        });

        if removed.is_some() {
            debug!(location = %location, actor = %actor, "Pending crime cancelled");
        }
        removed.is_some()
    }

    pub fn get(&self, location: &BlockLocation) -> Option<PendingCrime> {
        self.entries.get(location).map(|entry| entry.value().clone())
    }

    /// Remove and return every entry whose grace period has run out.
    pub fn sweep_expired(&self) -> Vec<PendingCrime> {
        let now = self.clock.now();
        let grace = self.grace_period;

        let candidates: Vec<BlockLocation> = self
            .entries
            .iter()
            .filter(|entry| is_expired(entry.created_at, now, grace))
            .map(|entry| entry.key().clone())
            .collect();

        // Re-check under the lock: a newer break may have replaced the entry.
        candidates
            .into_iter()
            .filter_map(|location| {
                self.entries
                    .remove_if(&location, |_, pending| {
                        is_expired(pending.created_at, now, grace)
                    })
                    .map(|(_, pending)| pending)
            })
            .collect()
    }

    /// Put back an entry taken by a sweep that could not be confirmed.
    /// A newer entry at the same location is kept.
    pub fn restore(&self, pending: PendingCrime) {
        self.entries
            .entry(pending.location.clone())
            .or_insert(pending);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
