//! Ownership Engine - Access Checks and Grace-Period Crimes
//!
//! ## Per-location State Machine
//!
//! ```text
//!   NONE ──unauthorized break──► PENDING ──same actor, same block, in time──► CANCELLED
//!                                   │
//!                                   └──grace period elapsed (sweep)──► CONFIRMED ──► CrimeLedger
//! ```
//!
//! Containers skip the grace period: breaking one or taking from one without
//! access is an immediate crime. Ownership records are read from the store on
//! every call and never cached here.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::CrimeConfig;
use crate::crime::{CrimeKind, CrimeLedger, CrimeRecord, CrimeReport};
use crate::database::OwnershipStore;
use crate::error::StorageResult;
use crate::ownership::{Block, BlockLocation, OwnershipRecord, PendingCrime, PendingCrimeStore};
use crate::trust::TrustGate;
use crate::ActorId;

/// What a block break turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreakOutcome {
    /// Nobody owned the location
    Unowned,
    /// The owner broke their own block; the claim is released
    OwnerBroke,
    /// A trusted accessor broke it; the claim is released
    Trusted,
    /// Grace period started
    Pending(PendingCrime),
    /// Container destroyed; recorded at once (`None` if the actor was not loaded)
    ImmediateCrime(Option<CrimeRecord>),
}

/// What a block placement turned into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// Put back in time; the pending crime is gone and the owner keeps the claim
    Restored,
    /// New claim for the placing actor
    Claimed,
    /// Location already owned; claim unchanged
    AlreadyOwned,
}

pub struct OwnershipEngine {
    store: Arc<dyn OwnershipStore>,
    trust: Arc<TrustGate>,
    ledger: Arc<CrimeLedger>,
    pending: PendingCrimeStore,
    points: CrimeConfig,
    clock: Arc<dyn Clock>,
}

impl OwnershipEngine {
    pub fn new(
        store: Arc<dyn OwnershipStore>,
        trust: Arc<TrustGate>,
        ledger: Arc<CrimeLedger>,
        pending: PendingCrimeStore,
        points: CrimeConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            trust,
            ledger,
            pending,
            points,
            clock,
        }
    }

    // Ownership records

    pub fn register_ownership(
        &self,
        location: &BlockLocation,
        owner: &ActorId,
    ) -> StorageResult<()> {
        self.store.set_owner(location, *owner, self.clock.now())?;
        debug!(location = %location, owner = %owner, "Ownership registered");
        Ok(())
    }

    pub fn remove_ownership(&self, location: &BlockLocation) -> StorageResult<bool> {
        self.store.remove_owner(location)
    }

    pub fn owner_of(&self, location: &BlockLocation) -> StorageResult<Option<OwnershipRecord>> {
        self.store.get_owner(location)
    }

    pub fn is_protected(&self, location: &BlockLocation) -> StorageResult<bool> {
        Ok(self.store.get_owner(location)?.is_some())
    }

    pub fn blocks_owned_by(&self, owner: &ActorId) -> StorageResult<Vec<BlockLocation>> {
        self.store.blocks_owned_by(owner)
    }

    /// Unowned, owned by `actor`, or owner trusts `actor`
    pub fn can_access(&self, location: &BlockLocation, actor: &ActorId) -> StorageResult<bool> {
        match self.store.get_owner(location)? {
            None => Ok(true),
            Some(record) => self.owner_permits(&record.owner, actor),
        }
    }

    fn owner_permits(&self, owner: &ActorId, actor: &ActorId) -> StorageResult<bool> {
        if owner == actor {
            return Ok(true);
        }
        self.trust.is_trusted(owner, actor)
    }

    // Pending crimes

    /// Start a grace period. A pending crime already at the location is replaced.
    pub fn add_pending_crime(
        &self,
        location: &BlockLocation,
        actor: &ActorId,
        owner: &ActorId,
        block_kind: &str,
        points: i32,
    ) -> PendingCrime {
        let pending = PendingCrime {
            location: location.clone(),
            actor: *actor,
            owner: *owner,
            block_kind: block_kind.to_string(),
            points,
            created_at: self.clock.now(),
        };

        if let Some(replaced) = self.pending.insert(pending.clone()) {
            debug!(
                location = %location,
                replaced_actor = %replaced.actor,
                "Pending crime replaced by a newer break"
            );
        }

        debug!(
            location = %location,
            actor = %actor,
            owner = %owner,
            block = block_kind,
            "Pending crime started"
        );
        pending
    }

    pub fn cancel_pending_crime(
        &self,
        location: &BlockLocation,
        actor: &ActorId,
        block_kind: &str,
    ) -> bool {
        self.pending.cancel(location, actor, block_kind)
    }

    pub fn pending_at(&self, location: &BlockLocation) -> Option<PendingCrime> {
        self.pending.get(location)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Take every expired pending crime out of the set without recording it
    pub fn sweep_expired_pending_crimes(&self) -> Vec<PendingCrime> {
        self.pending.sweep_expired()
    }

    /// Sweep and turn every expired pending crime into a destruction crime.
    ///
    /// If the ledger fails, the failed entry and everything not yet processed
    /// go back into the pending set and the error is returned.
    pub fn confirm_expired(&self) -> StorageResult<Vec<CrimeRecord>> {
        let expired = self.pending.sweep_expired();
        let mut confirmed = Vec::with_capacity(expired.len());
        let mut remaining = expired.into_iter();

        while let Some(pending) = remaining.next() {
            match self.confirm(&pending) {
                Ok(Some(record)) => confirmed.push(record),
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        location = %pending.location,
                        actor = %pending.actor,
                        error = %e,
                        "Failed to confirm pending crime"
                    );
                    self.pending.restore(pending);
                    for rest in remaining {
                        self.pending.restore(rest);
                    }
                    return Err(e);
                }
            }
        }

        if !confirmed.is_empty() {
            info!(count = confirmed.len(), "Confirmed pending crimes");
        }
        Ok(confirmed)
    }

    fn confirm(&self, pending: &PendingCrime) -> StorageResult<Option<CrimeRecord>> {
        let report = CrimeReport::new(pending.actor, CrimeKind::Destroy, pending.points)
            .against(pending.owner)
            .at(pending.location.clone())
            .detail(pending.block_kind.clone());

        let record = self.ledger.commit_crime(report)?;
        if record.is_none() {
            debug!(
                actor = %pending.actor,
                location = %pending.location,
                "Pending crime dropped, actor no longer loaded"
            );
        }

        self.release_claim(&pending.location, &pending.owner);
        Ok(record)
    }

    /// Drop the victim's claim on a block that is gone for good. The crime is
    /// already charged at this point, so a failure is logged, not returned.
    fn release_claim(&self, location: &BlockLocation, owner: &ActorId) {
        let released = self.store.get_owner(location).and_then(|current| match current {
            Some(current) if current.owner == *owner => self.store.remove_owner(location),
            _ => Ok(false),
        });

        if let Err(e) = released {
            warn!(
                location = %location,
                owner = %owner,
                error = %e,
                "Failed to release claim after crime"
            );
        }
    }

    // World events

    pub fn on_block_break(
        &self,
        location: &BlockLocation,
        actor: &ActorId,
        block: &Block,
    ) -> StorageResult<BreakOutcome> {
        let Some(record) = self.store.get_owner(location)? else {
            return Ok(BreakOutcome::Unowned);
        };
        let owner = record.owner;

        if owner == *actor {
            self.store.remove_owner(location)?;
            return Ok(BreakOutcome::OwnerBroke);
        }

        if self.trust.is_trusted(&owner, actor)? {
            self.store.remove_owner(location)?;
            return Ok(BreakOutcome::Trusted);
        }

        if block.container {
            let report = CrimeReport::new(*actor, CrimeKind::Destroy, self.points.destroy_points)
                .against(owner)
                .at(location.clone())
                .detail(block.kind.clone());
            let crime = self.ledger.commit_crime(report)?;
            self.release_claim(location, &owner);
            return Ok(BreakOutcome::ImmediateCrime(crime));
        }

        let pending = self.add_pending_crime(
            location,
            actor,
            &owner,
            &block.kind,
            self.points.destroy_points,
        );
        Ok(BreakOutcome::Pending(pending))
    }

    pub fn on_block_place(
        &self,
        location: &BlockLocation,
        actor: &ActorId,
        block: &Block,
    ) -> StorageResult<PlaceOutcome> {
        if self.cancel_pending_crime(location, actor, &block.kind) {
            return Ok(PlaceOutcome::Restored);
        }

        if self.store.get_owner(location)?.is_some() {
            return Ok(PlaceOutcome::AlreadyOwned);
        }

        self.register_ownership(location, actor)?;
        Ok(PlaceOutcome::Claimed)
    }

    /// Taking items from a container without access is theft.
    /// Returns the recorded crime, if any.
    pub fn on_container_withdraw(
        &self,
        location: &BlockLocation,
        actor: &ActorId,
        detail: Option<&str>,
    ) -> StorageResult<Option<CrimeRecord>> {
        let Some(record) = self.store.get_owner(location)? else {
            return Ok(None);
        };
        if self.owner_permits(&record.owner, actor)? {
            return Ok(None);
        }

        let mut report = CrimeReport::new(*actor, CrimeKind::Theft, self.points.theft_points)
            .against(record.owner)
            .at(location.clone());
        if let Some(detail) = detail {
            report = report.detail(detail);
        }
        self.ledger.commit_crime(report)
    }

    /// Owned locations are never affected by explosions; returns what may blow up.
    pub fn filter_explosion(
        &self,
        locations: Vec<BlockLocation>,
    ) -> StorageResult<Vec<BlockLocation>> {
        let before = locations.len();
        let mut allowed = Vec::with_capacity(before);
        for location in locations {
            if self.store.get_owner(&location)?.is_none() {
                allowed.push(location);
            }
        }

        if allowed.len() < before {
            debug!(
                protected = before - allowed.len(),
                "Protected blocks removed from explosion"
            );
        }
        Ok(allowed)
    }
}
