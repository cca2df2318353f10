//! In-Memory Repositories
//!
//! DashMap-backed implementations of the storage traits. All of them share an
//! [`Availability`] switch so a whole database can be taken "offline" to
//! exercise the failure paths.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::crime::CrimeRecord;
use crate::database::{CrimeHistoryStore, OwnershipStore, StandingStore, TrustStore};
use crate::error::{StorageError, StorageResult};
use crate::ownership::{BlockLocation, OwnershipRecord};
use crate::reputation::{ActorStanding, ReputationTier};
use crate::trust::TrustState;
use crate::ActorId;

/// Shared on/off switch for a set of in-memory stores
#[derive(Debug, Clone)]
pub struct Availability(Arc<AtomicBool>);

impl Availability {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn set(&self, available: bool) {
        self.0.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self, op: &str) -> StorageResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StorageError::Unavailable(format!("{} failed: store offline", op)))
        }
    }
}

impl Default for Availability {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Standings
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStandingStore {
    records: DashMap<ActorId, ActorStanding>,
    availability: Availability,
}

impl MemoryStandingStore {
    pub fn new(availability: Availability) -> Self {
        Self {
            records: DashMap::new(),
            availability,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl StandingStore for MemoryStandingStore {
    fn load(&self, actor: &ActorId) -> StorageResult<Option<ActorStanding>> {
        self.availability.check("load standing")?;
        Ok(self.records.get(actor).map(|r| r.value().clone()))
    }

    fn save(&self, standing: &ActorStanding) -> StorageResult<()> {
        self.availability.check("save standing")?;
        self.records.insert(standing.actor_id, standing.clone());
        Ok(())
    }

    fn with_tier(&self, tier: ReputationTier) -> StorageResult<Vec<ActorStanding>> {
        self.availability.check("query standings by tier")?;
        Ok(self
            .records
            .iter()
            .filter(|r| r.value().tier() == tier)
            .map(|r| r.value().clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryOwnershipStore {
    claims: DashMap<BlockLocation, OwnershipRecord>,
    availability: Availability,
}

impl MemoryOwnershipStore {
    pub fn new(availability: Availability) -> Self {
        Self {
            claims: DashMap::new(),
            availability,
        }
    }
}

impl OwnershipStore for MemoryOwnershipStore {
    fn set_owner(
        &self,
        location: &BlockLocation,
        owner: ActorId,
        placed_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        self.availability.check("set owner")?;
        self.claims.insert(
            location.clone(),
            OwnershipRecord {
                location: location.clone(),
                owner,
                placed_at,
            },
        );
        Ok(())
    }

    fn get_owner(&self, location: &BlockLocation) -> StorageResult<Option<OwnershipRecord>> {
        self.availability.check("get owner")?;
        Ok(self.claims.get(location).map(|r| r.value().clone()))
    }

    fn remove_owner(&self, location: &BlockLocation) -> StorageResult<bool> {
        self.availability.check("remove owner")?;
        Ok(self.claims.remove(location).is_some())
    }

    fn blocks_owned_by(&self, owner: &ActorId) -> StorageResult<Vec<BlockLocation>> {
        self.availability.check("list owned blocks")?;
        let mut blocks: Vec<BlockLocation> = self
            .claims
            .iter()
            .filter(|r| r.value().owner == *owner)
            .map(|r| r.key().clone())
            .collect();
        blocks.sort();
        Ok(blocks)
    }
}

// ---------------------------------------------------------------------------
// Crime history
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryCrimeHistoryStore {
    /// actor -> records in append order
    by_actor: DashMap<ActorId, Vec<CrimeRecord>>,
    /// victim -> records in append order
    by_victim: DashMap<ActorId, Vec<CrimeRecord>>,
    availability: Availability,
}

impl MemoryCrimeHistoryStore {
    pub fn new(availability: Availability) -> Self {
        Self {
            by_actor: DashMap::new(),
            by_victim: DashMap::new(),
            availability,
        }
    }
}

impl CrimeHistoryStore for MemoryCrimeHistoryStore {
    fn append(&self, record: &CrimeRecord) -> StorageResult<()> {
        self.availability.check("append crime")?;
        self.by_actor
            .entry(record.actor_id)
            .or_default()
            .push(record.clone());
        if let Some(victim) = record.victim_id {
            self.by_victim.entry(victim).or_default().push(record.clone());
        }
        Ok(())
    }

    fn query(
        &self,
        actor: &ActorId,
        page: usize,
        page_size: usize,
    ) -> StorageResult<Vec<CrimeRecord>> {
        self.availability.check("query crimes")?;
        let skip = page.max(1).saturating_sub(1).saturating_mul(page_size);
        Ok(self
            .by_actor
            .get(actor)
            .map(|records| {
                records
                    .iter()
                    .rev()
                    .skip(skip)
                    .take(page_size)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn count(&self, actor: &ActorId) -> StorageResult<u64> {
        self.availability.check("count crimes")?;
        Ok(self
            .by_actor
            .get(actor)
            .map(|records| records.len() as u64)
            .unwrap_or(0))
    }

    fn by_victim(&self, victim: &ActorId) -> StorageResult<Vec<CrimeRecord>> {
        self.availability.check("query crimes by victim")?;
        Ok(self
            .by_victim
            .get(victim)
            .map(|records| records.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Trust
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryTrustStore {
    relations: DashMap<(ActorId, ActorId), TrustState>,
    availability: Availability,
}

impl MemoryTrustStore {
    pub fn new(availability: Availability) -> Self {
        Self {
            relations: DashMap::new(),
            availability,
        }
    }
}

impl TrustStore for MemoryTrustStore {
    fn get(&self, owner: &ActorId, accessor: &ActorId) -> StorageResult<Option<TrustState>> {
        self.availability.check("get trust")?;
        Ok(self.relations.get(&(*owner, *accessor)).map(|r| *r.value()))
    }

    fn set(&self, owner: &ActorId, accessor: &ActorId, state: TrustState) -> StorageResult<()> {
        self.availability.check("set trust")?;
        if state == TrustState::Unset {
            self.relations.remove(&(*owner, *accessor));
        } else {
            self.relations.insert((*owner, *accessor), state);
        }
        Ok(())
    }

    fn delete(&self, owner: &ActorId, accessor: &ActorId) -> StorageResult<bool> {
        self.availability.check("delete trust")?;
        Ok(self.relations.remove(&(*owner, *accessor)).is_some())
    }

    fn all_for_owner(&self, owner: &ActorId) -> StorageResult<HashMap<ActorId, TrustState>> {
        self.availability.check("list trust")?;
        Ok(self
            .relations
            .iter()
            .filter(|r| r.key().0 == *owner)
            .map(|r| (r.key().1, *r.value()))
            .collect())
    }
}
