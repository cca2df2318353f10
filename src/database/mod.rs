//! Storage Collaborators
//!
//! The core only needs point lookups and upserts. Each concern gets a small
//! repository trait; `memory` provides the in-process implementations used
//! by the binary and the tests, and `pool` bundles them.

pub mod memory;
pub mod pool;

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::crime::CrimeRecord;
use crate::error::StorageResult;
use crate::ownership::{BlockLocation, OwnershipRecord};
use crate::reputation::{ActorStanding, ReputationTier};
use crate::trust::TrustState;
use crate::ActorId;

pub use memory::{
    Availability, MemoryCrimeHistoryStore, MemoryOwnershipStore, MemoryStandingStore,
    MemoryTrustStore,
};
pub use pool::MemoryDatabase;

/// Standing table keyed by actor id
pub trait StandingStore: Send + Sync {
    fn load(&self, actor: &ActorId) -> StorageResult<Option<ActorStanding>>;

    fn save(&self, standing: &ActorStanding) -> StorageResult<()>;

    /// Stored actors currently classified as `tier`.
    fn with_tier(&self, tier: ReputationTier) -> StorageResult<Vec<ActorStanding>>;
}

/// Ownership table keyed by (world, x, y, z)
pub trait OwnershipStore: Send + Sync {
    fn set_owner(
        &self,
        location: &BlockLocation,
        owner: ActorId,
        placed_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    fn get_owner(&self, location: &BlockLocation) -> StorageResult<Option<OwnershipRecord>>;

    /// Returns whether a claim existed.
    fn remove_owner(&self, location: &BlockLocation) -> StorageResult<bool>;

    fn blocks_owned_by(&self, owner: &ActorId) -> StorageResult<Vec<BlockLocation>>;
}

/// Append-only crime history indexed by actor and by victim
pub trait CrimeHistoryStore: Send + Sync {
    fn append(&self, record: &CrimeRecord) -> StorageResult<()>;

    /// Newest first. `page` is 1-based; page 0 is treated as page 1.
    fn query(&self, actor: &ActorId, page: usize, page_size: usize)
        -> StorageResult<Vec<CrimeRecord>>;

    fn count(&self, actor: &ActorId) -> StorageResult<u64>;

    /// Crimes where `victim` was the target, newest first.
    fn by_victim(&self, victim: &ActorId) -> StorageResult<Vec<CrimeRecord>>;
}

/// Trust table keyed by (owner, accessor). `Unset` is never stored.
pub trait TrustStore: Send + Sync {
    fn get(&self, owner: &ActorId, accessor: &ActorId) -> StorageResult<Option<TrustState>>;

    fn set(&self, owner: &ActorId, accessor: &ActorId, state: TrustState) -> StorageResult<()>;

    /// Returns whether a relation existed.
    fn delete(&self, owner: &ActorId, accessor: &ActorId) -> StorageResult<bool>;

    fn all_for_owner(&self, owner: &ActorId) -> StorageResult<HashMap<ActorId, TrustState>>;
}

/// One handle per table, injected into the components at construction
#[derive(Clone)]
pub struct Stores {
    pub standings: Arc<dyn StandingStore>,
    pub ownership: Arc<dyn OwnershipStore>,
    pub crimes: Arc<dyn CrimeHistoryStore>,
    pub trust: Arc<dyn TrustStore>,
}
