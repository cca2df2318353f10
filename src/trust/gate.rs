//! Trust Gate - Pairwise Consent
//!
//! Owner-granted overrides that exempt an accessor from crime detection.
//! Writes go to the store first, then the cache. Only owners warmed by
//! [`TrustGate::all_relations`] are cached; for them a miss reads through and
//! remembers the answer, including "no relation". Everyone else reads through
//! every time.

use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::database::TrustStore;
use crate::error::StorageResult;
use crate::ActorId;

/// Relation from an owner towards one accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustState {
    Trust,
    /// Stored but gates exactly like `Unset`
    Distrust,
    /// No relation; defers to group membership outside the core
    Unset,
}

pub struct TrustGate {
    store: Arc<dyn TrustStore>,

    /// (owner, accessor) -> state, `Unset` meaning "known absent"
    cache: DashMap<(ActorId, ActorId), TrustState>,

    /// Owners whose relations are cached until they leave
    warm: DashSet<ActorId>,
}

impl TrustGate {
    pub fn new(store: Arc<dyn TrustStore>) -> Self {
        Self {
            store,
            cache: DashMap::new(),
            warm: DashSet::new(),
        }
    }

    pub fn trust_state(&self, owner: &ActorId, accessor: &ActorId) -> StorageResult<TrustState> {
        let key = (*owner, *accessor);
        if let Some(state) = self.cache.get(&key) {
            return Ok(*state);
        }

        let state = self.store.get(owner, accessor)?.unwrap_or(TrustState::Unset);
        if !self.warm.contains(owner) {
            return Ok(state);
        }

        // A write that landed while we were reading takes precedence.
        let cached = *self.cache.entry(key).or_insert(state);
        Ok(cached)
    }

    /// Only an explicit TRUST grants access. DISTRUST and UNSET both deny.
    pub fn is_trusted(&self, owner: &ActorId, accessor: &ActorId) -> StorageResult<bool> {
        Ok(self.trust_state(owner, accessor)? == TrustState::Trust)
    }

    pub fn is_mutually_trusted(&self, a: &ActorId, b: &ActorId) -> StorageResult<bool> {
        Ok(self.is_trusted(a, b)? && self.is_trusted(b, a)?)
    }

    pub fn set_trust_state(
        &self,
        owner: &ActorId,
        accessor: &ActorId,
        state: TrustState,
    ) -> StorageResult<()> {
        if state == TrustState::Unset {
            self.remove_trust_state(owner, accessor)?;
            return Ok(());
        }

        self.store.set(owner, accessor, state)?;
        self.remember(owner, accessor, state);

        info!(owner = %owner, accessor = %accessor, state = ?state, "Trust relation set");
        Ok(())
    }

    /// Returns whether a relation existed
    pub fn remove_trust_state(&self, owner: &ActorId, accessor: &ActorId) -> StorageResult<bool> {
        let existed = self.store.delete(owner, accessor)?;
        self.remember(owner, accessor, TrustState::Unset);

        if existed {
            info!(owner = %owner, accessor = %accessor, "Trust relation removed");
        }
        Ok(existed)
    }

    fn remember(&self, owner: &ActorId, accessor: &ActorId, state: TrustState) {
        let key = (*owner, *accessor);
        if self.warm.contains(owner) {
            self.cache.insert(key, state);
        } else {
            self.cache.remove(&key);
        }
    }

    /// Every stored relation of an owner. Warms the cache for that owner.
    pub fn all_relations(&self, owner: &ActorId) -> StorageResult<HashMap<ActorId, TrustState>> {
        let relations = self.store.all_for_owner(owner)?;
        self.warm.insert(*owner);
        for (accessor, state) in &relations {
            self.cache.insert((*owner, *accessor), *state);
        }
        Ok(relations)
    }

    /// Drop cached relations of an owner who left
    pub fn evict_owner(&self, owner: &ActorId) {
        self.warm.remove(owner);
        self.cache.retain(|(cached_owner, _), _| cached_owner != owner);
        debug!(owner = %owner, "Trust cache evicted");
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}
