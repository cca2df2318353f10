//! In-memory database bundling one repository per table

use std::sync::Arc;
use tracing::info;

use crate::database::{
    Availability, CrimeHistoryStore, MemoryCrimeHistoryStore, MemoryOwnershipStore,
    MemoryStandingStore, MemoryTrustStore, OwnershipStore, StandingStore, Stores, TrustStore,
};

pub struct MemoryDatabase {
    availability: Availability,
    standings: Arc<MemoryStandingStore>,
    ownership: Arc<MemoryOwnershipStore>,
    crimes: Arc<MemoryCrimeHistoryStore>,
    trust: Arc<MemoryTrustStore>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        let availability = Availability::new();

        let standings = Arc::new(MemoryStandingStore::new(availability.clone()));
        let ownership = Arc::new(MemoryOwnershipStore::new(availability.clone()));
        let crimes = Arc::new(MemoryCrimeHistoryStore::new(availability.clone()));
        let trust = Arc::new(MemoryTrustStore::new(availability.clone()));

        info!("In-memory database initialized");

        Self {
            availability,
            standings,
            ownership,
            crimes,
            trust,
        }
    }

    /// Take every table offline (or back online) at once.
    pub fn set_available(&self, available: bool) {
        self.availability.set(available);
    }

    pub fn standings(&self) -> Arc<dyn StandingStore> {
        self.standings.clone()
    }

    pub fn ownership(&self) -> Arc<dyn OwnershipStore> {
        self.ownership.clone()
    }

    pub fn crimes(&self) -> Arc<dyn CrimeHistoryStore> {
        self.crimes.clone()
    }

    pub fn trust(&self) -> Arc<dyn TrustStore> {
        self.trust.clone()
    }

    pub fn stores(&self) -> Stores {
        Stores {
            standings: self.standings(),
            ownership: self.ownership(),
            crimes: self.crimes(),
            trust: self.trust(),
        }
    }

    /// Number of persisted standing records
    pub fn stored_standings(&self) -> usize {
        self.standings.len()
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}
