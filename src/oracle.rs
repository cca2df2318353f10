//! Crime Oracle - Component Wiring and World Event Entry Points
//!
//! Builds every subsystem around one clock, one notification bus and one set
//! of stores, and exposes the calls a game host makes on joins, hits, deaths
//! and world interactions. Sweeps are exposed through [`CrimeOracle::tick`]
//! so the host decides when they run.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::combat::CombatTracker;
use crate::config::OracleConfig;
use crate::crime::{CrimeKind, CrimeLedger, CrimeRecord, CrimeReport};
use crate::database::Stores;
use crate::error::StorageResult;
use crate::events::{EventBus, Notification};
use crate::ownership::{BlockLocation, OwnershipEngine, PendingCrimeStore};
use crate::reputation::{ActorStanding, KillResolution, ReputationManager, ReputationTier};
use crate::trust::TrustGate;
use crate::ActorId;

/// Result of one sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    pub confirmed_crimes: usize,
    pub expired_tags: usize,
}

pub struct CrimeOracle {
    config: OracleConfig,
    events: EventBus,
    reputation: Arc<ReputationManager>,
    ledger: Arc<CrimeLedger>,
    ownership: Arc<OwnershipEngine>,
    combat: Arc<CombatTracker>,
    trust: Arc<TrustGate>,
}

impl CrimeOracle {
    pub fn new(config: OracleConfig, stores: Stores, clock: Arc<dyn Clock>) -> Self {
        let events = EventBus::new(config.events.channel_capacity);

        let reputation = Arc::new(ReputationManager::new(
            stores.standings,
            config.reputation.clone(),
            events.clone(),
            clock.clone(),
        ));
        let ledger = Arc::new(CrimeLedger::new(
            stores.crimes,
            reputation.clone(),
            events.clone(),
            clock.clone(),
        ));
        let trust = Arc::new(TrustGate::new(stores.trust));
        let ownership = Arc::new(OwnershipEngine::new(
            stores.ownership,
            trust.clone(),
            ledger.clone(),
            PendingCrimeStore::new(config.ownership.grace_period(), clock.clone()),
            config.crime.clone(),
            clock.clone(),
        ));
        let combat = Arc::new(CombatTracker::new(config.combat.tag_duration(), clock));

        info!(
            grace_period_ms = config.ownership.grace_period_ms,
            tag_duration_ms = config.combat.tag_duration_ms,
            "Crime oracle initialized"
        );

        Self {
            config,
            events,
            reputation,
            ledger,
            ownership,
            combat,
            trust,
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn reputation(&self) -> &Arc<ReputationManager> {
        &self.reputation
    }

    pub fn ledger(&self) -> &Arc<CrimeLedger> {
        &self.ledger
    }

    pub fn ownership(&self) -> &Arc<OwnershipEngine> {
        &self.ownership
    }

    pub fn combat(&self) -> &Arc<CombatTracker> {
        &self.combat
    }

    pub fn trust(&self) -> &Arc<TrustGate> {
        &self.trust
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    // Sessions

    pub fn on_player_join(&self, actor: &ActorId) -> StorageResult<ActorStanding> {
        let standing = self.reputation.load_actor(actor)?;
        self.trust.all_relations(actor)?;
        debug!(actor = %actor, tier = %standing.tier(), "Player joined");
        Ok(standing)
    }

    pub fn on_player_leave(&self, actor: &ActorId) -> StorageResult<()> {
        self.reputation.unload_actor(actor)?;
        self.combat.clear_tag(actor);
        self.trust.evict_owner(actor);
        debug!(actor = %actor, "Player left");
        Ok(())
    }

    /// Player respawned; any earlier hit can no longer explain a death.
    pub fn on_player_respawn(&self, actor: &ActorId) {
        self.combat.clear_tag(actor);
    }

    // Combat

    /// Track a direct hit. The first strike on an innocent who does not trust
    /// the attacker is an attack crime; hitting back is not.
    pub fn on_player_attack(
        &self,
        attacker: &ActorId,
        victim: &ActorId,
        damage: f64,
        knockback: bool,
    ) -> StorageResult<Option<CrimeRecord>> {
        if attacker == victim {
            return Ok(None);
        }

        let repeat_hit = self.combat.find_last_attacker(victim) == Some(*attacker);
        let self_defense = self.combat.find_last_attacker(attacker) == Some(*victim);

        let crime = if !repeat_hit
            && !self_defense
            && self.reputation.is_protected_victim(victim)?
            && !self.trust.is_trusted(victim, attacker)?
        {
            let points = self.config.crime.attack_points;
            let report = CrimeReport::new(*attacker, CrimeKind::Attack, points).against(*victim);
            self.charge(report)?
        } else {
            None
        };

        self.combat.tag(victim, attacker, damage, knockback);
        Ok(crime)
    }

    /// Resolve a death. Without a direct killer the last attacker inside the
    /// attribution window is held responsible.
    ///
    /// The murder record is written before the killer's standing moves, and
    /// the victim's tag survives a failed call so the host can retry.
    pub fn on_player_death(
        &self,
        victim: &ActorId,
        direct_killer: Option<ActorId>,
    ) -> StorageResult<Option<KillResolution>> {
        let direct_killer = direct_killer.filter(|killer| killer != victim);
        let attributed = direct_killer.is_none();
        let killer = direct_killer.or_else(|| self.combat.find_last_attacker(victim));

        let resolution = match killer {
            Some(killer) => self.resolve_death(&killer, victim, attributed)?,
            None => {
                debug!(victim = %victim, "Death without a responsible player");
                None
            }
        };

        self.combat.clear_tag(victim);
        Ok(resolution)
    }

    fn resolve_death(
        &self,
        killer: &ActorId,
        victim: &ActorId,
        attributed: bool,
    ) -> StorageResult<Option<KillResolution>> {
        if !self.reputation.is_loaded(killer) {
            return Ok(None);
        }
        let Some(victim_standing) = self.reputation.peek_standing(victim)? else {
            debug!(victim = %victim, "Kill ignored, victim has no standing");
            return Ok(None);
        };

        if victim_standing.tier() == ReputationTier::Blue {
            let mut report = CrimeReport::new(
                *killer,
                CrimeKind::PlayerKill,
                self.config.crime.player_kill_points,
            )
            .against(*victim);
            if attributed {
                report = report.detail("indirect");
            }
            self.charge(report)?;
        }

        Ok(self.reputation.resolve_kill(killer, &victim_standing))
    }

    // World interactions

    pub fn on_protected_npc_kill(
        &self,
        actor: &ActorId,
        npc_name: &str,
    ) -> StorageResult<Option<CrimeRecord>> {
        let points = self.config.crime.protected_npc_points;
        let report =
            CrimeReport::new(*actor, CrimeKind::KillProtectedNpc, points).victim_name(npc_name);
        self.charge(report)
    }

    /// Killing an animal someone else owns
    pub fn on_animal_kill(
        &self,
        actor: &ActorId,
        owner: &ActorId,
        animal: &str,
    ) -> StorageResult<Option<CrimeRecord>> {
        if actor == owner || self.trust.is_trusted(owner, actor)? {
            return Ok(None);
        }
        let points = self.config.crime.animal_kill_points;
        let report = CrimeReport::new(*actor, CrimeKind::KillAnimal, points)
            .against(*owner)
            .detail(animal);
        self.charge(report)
    }

    /// Harvesting a crop on a claimed location without access
    pub fn on_illicit_harvest(
        &self,
        actor: &ActorId,
        location: &BlockLocation,
        crop: &str,
    ) -> StorageResult<Option<CrimeRecord>> {
        let Some(record) = self.ownership.owner_of(location)? else {
            return Ok(None);
        };
        if self.ownership.can_access(location, actor)? {
            return Ok(None);
        }
        let points = self.config.crime.harvest_points;
        let report = CrimeReport::new(*actor, CrimeKind::IllicitHarvest, points)
            .against(record.owner)
            .at(location.clone())
            .detail(crop);
        self.charge(report)
    }

    /// Zero-point crimes go to history only; the rest are committed.
    fn charge(&self, report: CrimeReport) -> StorageResult<Option<CrimeRecord>> {
        if report.points > 0 {
            self.ledger.commit_crime(report)
        } else {
            self.ledger.record_crime_history(report).map(Some)
        }
    }

    // Scheduled work

    /// Run both sweeps once
    pub fn tick(&self) -> StorageResult<TickReport> {
        let expired_tags = self.combat.sweep_expired_tags();
        let confirmed_crimes = self.ownership.confirm_expired()?.len();
        Ok(TickReport {
            confirmed_crimes,
            expired_tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::database::MemoryDatabase;
    use crate::reputation::KillOutcome;
    use chrono::Duration;
    use uuid::Uuid;

    fn oracle() -> (Arc<ManualClock>, CrimeOracle) {
        let (_, clock, oracle) = oracle_with_db();
        (clock, oracle)
    }

    fn oracle_with_db() -> (MemoryDatabase, Arc<ManualClock>, CrimeOracle) {
        let db = MemoryDatabase::new();
        let clock = Arc::new(ManualClock::starting_now());
        let oracle = CrimeOracle::new(OracleConfig::default(), db.stores(), clock.clone());
        (db, clock, oracle)
    }

    #[test]
    fn test_failed_murder_record_leaves_killer_untouched() {
        let (db, _, oracle) = oracle_with_db();
        let (killer, victim) = (Uuid::new_v4(), Uuid::new_v4());
        oracle.on_player_join(&killer).unwrap();
        oracle.on_player_join(&victim).unwrap();
        let mut receiver = oracle.subscribe();

        db.set_available(false);
        assert!(oracle.on_player_death(&victim, Some(killer)).is_err());

        let standing = oracle.reputation().standing(&killer).unwrap();
        assert_eq!(standing.kill_count, 0);
        assert_eq!(standing.alignment, 0);
        assert!(crate::events::drain(&mut receiver).is_empty());

        db.set_available(true);
        let resolution = oracle.on_player_death(&victim, Some(killer)).unwrap().unwrap();
        assert_eq!(resolution.outcome, KillOutcome::Murder);
        assert_eq!(oracle.ledger().history_count(&killer).unwrap(), 1);
    }

    #[test]
    fn test_failed_death_keeps_tag_for_retry() {
        let (db, clock, oracle) = oracle_with_db();
        let (killer, victim) = (Uuid::new_v4(), Uuid::new_v4());
        oracle.on_player_join(&killer).unwrap();
        oracle.on_player_join(&victim).unwrap();
        oracle.on_player_attack(&killer, &victim, 6.0, true).unwrap();
        clock.advance(Duration::seconds(3));

        db.set_available(false);
        assert!(oracle.on_player_death(&victim, None).is_err());
        assert_eq!(oracle.combat().find_last_attacker(&victim), Some(killer));

        db.set_available(true);
        let resolution = oracle.on_player_death(&victim, None).unwrap().unwrap();
        assert_eq!(resolution.killer, killer);
        assert!(oracle.combat().get_tag(&victim).is_none());
    }

    #[test]
    fn test_first_strike_on_innocent_is_attack() {
        let (_, oracle) = oracle();
        let (attacker, victim) = (Uuid::new_v4(), Uuid::new_v4());
        oracle.on_player_join(&attacker).unwrap();
        oracle.on_player_join(&victim).unwrap();

        let crime = oracle.on_player_attack(&attacker, &victim, 3.0, false).unwrap();
        assert_eq!(crime.map(|c| c.kind), Some(CrimeKind::Attack));

        // follow-up hits inside the window are the same fight
        assert!(oracle.on_player_attack(&attacker, &victim, 3.0, false).unwrap().is_none());
        // hitting back is self defense
        assert!(oracle.on_player_attack(&victim, &attacker, 3.0, false).unwrap().is_none());
        assert_eq!(oracle.ledger().history_count(&victim).unwrap(), 0);
    }

    #[test]
    fn test_indirect_death_is_attributed() {
        let (clock, oracle) = oracle();
        let (killer, victim) = (Uuid::new_v4(), Uuid::new_v4());
        oracle.on_player_join(&killer).unwrap();
        oracle.on_player_join(&victim).unwrap();

        oracle.on_player_attack(&killer, &victim, 2.0, true).unwrap();
        clock.advance(Duration::seconds(5));

        let resolution = oracle.on_player_death(&victim, None).unwrap().unwrap();
        assert_eq!(resolution.killer, killer);
        assert_eq!(resolution.outcome, KillOutcome::Murder);
        assert_eq!(
            oracle.reputation().current_tier(&killer).unwrap(),
            Some(ReputationTier::Red)
        );

        let history = oracle.ledger().history(&killer, 1, 10).unwrap();
        assert_eq!(history[0].kind, CrimeKind::PlayerKill);
        assert_eq!(history[0].detail.as_deref(), Some("indirect"));
        assert!(oracle.combat().get_tag(&victim).is_none());
    }

    #[test]
    fn test_environmental_death_outside_window() {
        let (clock, oracle) = oracle();
        let (attacker, victim) = (Uuid::new_v4(), Uuid::new_v4());
        oracle.on_player_join(&attacker).unwrap();
        oracle.on_player_join(&victim).unwrap();

        oracle.on_player_attack(&attacker, &victim, 2.0, false).unwrap();
        clock.advance(Duration::seconds(11));
        assert!(oracle.on_player_death(&victim, None).unwrap().is_none());
    }

    #[test]
    fn test_zero_point_animal_kill_is_history_only() {
        let (_, oracle) = oracle();
        let (actor, farmer) = (Uuid::new_v4(), Uuid::new_v4());
        oracle.on_player_join(&actor).unwrap();

        let record = oracle.on_animal_kill(&actor, &farmer, "cow").unwrap().unwrap();
        assert_eq!(record.points, 0);
        assert_eq!(
            oracle.reputation().current_tier(&actor).unwrap(),
            Some(ReputationTier::Blue)
        );
        assert!(oracle.on_animal_kill(&farmer, &farmer, "cow").unwrap().is_none());
    }

    #[test]
    fn test_protected_npc_kill_is_charged() {
        let (_, oracle) = oracle();
        let actor = Uuid::new_v4();
        oracle.on_player_join(&actor).unwrap();

        let record = oracle.on_protected_npc_kill(&actor, "Blacksmith").unwrap().unwrap();
        assert_eq!(record.victim_name.as_deref(), Some("Blacksmith"));
        assert_eq!(oracle.reputation().standing(&actor).unwrap().crime_point, 20);
    }

    #[test]
    fn test_crop_harvest_on_claimed_land() {
        let (_, oracle) = oracle();
        let (farmer, actor) = (Uuid::new_v4(), Uuid::new_v4());
        let field = BlockLocation::new("overworld", 5, 70, 5);
        oracle.on_player_join(&actor).unwrap();

        assert!(oracle.on_illicit_harvest(&actor, &field, "wheat").unwrap().is_none());
        oracle.ownership().register_ownership(&field, &farmer).unwrap();
        let crime = oracle.on_illicit_harvest(&actor, &field, "wheat").unwrap().unwrap();
        assert_eq!(crime.kind, CrimeKind::IllicitHarvest);
        assert_eq!(crime.victim_id, Some(farmer));
    }

    #[test]
    fn test_leave_saves_and_clears() {
        let (_, oracle) = oracle();
        let (attacker, victim) = (Uuid::new_v4(), Uuid::new_v4());
        oracle.on_player_join(&attacker).unwrap();
        oracle.on_player_join(&victim).unwrap();
        oracle.on_player_attack(&attacker, &victim, 1.0, false).unwrap();

        oracle.on_player_leave(&victim).unwrap();
        assert!(!oracle.reputation().is_loaded(&victim));
        assert!(oracle.combat().get_tag(&victim).is_none());
        assert_eq!(
            oracle.reputation().current_tier(&victim).unwrap(),
            Some(ReputationTier::Blue)
        );
    }
}
