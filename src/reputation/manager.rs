//! Reputation Manager - Standing Cache and Tier Transitions
//!
//! Owns the authoritative in-memory standing of every active actor. Actors
//! are loaded on join and saved and evicted on leave; while unloaded the
//! store is the only source of truth.
//!
//! Every mutation goes through [`ReputationManager::mutate`], which applies
//! the change under the cache entry lock, releases it, and only then
//! publishes the tier transition. Listeners always read post-mutation state.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::ReputationConfig;
use crate::database::StandingStore;
use crate::error::StorageResult;
use crate::events::{EventBus, Notification};
use crate::reputation::{title_of, ActorStanding, EnglishTitles, ReputationTier, TitleCatalog};
use crate::ActorId;

/// What a player kill did to the killer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillOutcome {
    /// Innocent victim: kill counted, alignment collapsed
    Murder,
    /// RED victim: reward and fame inheritance
    Bounty,
    /// GRAY victim: nothing changes
    Unpunished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KillResolution {
    pub killer: ActorId,
    pub victim: ActorId,
    pub victim_tier: ReputationTier,
    pub outcome: KillOutcome,
    pub killer_tier_before: ReputationTier,
    pub killer_after: ActorStanding,
}

pub struct ReputationManager {
    store: Arc<dyn StandingStore>,
    config: ReputationConfig,
    events: EventBus,
    clock: Arc<dyn Clock>,
    catalog: Arc<dyn TitleCatalog>,

    /// Standings of loaded actors
    cache: DashMap<ActorId, ActorStanding>,
}

impl ReputationManager {
    pub fn new(
        store: Arc<dyn StandingStore>,
        config: ReputationConfig,
        events: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            config,
            events,
            clock,
            catalog: Arc::new(EnglishTitles),
            cache: DashMap::new(),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn TitleCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    // Lifecycle

    /// Bring an actor into the cache, creating a default standing on first sight
    pub fn load_actor(&self, actor: &ActorId) -> StorageResult<ActorStanding> {
        let now = self.clock.now();

        if let Some(mut cached) = self.cache.get_mut(actor) {
            cached.last_seen = now;
            return Ok(cached.clone());
        }

        let mut standing = match self.store.load(actor)? {
            Some(stored) => stored,
            None => {
                debug!(actor = %actor, "Creating default standing");
                ActorStanding::new(*actor, now)
            }
        };
        standing.last_seen = now;

        // A concurrent join may have won the race; keep whichever landed first.
        let entry = self.cache.entry(*actor).or_insert(standing);
        Ok(entry.clone())
    }

    /// Save and evict. The cache keeps the actor if the save fails.
    ///
    /// The save runs outside the shard lock; eviction only happens if the
    /// standing did not move meanwhile, otherwise the newer value is saved.
    pub fn unload_actor(&self, actor: &ActorId) -> StorageResult<bool> {
        loop {
            let Some(snapshot) = self.standing(actor) else {
                return Ok(false);
            };

            if let Err(e) = self.store.save(&snapshot) {
                warn!(actor = %actor, error = %e, "Failed to save standing on unload");
                return Err(e);
            }

            if self
                .cache
                .remove_if(actor, |_, current| *current == snapshot)
                .is_some()
            {
                debug!(actor = %actor, "Standing saved and evicted");
                return Ok(true);
            }
        }
    }

    /// Persist one loaded actor without evicting it
    pub fn save_actor(&self, actor: &ActorId) -> StorageResult<bool> {
        let Some(snapshot) = self.standing(actor) else {
            return Ok(false);
        };
        self.store.save(&snapshot)?;
        Ok(true)
    }

    /// Persist every loaded actor, stopping at the first failure
    pub fn save_all(&self) -> StorageResult<usize> {
        let snapshots: Vec<ActorStanding> =
            self.cache.iter().map(|entry| entry.value().clone()).collect();

        for standing in &snapshots {
            self.store.save(standing)?;
        }

        info!(count = snapshots.len(), "Saved all loaded standings");
        Ok(snapshots.len())
    }

    // Queries

    /// Cached standing only
    pub fn standing(&self, actor: &ActorId) -> Option<ActorStanding> {
        self.cache.get(actor).map(|entry| entry.value().clone())
    }

    /// Cached standing, else the stored one. Never populates the cache.
    pub fn peek_standing(&self, actor: &ActorId) -> StorageResult<Option<ActorStanding>> {
        if let Some(cached) = self.standing(actor) {
            return Ok(Some(cached));
        }
        self.store.load(actor)
    }

    pub fn is_loaded(&self, actor: &ActorId) -> bool {
        self.cache.contains_key(actor)
    }

    pub fn loaded_count(&self) -> usize {
        self.cache.len()
    }

    pub fn current_tier(&self, actor: &ActorId) -> StorageResult<Option<ReputationTier>> {
        Ok(self.peek_standing(actor)?.map(|s| s.tier()))
    }

    pub fn current_title(&self, actor: &ActorId, locale: &str) -> StorageResult<Option<String>> {
        Ok(self
            .peek_standing(actor)?
            .and_then(|s| title_of(&s))
            .map(|title| self.catalog.render(&title, locale)))
    }

    /// Innocents are the only protected victims
    pub fn is_protected_victim(&self, actor: &ActorId) -> StorageResult<bool> {
        Ok(self.current_tier(actor)? == Some(ReputationTier::Blue))
    }

    /// Offline-aware listing; loaded actors override their stored record.
    pub fn standings_with_tier(&self, tier: ReputationTier) -> StorageResult<Vec<ActorStanding>> {
        let mut result: Vec<ActorStanding> = self
            .store
            .with_tier(tier)?
            .into_iter()
            .filter(|stored| !self.cache.contains_key(&stored.actor_id))
            .collect();

        result.extend(
            self.cache
                .iter()
                .filter(|entry| entry.value().tier() == tier)
                .map(|entry| entry.value().clone()),
        );

        Ok(result)
    }

    // Mutations

    /// Apply `change` to a loaded actor and announce any tier transition.
    /// Returns `None` when the actor is not loaded.
    fn mutate<F>(&self, actor: &ActorId, change: F) -> Option<(ReputationTier, ActorStanding)>
    where
        F: FnOnce(&mut ActorStanding),
    {
        let mut entry = self.cache.get_mut(actor)?;
        let before = entry.tier();
        change(entry.value_mut());
        let after = entry.clone();
        drop(entry);

        let now_tier = after.tier();
        if before != now_tier {
            info!(
                actor = %actor,
                old = %before,
                new = %now_tier,
                "Reputation tier changed"
            );
            self.events.publish(Notification::TierChanged {
                actor: *actor,
                old: before,
                new: now_tier,
            });
        }

        Some((before, after))
    }

    pub fn apply_good_deed(
        &self,
        actor: &ActorId,
        alignment_gain: i32,
        fame_gain: i32,
    ) -> Option<ActorStanding> {
        let alignment_gain = alignment_gain.max(0);
        let fame_gain = fame_gain.max(0);

        let (_, after) = self.mutate(actor, |s| {
            s.add_alignment(alignment_gain);
            s.add_fame(fame_gain);
        })?;

        debug!(
            actor = %actor,
            alignment = after.alignment,
            fame = after.fame,
            "Good deed applied"
        );
        self.events.publish(Notification::GoodDeed {
            actor: *actor,
            alignment_gain,
            fame_gain,
        });

        Some(after)
    }

    /// Standing side of a crime: alignment falls and crime points rise by `points`.
    pub fn apply_crime(&self, actor: &ActorId, points: i32) -> Option<ActorStanding> {
        let points = points.max(0);
        self.mutate(actor, |s| {
            s.add_alignment(-points);
            s.add_crime_points(points);
        })
        .map(|(_, after)| after)
    }

    /// Resolve a kill according to the victim's tier at the moment of death.
    ///
    /// A no-op (`Ok(None)`) when the killer is not loaded, the victim is
    /// unknown, or the actor killed themselves.
    pub fn apply_player_kill(
        &self,
        killer: &ActorId,
        victim: &ActorId,
    ) -> StorageResult<Option<KillResolution>> {
        if killer == victim || !self.is_loaded(killer) {
            return Ok(None);
        }

        let Some(victim_standing) = self.peek_standing(victim)? else {
            debug!(victim = %victim, "Kill ignored, victim has no standing");
            return Ok(None);
        };
        Ok(self.resolve_kill(killer, &victim_standing))
    }

    /// Infallible half of [`apply_player_kill`](Self::apply_player_kill), for
    /// callers that already read the victim's standing.
    pub fn resolve_kill(
        &self,
        killer: &ActorId,
        victim_standing: &ActorStanding,
    ) -> Option<KillResolution> {
        let victim = &victim_standing.actor_id;
        if killer == victim {
            return None;
        }
        let victim_tier = victim_standing.tier();

        let floor = self.config.pk_alignment_floor;
        let alignment_reward = self.config.red_kill_alignment_reward;
        let fame_reward = self.config.red_kill_fame_reward;

        let (outcome, mutated) = match victim_tier {
            ReputationTier::Blue => (
                KillOutcome::Murder,
                self.mutate(killer, |s| {
                    s.record_kill();
                    s.set_alignment(floor);
                }),
            ),
            ReputationTier::Red => (
                KillOutcome::Bounty,
                self.mutate(killer, |s| {
                    s.add_alignment(alignment_reward);
                    s.add_fame(fame_reward);
                    s.inherit_fame(victim_standing.fame);
                }),
            ),
            // Refresh only; the tier is recomputed but nothing moves.
            ReputationTier::Gray => (KillOutcome::Unpunished, self.mutate(killer, |_| {})),
        };

        // Killer not loaded, or left between the check and the mutation.
        let (killer_tier_before, killer_after) = mutated?;

        info!(
            killer = %killer,
            victim = %victim,
            victim_tier = %victim_tier,
            outcome = ?outcome,
            kill_count = killer_after.kill_count,
            "Player kill resolved"
        );
        self.events.publish(Notification::PlayerKillResolved {
            killer: *killer,
            victim: *victim,
            victim_tier,
            outcome,
        });

        Some(KillResolution {
            killer: *killer,
            victim: *victim,
            victim_tier,
            outcome,
            killer_tier_before,
            killer_after,
        })
    }

    /// Administrative reset of the kill counter
    pub fn reset_kill_count(&self, actor: &ActorId) -> Option<ActorStanding> {
        let after = self.mutate(actor, |s| s.kill_count = 0).map(|(_, after)| after)?;
        info!(actor = %actor, "Kill count reset");
        Some(after)
    }
}
