//! Combat Attribution Tracker
//!
//! Remembers the last direct hit each victim took, so a later fall or
//! environmental death can be pinned on whoever caused it. Reads filter
//! stale tags lazily and the sweep removes them eagerly; both use
//! [`is_expired`] so they agree on the boundary.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::clock::{is_expired, Clock};
use crate::ActorId;

/// Last direct hit on a victim
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatTag {
    pub attacker: ActorId,
    pub damage: f64,
    pub knockback: bool,
    pub tagged_at: DateTime<Utc>,
}

pub struct CombatTracker {
    /// victim -> newest tag
    tags: DashMap<ActorId, CombatTag>,
    tag_duration: Duration,
    clock: Arc<dyn Clock>,
}

impl CombatTracker {
    pub fn new(tag_duration: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            tags: DashMap::new(),
            tag_duration,
            clock,
        }
    }

    /// Overwrite the victim's tag. Self-damage is never tracked.
    /// Returns whether a tag was written.
    pub fn tag(&self, victim: &ActorId, attacker: &ActorId, damage: f64, knockback: bool) -> bool {
        if victim == attacker {
            return false;
        }

        self.tags.insert(
            *victim,
            CombatTag {
                attacker: *attacker,
                damage,
                knockback,
                tagged_at: self.clock.now(),
            },
        );
        true
    }

    /// Live tag, or `None` once the window has passed
    pub fn get_tag(&self, victim: &ActorId) -> Option<CombatTag> {
        let tag = *self.tags.get(victim)?;
        if is_expired(tag.tagged_at, self.clock.now(), self.tag_duration) {
            None
        } else {
            Some(tag)
        }
    }

    pub fn find_last_attacker(&self, victim: &ActorId) -> Option<ActorId> {
        self.get_tag(victim).map(|tag| tag.attacker)
    }

    /// Forget a victim's tag, e.g. on respawn or disconnect
    pub fn clear_tag(&self, victim: &ActorId) -> bool {
        self.tags.remove(victim).is_some()
    }

    /// Remove every tag older than the window; returns how many went
    pub fn sweep_expired_tags(&self) -> usize {
        let now = self.clock.now();
        let duration = self.tag_duration;
        let mut removed = 0;

        self.tags.retain(|_, tag| {
            let keep = !is_expired(tag.tagged_at, now, duration);
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            debug!(removed, "Swept expired combat tags");
        }
        removed
    }

    /// Stored tags, including ones not yet swept
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
