//! Crime Records
//!
//! Records are append-only: created once by the ledger, never amended or
//! deleted. The point value is stored as charged, so history stays accurate
//! even if the configured values change later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ownership::BlockLocation;
use crate::ActorId;

/// Kinds of crime the ledger knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrimeKind {
    /// Took items from someone else's container
    Theft,
    /// Destroyed someone else's block
    Destroy,
    /// Struck an innocent player
    Attack,
    /// Killed an innocent player
    PlayerKill,
    /// Killed a protected NPC
    KillProtectedNpc,
    /// Killed someone else's animal
    KillAnimal,
    /// Harvested crops on someone else's land
    IllicitHarvest,
}

impl CrimeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrimeKind::Theft => "theft",
            CrimeKind::Destroy => "destroy",
            CrimeKind::Attack => "attack",
            CrimeKind::PlayerKill => "player_kill",
            CrimeKind::KillProtectedNpc => "kill_protected_npc",
            CrimeKind::KillAnimal => "kill_animal",
            CrimeKind::IllicitHarvest => "illicit_harvest",
        }
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            CrimeKind::Theft => "Stole from another player's container",
            CrimeKind::Destroy => "Destroyed another player's property",
            CrimeKind::Attack => "Attacked an innocent player",
            CrimeKind::PlayerKill => "Murdered an innocent player",
            CrimeKind::KillProtectedNpc => "Killed a protected villager",
            CrimeKind::KillAnimal => "Killed another player's animal",
            CrimeKind::IllicitHarvest => "Harvested another player's crops",
        }
    }
}

/// Everything a caller knows about a crime before it is recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrimeReport {
    pub actor: ActorId,
    pub kind: CrimeKind,
    pub points: i32,
    pub victim: Option<ActorId>,
    pub victim_name: Option<String>,
    pub location: Option<BlockLocation>,
    pub detail: Option<String>,
}

impl CrimeReport {
    pub fn new(actor: ActorId, kind: CrimeKind, points: i32) -> Self {
        Self {
            actor,
            kind,
            points,
            victim: None,
            victim_name: None,
            location: None,
            detail: None,
        }
    }

    pub fn against(mut self, victim: ActorId) -> Self {
        self.victim = Some(victim);
        self
    }

    pub fn victim_name(mut self, name: impl Into<String>) -> Self {
        self.victim_name = Some(name.into());
        self
    }

    pub fn at(mut self, location: BlockLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn into_record(self, committed_at: DateTime<Utc>) -> CrimeRecord {
        let mut record = CrimeRecord::new(
            self.actor,
            self.kind,
            self.points,
            self.victim,
            self.location,
            self.detail,
            committed_at,
        );
        record.victim_name = self.victim_name;
        record
    }
}

/// Immutable history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeRecord {
    pub id: Uuid,
    pub actor_id: ActorId,
    pub kind: CrimeKind,
    /// Points charged at the time of the crime, never negative
    pub points: i32,
    pub victim_id: Option<ActorId>,
    pub victim_name: Option<String>,
    pub location: Option<BlockLocation>,
    pub detail: Option<String>,
    pub committed_at: DateTime<Utc>,
}

impl CrimeRecord {
    pub fn new(
        actor_id: ActorId,
        kind: CrimeKind,
        points: i32,
        victim_id: Option<ActorId>,
        location: Option<BlockLocation>,
        detail: Option<String>,
        committed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor_id,
            kind,
            points: points.max(0),
            victim_id,
            victim_name: None,
            location,
            detail,
            committed_at,
        }
    }
}
