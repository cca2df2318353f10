use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::info;

use crate::reputation::{ALIGNMENT_MIN, STAT_MAX};

/// Top-level configuration for the crime oracle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Kill resolution constants
    pub reputation: ReputationConfig,
    /// Point values charged per crime kind
    pub crime: CrimeConfig,
    /// Grace period for block destruction
    pub ownership: OwnershipConfig,
    /// Attribution window for indirect kills
    pub combat: CombatConfig,
    /// Notification channel sizing
    pub events: EventConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Alignment a killer of an innocent is reset to
    pub pk_alignment_floor: i32,
    /// Alignment granted for killing a RED actor
    pub red_kill_alignment_reward: i32,
    /// Fame granted for killing a RED actor
    pub red_kill_fame_reward: i32,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            pk_alignment_floor: -1000,
            red_kill_alignment_reward: 50,
            red_kill_fame_reward: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrimeConfig {
    /// Unauthorized destruction of an owned block
    pub destroy_points: i32,
    /// Withdrawal from an owned container
    pub theft_points: i32,
    /// First strike against an innocent
    pub attack_points: i32,
    /// Killing an innocent (the kill itself already collapses alignment)
    pub player_kill_points: i32,
    /// Killing a protected NPC
    pub protected_npc_points: i32,
    /// Killing an owned animal
    pub animal_kill_points: i32,
    /// Harvesting crops on someone else's land
    pub harvest_points: i32,
}

impl Default for CrimeConfig {
    fn default() -> Self {
        Self {
            destroy_points: 10,
            theft_points: 10,
            attack_points: 5,
            player_kill_points: 0,
            protected_npc_points: 20,
            animal_kill_points: 0,
            harvest_points: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnershipConfig {
    /// Time an actor has to put a broken block back
    pub grace_period_ms: u64,
    /// How often expired pending crimes are confirmed
    pub sweep_interval_ms: u64,
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 5_000,
            sweep_interval_ms: 1_000,
        }
    }
}

impl OwnershipConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::milliseconds(self.grace_period_ms as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    /// How long a direct hit can explain a later death
    pub tag_duration_ms: u64,
    /// How often stale tags are swept
    pub sweep_interval_ms: u64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            tag_duration_ms: 10_000,
            sweep_interval_ms: 1_000,
        }
    }
}

impl CombatConfig {
    pub fn tag_duration(&self) -> Duration {
        Duration::milliseconds(self.tag_duration_ms as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Buffered notifications per subscriber before the oldest are dropped
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

fn overlay<T>(target: &mut T, var: &str) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Ok(raw) = env::var(var) {
        *target = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {} value", var))?;
    }
    Ok(())
}

impl OracleConfig {
    /// Load configuration from `CRIME_ORACLE_*` environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(level) = env::var("CRIME_ORACLE_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Timing
        overlay(&mut config.ownership.grace_period_ms, "CRIME_ORACLE_GRACE_PERIOD_MS")?;
        overlay(&mut config.ownership.sweep_interval_ms, "CRIME_ORACLE_PENDING_SWEEP_MS")?;
        overlay(&mut config.combat.tag_duration_ms, "CRIME_ORACLE_TAG_DURATION_MS")?;
        overlay(&mut config.combat.sweep_interval_ms, "CRIME_ORACLE_TAG_SWEEP_MS")?;

        // Crime points
        overlay(&mut config.crime.destroy_points, "CRIME_ORACLE_DESTROY_POINTS")?;
        overlay(&mut config.crime.theft_points, "CRIME_ORACLE_THEFT_POINTS")?;
        overlay(&mut config.crime.attack_points, "CRIME_ORACLE_ATTACK_POINTS")?;
        overlay(&mut config.crime.harvest_points, "CRIME_ORACLE_HARVEST_POINTS")?;
        overlay(&mut config.crime.protected_npc_points, "CRIME_ORACLE_NPC_KILL_POINTS")?;
        overlay(&mut config.crime.animal_kill_points, "CRIME_ORACLE_ANIMAL_KILL_POINTS")?;

        // Kill resolution
        overlay(
            &mut config.reputation.pk_alignment_floor,
            "CRIME_ORACLE_PK_ALIGNMENT_FLOOR",
        )?;
        if let Ok(raw) = env::var("CRIME_ORACLE_RED_KILL_REWARD") {
            let reward: i32 = raw
                .trim()
                .parse()
                .context("Invalid CRIME_ORACLE_RED_KILL_REWARD value")?;
            config.reputation.red_kill_alignment_reward = reward;
            config.reputation.red_kill_fame_reward = reward;
        }

        overlay(&mut config.events.channel_capacity, "CRIME_ORACLE_EVENT_CAPACITY")?;

        config.validate()?;

        info!(
            grace_period_ms = config.ownership.grace_period_ms,
            tag_duration_ms = config.combat.tag_duration_ms,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Reject values the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.ownership.grace_period_ms == 0 {
            anyhow::bail!("grace period must be greater than zero");
        }
        if self.combat.tag_duration_ms == 0 {
            anyhow::bail!("combat tag duration must be greater than zero");
        }
        if self.ownership.sweep_interval_ms == 0 || self.combat.sweep_interval_ms == 0 {
            anyhow::bail!("sweep intervals must be greater than zero");
        }

        let points = [
            ("destroy_points", self.crime.destroy_points),
            ("theft_points", self.crime.theft_points),
            ("attack_points", self.crime.attack_points),
            ("player_kill_points", self.crime.player_kill_points),
            ("protected_npc_points", self.crime.protected_npc_points),
            ("animal_kill_points", self.crime.animal_kill_points),
            ("harvest_points", self.crime.harvest_points),
            ("red_kill_alignment_reward", self.reputation.red_kill_alignment_reward),
            ("red_kill_fame_reward", self.reputation.red_kill_fame_reward),
        ];
        for (name, value) in points {
            if !(0..=STAT_MAX).contains(&value) {
                anyhow::bail!("{} must be within [0, {}], got {}", name, STAT_MAX, value);
            }
        }

        if !(ALIGNMENT_MIN..=0).contains(&self.reputation.pk_alignment_floor) {
            anyhow::bail!(
                "pk_alignment_floor must be within [{}, 0], got {}",
                ALIGNMENT_MIN,
                self.reputation.pk_alignment_floor
            );
        }

        if self.events.channel_capacity == 0 {
            anyhow::bail!("event channel capacity must be greater than zero");
        }

        Ok(())
    }
}
