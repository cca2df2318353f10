//! Reputation Tiers
//!
//! The public classification of an actor. Derived purely from the kill
//! counter and crime points; alignment and fame never move the tier.

use serde::{Deserialize, Serialize};

use crate::reputation::ActorStanding;

/// Public reputation tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationTier {
    /// No crimes, no kills
    Blue,
    /// At least one crime point
    Gray,
    /// At least one player kill
    Red,
}

impl ReputationTier {
    /// RED dominates GRAY dominates BLUE.
    pub fn derive(kill_count: u32, crime_point: i32) -> Self {
        if kill_count >= 1 {
            ReputationTier::Red
        } else if crime_point >= 1 {
            ReputationTier::Gray
        } else {
            ReputationTier::Blue
        }
    }

    pub fn of(standing: &ActorStanding) -> Self {
        Self::derive(standing.kill_count, standing.crime_point)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationTier::Blue => "blue",
            ReputationTier::Gray => "gray",
            ReputationTier::Red => "red",
        }
    }
}

impl std::fmt::Display for ReputationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
