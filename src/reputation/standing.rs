//! Actor Standing
//!
//! One record per participant. All numeric mutators clamp, so no sequence
//! of calls can push a value outside its range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reputation::ReputationTier;
use crate::ActorId;

pub const STAT_MAX: i32 = 1000;
pub const ALIGNMENT_MIN: i32 = -1000;

/// Accumulated standing of one actor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorStanding {
    pub actor_id: ActorId,

    /// Crime points, [0, 1000]. Any positive value makes the actor GRAY.
    pub crime_point: i32,

    /// Goodness value, [-1000, 1000]
    pub alignment: i32,

    /// Fame, [0, 1000]
    pub fame: i32,

    /// Player kills; only an explicit reset lowers it
    pub kill_count: u32,

    pub last_seen: DateTime<Utc>,
}

impl ActorStanding {
    pub fn new(actor_id: ActorId, now: DateTime<Utc>) -> Self {
        Self {
            actor_id,
            crime_point: 0,
            alignment: 0,
            fame: 0,
            kill_count: 0,
            last_seen: now,
        }
    }

    pub fn tier(&self) -> ReputationTier {
        ReputationTier::of(self)
    }

    pub fn add_alignment(&mut self, delta: i32) {
        self.alignment = self
            .alignment
            .saturating_add(delta)
            .clamp(ALIGNMENT_MIN, STAT_MAX);
    }

    pub fn set_alignment(&mut self, value: i32) {
        self.alignment = value.clamp(ALIGNMENT_MIN, STAT_MAX);
    }

    pub fn add_crime_points(&mut self, delta: i32) {
        self.crime_point = self.crime_point.saturating_add(delta).clamp(0, STAT_MAX);
    }

    pub fn add_fame(&mut self, delta: i32) {
        self.fame = self.fame.saturating_add(delta).clamp(0, STAT_MAX);
    }

    /// Raise fame to `other` if higher. Never lowers.
    pub fn inherit_fame(&mut self, other: i32) {
        if other > self.fame {
            self.fame = other.clamp(0, STAT_MAX);
        }
    }

    pub fn record_kill(&mut self) {
        self.kill_count = self.kill_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn standing() -> ActorStanding {
        ActorStanding::new(Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_defaults_are_blue() {
        let s = standing();
        assert_eq!(s.tier(), ReputationTier::Blue);
        assert_eq!(s.alignment, 0);
    }

    #[test]
    fn test_values_stay_clamped() {
        let mut s = standing();
        s.add_fame(5000);
        s.add_crime_points(i32::MAX);
        s.add_alignment(-5000);
        assert_eq!(s.fame, STAT_MAX);
        assert_eq!(s.crime_point, STAT_MAX);
        assert_eq!(s.alignment, ALIGNMENT_MIN);

        s.add_fame(-5000);
        s.add_crime_points(i32::MIN);
        s.add_alignment(i32::MAX);
        assert_eq!(s.fame, 0);
        assert_eq!(s.crime_point, 0);
        assert_eq!(s.alignment, STAT_MAX);
    }

    #[test]
    fn test_fame_inheritance_never_lowers() {
        let mut s = standing();
        s.add_fame(400);
        s.inherit_fame(100);
        assert_eq!(s.fame, 400);
        s.inherit_fame(900);
        assert_eq!(s.fame, 900);
    }
}
