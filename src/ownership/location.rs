//! World coordinates and block descriptors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ActorId;

/// A single block position. Unique per (world, x, y, z).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockLocation {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockLocation {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl std::fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

/// What occupies a location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Material identifier, e.g. `oak_planks`
    pub kind: String,
    /// Holds an inventory (chests, barrels, furnaces, ...)
    pub container: bool,
}

impl Block {
    pub fn solid(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            container: false,
        }
    }

    pub fn container(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            container: true,
        }
    }
}

/// Owner claim on a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub location: BlockLocation,
    pub owner: ActorId,
    pub placed_at: DateTime<Utc>,
}
