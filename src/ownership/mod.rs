//! Ownership Grace-Period Engine
//!
//! Decides whether breaking, placing or looting a block is a crime.
//! Plain blocks get a grace period in which the breaker can put the same
//! block back; containers do not.

mod engine;
mod location;
mod pending;

pub use engine::{BreakOutcome, OwnershipEngine, PlaceOutcome};
pub use location::{Block, BlockLocation, OwnershipRecord};
pub use pending::{PendingCrime, PendingCrimeStore};
