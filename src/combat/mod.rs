//! Combat Attribution
//!
//! Short-lived direct-damage history used to resolve indirect kills.

mod tracker;

pub use tracker::{CombatTag, CombatTracker};
