//! Reputation State Machine
//!
//! Tracks per-actor standing and derives the public tier from it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌───────────────────┐     ┌─────────────────┐
//! │ ActorStanding   │────►│ ReputationManager │────►│ EventBus        │
//! │ (clamped stats) │     │ (cache + store)   │     │ (TierChanged)   │
//! └─────────────────┘     └───────────────────┘     └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌───────────────────┐
//! │ ReputationTier  │────►│ Title             │
//! │ (BLUE/GRAY/RED) │     │ (cosmetic rank)   │
//! └─────────────────┘     └───────────────────┘
//! ```
//!
//! ## Tier Model
//!
//! - RED when the kill counter is at least 1
//! - otherwise GRAY when crime points are at least 1
//! - otherwise BLUE
//! - alignment and fame only feed the title

mod manager;
mod standing;
mod tier;
mod title;

pub use manager::{KillOutcome, KillResolution, ReputationManager};
pub use standing::{ActorStanding, ALIGNMENT_MIN, STAT_MAX};
pub use tier::ReputationTier;
pub use title::{title_for, title_of, EnglishTitles, Title, TitleCatalog, TitleRank};
