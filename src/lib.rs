//! Crime Oracle
//!
//! Reputation and crime adjudication for a multiplayer world: every actor is
//! BLUE, GRAY or RED, and player actions (breaking blocks, looting, attacking,
//! killing) are judged against ownership, trust and combat history.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Daemon entrypoint
//! ├── config.rs      - Environment-driven configuration
//! ├── clock.rs       - Injectable time source and window checks
//! ├── error.rs       - Storage error type
//! ├── events.rs      - Broadcast notifications
//! ├── oracle.rs      - Component wiring and world event entry points
//! ├── scheduler.rs   - Periodic sweep loops
//! ├── reputation/    - Standing, tier and titles
//! │   ├── standing.rs - Clamped per-actor stats
//! │   ├── tier.rs     - BLUE/GRAY/RED derivation
//! │   ├── title.rs    - Cosmetic title ranks
//! │   └── manager.rs  - Cache, persistence and kill resolution
//! ├── crime/         - Crime records and ledger
//! ├── ownership/     - Block claims and grace-period crimes
//! ├── combat/        - Last-attacker tags
//! ├── trust/         - Owner-to-accessor trust relations
//! └── database/      - Storage traits and in-memory tables
//! ```

pub mod clock;
pub mod combat;
pub mod config;
pub mod crime;
pub mod database;
pub mod error;
pub mod events;
pub mod oracle;
pub mod ownership;
pub mod reputation;
pub mod scheduler;
pub mod trust;

/// Stable identity of a player
pub type ActorId = uuid::Uuid;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::OracleConfig;
pub use database::{MemoryDatabase, Stores};
pub use error::{StorageError, StorageResult};
pub use events::{EventBus, Notification};
pub use oracle::{CrimeOracle, TickReport};
pub use scheduler::{spawn_sweepers, Sweepers};

pub use combat::{CombatTag, CombatTracker};
pub use crime::{CrimeKind, CrimeLedger, CrimeRecord, CrimeReport};
pub use ownership::{
    Block, BlockLocation, BreakOutcome, OwnershipEngine, OwnershipRecord, PendingCrime,
    PlaceOutcome,
};
pub use reputation::{
    ActorStanding, KillOutcome, KillResolution, ReputationManager, ReputationTier, Title,
    TitleCatalog,
};
pub use trust::{TrustGate, TrustState};
