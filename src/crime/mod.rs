//! Crime Ledger
//!
//! Immediate crime recording and per-actor history. Every crime is an
//! immutable [`CrimeRecord`]; committing one also charges the actor's
//! standing through the reputation manager.

mod ledger;
mod record;

pub use ledger::CrimeLedger;
pub use record::{CrimeKind, CrimeRecord, CrimeReport};
