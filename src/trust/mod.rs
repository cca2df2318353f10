//! Trust Gate
//!
//! Per-pair consent overrides. Consulted by the ownership engine before
//! treating a break or a withdrawal as a crime, and by the oracle before
//! treating a hit as an attack.

mod gate;

pub use gate::{TrustGate, TrustState};
