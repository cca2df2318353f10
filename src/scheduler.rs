//! Background sweepers driving pending-crime confirmation and tag expiry

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::oracle::CrimeOracle;

/// Handles of the running sweep loops. Dropping this does not stop them.
pub struct Sweepers {
    pending: JoinHandle<()>,
    tags: JoinHandle<()>,
}

impl Sweepers {
    /// Abort both loops and wait for them to finish.
    pub async fn shutdown(self) {
        self.pending.abort();
        self.tags.abort();
        let _ = self.pending.await;
        let _ = self.tags.await;
        info!("Sweepers stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.pending.is_finished() && !self.tags.is_finished()
    }
}

/// Spawn one loop per sweep, each on its configured interval.
pub fn spawn_sweepers(oracle: Arc<CrimeOracle>) -> Sweepers {
    let pending_every = Duration::from_millis(oracle.config().ownership.sweep_interval_ms);
    let tags_every = Duration::from_millis(oracle.config().combat.sweep_interval_ms);

    let pending = {
        let oracle = oracle.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(pending_every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                match oracle.ownership().confirm_expired() {
                    Ok(confirmed) if !confirmed.is_empty() => {
                        debug!(count = confirmed.len(), "Pending sweep confirmed crimes");
                    }
                    Ok(_) => {}
                    // Entries were restored; the next tick retries them.
                    Err(e) => error!("Pending crime sweep failed: {}", e),
                }
            }
        })
    };

    let tags = tokio::spawn(async move {
        let mut interval = tokio::time::interval(tags_every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            oracle.combat().sweep_expired_tags();
        }
    });

    info!(
        pending_sweep_ms = pending_every.as_millis() as u64,
        tag_sweep_ms = tags_every.as_millis() as u64,
        "Sweepers started"
    );

    Sweepers { pending, tags }
}
