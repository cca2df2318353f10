//! Notification Bus
//!
//! In-process, fire-and-forget publication of standing changes. Publishers
//! never wait on listeners; a publish with no subscribers is dropped.
//! Notifications are published only after the mutation that caused them is
//! visible in the owning cache.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::crime::CrimeKind;
use crate::reputation::{KillOutcome, ReputationTier};
use crate::ActorId;

/// Everything the core announces to its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    TierChanged {
        actor: ActorId,
        old: ReputationTier,
        new: ReputationTier,
    },
    CrimeCommitted {
        actor: ActorId,
        kind: CrimeKind,
        points: i32,
        victim: Option<ActorId>,
    },
    GoodDeed {
        actor: ActorId,
        alignment_gain: i32,
        fame_gain: i32,
    },
    PlayerKillResolved {
        killer: ActorId,
        victim: ActorId,
        victim_tier: ReputationTier,
        outcome: KillOutcome,
    },
}

/// Broadcast channel shared by every component of one oracle instance.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Notification>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn publish(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            debug!("Notification dropped, no subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Drain everything currently queued on a receiver without waiting.
pub fn drain(receiver: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(notification) => out.push(notification),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    out
}
