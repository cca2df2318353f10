//! Integration tests for the Crime Oracle
//!
//! These tests drive the oracle end to end through its public API: standing
//! invariants, grace-period crimes, combat attribution, kill resolution,
//! trust overrides and storage failures.

use chrono::Duration;
use crime_oracle::events::drain;
use crime_oracle::{
    ActorId, ActorStanding, Block, BlockLocation, BreakOutcome, CrimeKind, CrimeOracle,
    CrimeReport, KillOutcome, ManualClock, MemoryDatabase, Notification, OracleConfig,
    PlaceOutcome, ReputationTier, StorageError, TrustState,
};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Test Helpers
// ============================================================================

struct Harness {
    db: MemoryDatabase,
    clock: Arc<ManualClock>,
    oracle: Arc<CrimeOracle>,
}

/// Oracle over fresh in-memory tables with a manual clock
fn create_test_oracle() -> Harness {
    let db = MemoryDatabase::new();
    let clock = Arc::new(ManualClock::starting_now());
    let oracle = Arc::new(CrimeOracle::new(
        OracleConfig::default(),
        db.stores(),
        clock.clone(),
    ));
    Harness { db, clock, oracle }
}

/// Join a new actor and return its id
fn join(harness: &Harness) -> ActorId {
    let actor = Uuid::new_v4();
    harness.oracle.on_player_join(&actor).unwrap();
    actor
}

fn test_location(x: i32) -> BlockLocation {
    BlockLocation::new("overworld", x, 64, -12)
}

// ============================================================================
// Standing Invariants
// ============================================================================

mod standing_invariants {
    use super::*;

    #[test]
    fn test_values_stay_clamped() {
        let mut standing = ActorStanding::new(Uuid::new_v4(), chrono::Utc::now());

        for delta in [600, 600, -5000, 2000, i32::MAX, i32::MIN] {
            standing.add_crime_points(delta);
            standing.add_fame(delta);
            standing.add_alignment(delta);

            assert!((0..=1000).contains(&standing.crime_point));
            assert!((0..=1000).contains(&standing.fame));
            assert!((-1000..=1000).contains(&standing.alignment));
        }
    }

    #[test]
    fn test_kill_count_has_priority_over_crime_points() {
        let mut standing = ActorStanding::new(Uuid::new_v4(), chrono::Utc::now());
        standing.record_kill();
        assert_eq!(standing.crime_point, 0);
        assert_eq!(standing.tier(), ReputationTier::Red);

        standing.add_crime_points(50);
        assert_eq!(standing.tier(), ReputationTier::Red);
    }

    #[test]
    fn test_crimes_through_oracle_stay_clamped() {
        let harness = create_test_oracle();
        let actor = join(&harness);

        for _ in 0..120 {
            harness
                .oracle
                .ledger()
                .commit_crime(CrimeReport::new(actor, CrimeKind::Theft, 10))
                .unwrap();
        }

        let standing = harness.oracle.reputation().standing(&actor).unwrap();
        assert_eq!(standing.crime_point, 1000);
        assert_eq!(standing.alignment, -1000);
        assert_eq!(standing.tier(), ReputationTier::Gray);
    }
}

// ============================================================================
// Crime Ledger Tests
// ============================================================================

mod crime_ledger {
    use super::*;

    #[test]
    fn test_commit_then_query_round_trip() {
        let harness = create_test_oracle();
        let (actor, victim) = (join(&harness), Uuid::new_v4());

        let committed = harness
            .oracle
            .ledger()
            .commit_crime(CrimeReport::new(actor, CrimeKind::Theft, 10).against(victim))
            .unwrap()
            .unwrap();

        let page = harness.oracle.ledger().history(&actor, 1, 10).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].kind, committed.kind);
        assert_eq!(page[0].points, 10);
        assert_eq!(page[0].victim_id, Some(victim));
    }

    #[test]
    fn test_unloaded_actor_is_not_charged() {
        let harness = create_test_oracle();
        let stranger = Uuid::new_v4();

        let result = harness
            .oracle
            .ledger()
            .commit_crime(CrimeReport::new(stranger, CrimeKind::Destroy, 10))
            .unwrap();
        assert!(result.is_none());
        assert_eq!(harness.oracle.ledger().history_count(&stranger).unwrap(), 0);
    }

    #[test]
    fn test_crime_notification_published() {
        let harness = create_test_oracle();
        let actor = join(&harness);
        let mut receiver = harness.oracle.subscribe();

        harness
            .oracle
            .ledger()
            .commit_crime(CrimeReport::new(actor, CrimeKind::Attack, 5))
            .unwrap();

        let notifications = drain(&mut receiver);
        assert!(notifications.contains(&Notification::TierChanged {
            actor,
            old: ReputationTier::Blue,
            new: ReputationTier::Gray,
        }));
        assert!(notifications.iter().any(|n| matches!(
            n,
            Notification::CrimeCommitted { kind: CrimeKind::Attack, points: 5, .. }
        )));
    }
}

// ============================================================================
// Grace-Period Tests
// ============================================================================

mod grace_period {
    use super::*;

    fn break_owned_block(harness: &Harness) -> (ActorId, ActorId, BlockLocation) {
        let owner = Uuid::new_v4();
        let actor = join(harness);
        let location = test_location(3);

        harness
            .oracle
            .ownership()
            .register_ownership(&location, &owner)
            .unwrap();
        let outcome = harness
            .oracle
            .ownership()
            .on_block_break(&location, &actor, &Block::solid("oak_planks"))
            .unwrap();
        assert!(matches!(outcome, BreakOutcome::Pending(_)));

        (owner, actor, location)
    }

    #[test]
    fn test_replacement_within_grace_cancels() {
        let harness = create_test_oracle();
        let (owner, actor, location) = break_owned_block(&harness);
        let before = harness.oracle.reputation().standing(&actor).unwrap();

        harness.clock.advance(Duration::seconds(2));
        let placed = harness
            .oracle
            .ownership()
            .on_block_place(&location, &actor, &Block::solid("oak_planks"))
            .unwrap();
        assert_eq!(placed, PlaceOutcome::Restored);

        harness.clock.advance(Duration::seconds(4));
        let report = harness.oracle.tick().unwrap();
        assert_eq!(report.confirmed_crimes, 0);

        assert_eq!(harness.oracle.ledger().history_count(&actor).unwrap(), 0);
        assert_eq!(harness.oracle.reputation().standing(&actor).unwrap(), before);
        assert_eq!(
            harness.oracle.ownership().owner_of(&location).unwrap().map(|r| r.owner),
            Some(owner)
        );
    }

    #[test]
    fn test_sweep_after_grace_confirms() {
        let harness = create_test_oracle();
        let (owner, actor, location) = break_owned_block(&harness);

        harness.clock.advance(Duration::seconds(6));
        let report = harness.oracle.tick().unwrap();
        assert_eq!(report.confirmed_crimes, 1);

        let history = harness.oracle.ledger().history(&actor, 1, 10).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, CrimeKind::Destroy);
        assert_eq!(history[0].victim_id, Some(owner));
        assert_eq!(history[0].location.as_ref(), Some(&location));

        let standing = harness.oracle.reputation().standing(&actor).unwrap();
        assert_eq!(standing.alignment, -10);
        assert_eq!(standing.tier(), ReputationTier::Gray);
        assert!(harness.oracle.ownership().owner_of(&location).unwrap().is_none());
    }

    #[test]
    fn test_cancel_twice_is_safe() {
        let harness = create_test_oracle();
        let (_, actor, location) = break_owned_block(&harness);
        let ownership = harness.oracle.ownership();

        assert!(ownership.cancel_pending_crime(&location, &actor, "oak_planks"));
        assert!(!ownership.cancel_pending_crime(&location, &actor, "oak_planks"));
        assert_eq!(ownership.pending_count(), 0);
    }

    #[test]
    fn test_different_block_does_not_cancel() {
        let harness = create_test_oracle();
        let (_, actor, location) = break_owned_block(&harness);

        assert!(!harness
            .oracle
            .ownership()
            .cancel_pending_crime(&location, &actor, "dirt"));
        assert_eq!(harness.oracle.ownership().pending_count(), 1);
    }

    #[test]
    fn test_container_break_is_immediate() {
        let harness = create_test_oracle();
        let owner = Uuid::new_v4();
        let actor = join(&harness);
        let chest = test_location(9);

        harness.oracle.ownership().register_ownership(&chest, &owner).unwrap();
        let outcome = harness
            .oracle
            .ownership()
            .on_block_break(&chest, &actor, &Block::container("chest"))
            .unwrap();

        assert!(matches!(outcome, BreakOutcome::ImmediateCrime(Some(_))));
        assert_eq!(harness.oracle.ownership().pending_count(), 0);
    }

    #[test]
    fn test_explosions_skip_owned_blocks() {
        let harness = create_test_oracle();
        let owner = Uuid::new_v4();
        harness
            .oracle
            .ownership()
            .register_ownership(&test_location(1), &owner)
            .unwrap();

        let allowed = harness
            .oracle
            .ownership()
            .filter_explosion(vec![test_location(1), test_location(2)])
            .unwrap();
        assert_eq!(allowed, vec![test_location(2)]);
    }
}

// ============================================================================
// Combat Attribution Tests
// ============================================================================

mod combat_attribution {
    use super::*;

    #[test]
    fn test_last_attacker_inside_window() {
        let harness = create_test_oracle();
        let (attacker, victim) = (join(&harness), join(&harness));

        harness.oracle.on_player_attack(&attacker, &victim, 4.0, true).unwrap();

        harness.clock.advance(Duration::seconds(5));
        assert_eq!(harness.oracle.combat().find_last_attacker(&victim), Some(attacker));

        harness.clock.advance(Duration::seconds(6));
        assert_eq!(harness.oracle.combat().find_last_attacker(&victim), None);
    }

    #[test]
    fn test_sweep_removes_stale_tags() {
        let harness = create_test_oracle();
        let (attacker, victim) = (join(&harness), join(&harness));

        harness.oracle.on_player_attack(&attacker, &victim, 1.0, false).unwrap();
        harness.clock.advance(Duration::seconds(10));

        let report = harness.oracle.tick().unwrap();
        assert_eq!(report.expired_tags, 1);
        assert!(harness.oracle.combat().is_empty());
    }

    #[test]
    fn test_most_recent_attacker_wins() {
        let harness = create_test_oracle();
        let (first, second, victim) = (join(&harness), join(&harness), join(&harness));

        harness.oracle.on_player_attack(&first, &victim, 1.0, false).unwrap();
        harness.clock.advance(Duration::seconds(1));
        harness.oracle.on_player_attack(&second, &victim, 1.0, false).unwrap();

        assert_eq!(harness.oracle.combat().find_last_attacker(&victim), Some(second));
    }
}

// ============================================================================
// Kill Resolution Tests
// ============================================================================

mod kill_resolution {
    use super::*;

    #[test]
    fn test_blue_kills_blue() {
        let harness = create_test_oracle();
        let (killer, victim) = (join(&harness), join(&harness));
        let mut receiver = harness.oracle.subscribe();

        let resolution = harness
            .oracle
            .on_player_death(&victim, Some(killer))
            .unwrap()
            .unwrap();
        assert_eq!(resolution.outcome, KillOutcome::Murder);
        assert_eq!(resolution.killer_tier_before, ReputationTier::Blue);

        let standing = harness.oracle.reputation().standing(&killer).unwrap();
        assert_eq!(standing.kill_count, 1);
        assert_eq!(standing.alignment, -1000);
        assert_eq!(standing.tier(), ReputationTier::Red);

        let notifications = drain(&mut receiver);
        assert!(notifications.contains(&Notification::TierChanged {
            actor: killer,
            old: ReputationTier::Blue,
            new: ReputationTier::Red,
        }));
    }

    #[test]
    fn test_killing_red_is_bounty() {
        let harness = create_test_oracle();
        let (hunter, outlaw, innocent) = (join(&harness), join(&harness), join(&harness));

        harness.oracle.on_player_death(&innocent, Some(outlaw)).unwrap();
        let resolution = harness
            .oracle
            .on_player_death(&outlaw, Some(hunter))
            .unwrap()
            .unwrap();
        assert_eq!(resolution.victim_tier, ReputationTier::Red);
        assert_eq!(resolution.outcome, KillOutcome::Bounty);

        let standing = harness.oracle.reputation().standing(&hunter).unwrap();
        assert_eq!(standing.kill_count, 0);
        assert_eq!(standing.tier(), ReputationTier::Blue);
        assert_eq!(standing.alignment, 50);
        assert_eq!(standing.fame, 50);
    }

    #[test]
    fn test_killing_gray_changes_nothing() {
        let harness = create_test_oracle();
        let (killer, thief) = (join(&harness), join(&harness));
        harness
            .oracle
            .ledger()
            .commit_crime(CrimeReport::new(thief, CrimeKind::Theft, 10))
            .unwrap();

        let before = harness.oracle.reputation().standing(&killer).unwrap();
        let resolution = harness
            .oracle
            .on_player_death(&thief, Some(killer))
            .unwrap()
            .unwrap();
        assert_eq!(resolution.outcome, KillOutcome::Unpunished);

        let after = harness.oracle.reputation().standing(&killer).unwrap();
        assert_eq!(after.kill_count, before.kill_count);
        assert_eq!(after.alignment, before.alignment);
    }

    #[test]
    fn test_standing_survives_rejoin() {
        let harness = create_test_oracle();
        let (killer, victim) = (join(&harness), join(&harness));
        harness.oracle.on_player_death(&victim, Some(killer)).unwrap();

        harness.oracle.on_player_leave(&killer).unwrap();
        assert!(!harness.oracle.reputation().is_loaded(&killer));
        assert_eq!(harness.db.stored_standings(), 1);

        let rejoined = harness.oracle.on_player_join(&killer).unwrap();
        assert_eq!(rejoined.kill_count, 1);
        assert_eq!(rejoined.tier(), ReputationTier::Red);
    }
}

// ============================================================================
// Trust Tests
// ============================================================================

mod trust {
    use super::*;

    #[test]
    fn test_trust_grants_and_revokes_access() {
        let harness = create_test_oracle();
        let (owner, friend) = (Uuid::new_v4(), join(&harness));
        let location = test_location(7);
        let ownership = harness.oracle.ownership();
        let trust = harness.oracle.trust();

        ownership.register_ownership(&location, &owner).unwrap();
        assert!(!ownership.can_access(&location, &friend).unwrap());

        trust.set_trust_state(&owner, &friend, TrustState::Trust).unwrap();
        assert!(ownership.can_access(&location, &friend).unwrap());
        assert_ne!(ownership.owner_of(&location).unwrap().map(|r| r.owner), Some(friend));

        assert!(trust.remove_trust_state(&owner, &friend).unwrap());
        assert!(!ownership.can_access(&location, &friend).unwrap());
    }

    #[test]
    fn test_distrust_behaves_like_unset() {
        let harness = create_test_oracle();
        let (owner, rival) = (Uuid::new_v4(), join(&harness));
        let chest = test_location(8);

        harness.oracle.ownership().register_ownership(&chest, &owner).unwrap();
        harness
            .oracle
            .trust()
            .set_trust_state(&owner, &rival, TrustState::Distrust)
            .unwrap();

        let theft = harness
            .oracle
            .ownership()
            .on_container_withdraw(&chest, &rival, Some("diamond x3"))
            .unwrap();
        assert_eq!(theft.map(|c| c.kind), Some(CrimeKind::Theft));
    }

    #[test]
    fn test_trusted_hit_is_not_attack() {
        let harness = create_test_oracle();
        let (a, b) = (join(&harness), join(&harness));
        harness.oracle.trust().set_trust_state(&b, &a, TrustState::Trust).unwrap();

        assert!(harness.oracle.on_player_attack(&a, &b, 2.0, false).unwrap().is_none());
        assert_eq!(
            harness.oracle.reputation().current_tier(&a).unwrap(),
            Some(ReputationTier::Blue)
        );
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod error_handling {
    use super::*;

    #[test]
    fn test_storage_failure_leaves_state_untouched() {
        let harness = create_test_oracle();
        let actor = join(&harness);
        let before = harness.oracle.reputation().standing(&actor).unwrap();

        harness.db.set_available(false);
        let result = harness
            .oracle
            .ledger()
            .commit_crime(CrimeReport::new(actor, CrimeKind::Theft, 10));
        assert!(matches!(result, Err(StorageError::Unavailable(_))));
        assert_eq!(harness.oracle.reputation().standing(&actor).unwrap(), before);

        harness.db.set_available(true);
        assert_eq!(harness.oracle.ledger().history_count(&actor).unwrap(), 0);
    }

    #[test]
    fn test_failed_confirmation_is_retried() {
        let harness = create_test_oracle();
        let owner = Uuid::new_v4();
        let actor = join(&harness);
        let location = test_location(4);

        harness.oracle.ownership().register_ownership(&location, &owner).unwrap();
        harness
            .oracle
            .ownership()
            .on_block_break(&location, &actor, &Block::solid("glass"))
            .unwrap();
        harness.clock.advance(Duration::seconds(6));

        harness.db.set_available(false);
        assert!(harness.oracle.tick().is_err());
        assert_eq!(harness.oracle.ownership().pending_count(), 1);

        harness.db.set_available(true);
        assert_eq!(harness.oracle.tick().unwrap().confirmed_crimes, 1);
    }

    #[test]
    fn test_failed_leave_keeps_actor_loaded() {
        let harness = create_test_oracle();
        let actor = join(&harness);

        harness.db.set_available(false);
        assert!(harness.oracle.on_player_leave(&actor).is_err());
        assert!(harness.oracle.reputation().is_loaded(&actor));
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn test_concurrent_crimes_are_all_counted() {
        let harness = create_test_oracle();
        let actor = join(&harness);

        let mut handles = vec![];
        for _ in 0..20 {
            let oracle = harness.oracle.clone();
            handles.push(tokio::spawn(async move {
                oracle
                    .ledger()
                    .commit_crime(CrimeReport::new(actor, CrimeKind::Theft, 3))
                    .unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        let standing = harness.oracle.reputation().standing(&actor).unwrap();
        assert_eq!(standing.crime_point, 60);
        assert_eq!(harness.oracle.ledger().history_count(&actor).unwrap(), 20);
    }

    #[tokio::test]
    async fn test_cancel_races_sweep_exactly_once() {
        let harness = create_test_oracle();
        let owner = Uuid::new_v4();
        let actor = join(&harness);
        let location = test_location(5);

        harness.oracle.ownership().register_ownership(&location, &owner).unwrap();
        harness
            .oracle
            .ownership()
            .on_block_break(&location, &actor, &Block::solid("stone"))
            .unwrap();
        harness.clock.advance(Duration::seconds(5));

        let sweeper = {
            let oracle = harness.oracle.clone();
            tokio::spawn(async move { oracle.tick().unwrap().confirmed_crimes })
        };
        let cancelled = harness
            .oracle
            .ownership()
            .cancel_pending_crime(&location, &actor, "stone");
        let confirmed = sweeper.await.unwrap();

        // the grace window is over, so only the sweep can win
        assert!(!cancelled);
        assert_eq!(confirmed, 1);
    }
}
