//! Vote uniqueness and consensus under concurrent voters, on both backends.

use std::sync::Arc;
use std::thread;

use groundtruth_nullables::{NullClock, NullStore};
use groundtruth_store::{LedgerStore, ModerationStore, ReportStore, VoteStore};
use groundtruth_store_lmdb::LmdbEnvironment;
use groundtruth_types::{
    AnalysisSignal, ContentHash, GeoPoint, ModerationAction, NewReport, PreviousHash, ReportId,
    ReportStatus, Timestamp, UserId, VoteChoice,
};
use groundtruth_verification::{ConsensusPolicy, VerificationError, VerificationLedger};
use proptest::prelude::*;

fn seed_report<S: LedgerStore>(store: &S) -> ReportId {
    store
        .insert_report(NewReport {
            title: "Wildfire smoke".into(),
            creator_id: UserId::new("reporter").unwrap(),
            media_url: "memory://smoke".into(),
            location: GeoPoint::new(34.05, -118.24).unwrap(),
            content_hash: ContentHash::new([5; 32]),
            previous_hash: PreviousHash::Genesis,
            timestamp: Timestamp::from_millis(1),
            analysis: AnalysisSignal::absent(),
        })
        .unwrap()
        .id
}

fn same_user_races<S: LedgerStore + 'static>(store: Arc<S>) {
    let id = seed_report(&*store);
    let ledger = VerificationLedger::new(
        Arc::clone(&store),
        Arc::new(NullClock::new(10)),
        ConsensusPolicy::default(),
    )
    .unwrap();

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let ledger = ledger.clone();
            let id = id.clone();
            thread::spawn(move || {
                let choice = if i % 2 == 0 {
                    VoteChoice::Verify
                } else {
                    VoteChoice::Dispute
                };
                ledger.cast_vote(&id, UserId::new("twice").unwrap(), choice)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    for r in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(r, VerificationError::DuplicateVote { .. }));
    }
    assert_eq!(store.votes_for(&id).unwrap().len(), 1);
}

#[test]
fn same_user_races_on_memory_store() {
    same_user_races(Arc::new(NullStore::new()));
}

#[test]
fn same_user_races_on_lmdb() {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 32 * 1024 * 1024).expect("open env");
    same_user_races(Arc::new(env));
}

#[test]
fn many_voters_reach_a_single_logged_verdict() {
    let store = Arc::new(NullStore::new());
    let id = seed_report(&*store);
    let ledger = VerificationLedger::new(
        Arc::clone(&store),
        Arc::new(NullClock::new(10)),
        ConsensusPolicy::default(),
    )
    .unwrap();

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let ledger = ledger.clone();
            let id = id.clone();
            thread::spawn(move || {
                ledger
                    .cast_vote(&id, UserId::new(format!("voter-{i}")).unwrap(), VoteChoice::Verify)
                    .unwrap()
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(store.tally(&id).unwrap().verify, 20);
    let report = store.get_report(&id).unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Verified);
    assert_eq!(store.moderation_log(Some(&id)).unwrap().len(), 1);
}

#[test]
fn archive_between_vote_and_verdict_sticks() {
    let store = Arc::new(NullStore::new());
    let id = seed_report(&*store);
    let ledger = VerificationLedger::new(
        Arc::clone(&store),
        Arc::new(NullClock::new(10)),
        ConsensusPolicy::new(1, 6_000).unwrap(),
    )
    .unwrap();

    let moderator = Arc::clone(&store);
    let archived = id.clone();
    store.before_next_settle(move || {
        moderator
            .update_report_status(
                &archived,
                ReportStatus::Archived,
                &UserId::new("admin").unwrap(),
                Timestamp::from_millis(5),
            )
            .unwrap();
    });

    let outcome = ledger
        .cast_vote(&id, UserId::new("voter").unwrap(), VoteChoice::Verify)
        .unwrap();
    assert!(!outcome.transitioned);
    assert_eq!(outcome.status, ReportStatus::Archived);

    let report = store.get_report(&id).unwrap().unwrap();
    assert_eq!(report.status, ReportStatus::Archived);
    assert_eq!(report.archived_at, Some(Timestamp::from_millis(5)));
    assert!(store.moderation_log(Some(&id)).unwrap().is_empty());
}

#[test]
fn verdict_counts_votes_committed_before_it() {
    let store = Arc::new(NullStore::new());
    let id = seed_report(&*store);
    let policy = ConsensusPolicy::new(1, 6_000).unwrap();
    let ledger =
        VerificationLedger::new(Arc::clone(&store), Arc::new(NullClock::new(10)), policy).unwrap();

    let other = ledger.clone();
    let disputed = id.clone();
    store.before_next_settle(move || {
        other
            .cast_vote(&disputed, UserId::new("second").unwrap(), VoteChoice::Dispute)
            .unwrap();
    });

    let outcome = ledger
        .cast_vote(&id, UserId::new("first").unwrap(), VoteChoice::Verify)
        .unwrap();
    assert_eq!((outcome.tally.verify, outcome.tally.dispute), (1, 1));
    assert_eq!(outcome.status, ReportStatus::UnderReview);

    let tally = store.tally(&id).unwrap();
    let report = store.get_report(&id).unwrap().unwrap();
    assert_eq!(report.status, policy.decide(ReportStatus::UnderReview, &tally));
    assert!(store.moderation_log(Some(&id)).unwrap().is_empty());
}

#[test]
fn split_vote_settles_on_final_tally_on_lmdb() {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 32 * 1024 * 1024).expect("open env");
    let store = Arc::new(env);
    let id = seed_report(&*store);
    let policy = ConsensusPolicy::new(1, 6_000).unwrap();
    let ledger =
        VerificationLedger::new(Arc::clone(&store), Arc::new(NullClock::new(10)), policy).unwrap();

    let handles: Vec<_> = (0..24)
        .map(|i| {
            let ledger = ledger.clone();
            let id = id.clone();
            thread::spawn(move || {
                let choice = if i % 3 == 0 {
                    VoteChoice::Dispute
                } else {
                    VoteChoice::Verify
                };
                ledger
                    .cast_vote(&id, UserId::new(format!("voter-{i}")).unwrap(), choice)
                    .unwrap()
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let tally = store.tally(&id).unwrap();
    assert_eq!((tally.verify, tally.dispute), (16, 8));
    let report = store.get_report(&id).unwrap().unwrap();
    assert_eq!(report.status, policy.decide(ReportStatus::UnderReview, &tally));

    // Each logged transition starts where the previous one ended.
    let mut status = ReportStatus::UnderReview;
    for entry in store.moderation_log(Some(&id)).unwrap() {
        let ModerationAction::ConsensusTransition { from, to, .. } = entry.action else {
            panic!("unexpected moderation entry {entry:?}");
        };
        assert_eq!(from, status);
        status = to;
    }
    assert_eq!(status, report.status);
}

proptest! {
    #[test]
    fn policy_outcome_matches_shares(verify in 0u32..50, dispute in 0u32..50, min in 1u32..10) {
        let policy = ConsensusPolicy::new(min, 6_000).unwrap();
        let tally = groundtruth_types::VoteTally { verify, dispute };
        let status = policy.decide(ReportStatus::UnderReview, &tally);
        let total = verify + dispute;
        if total < min {
            prop_assert_eq!(status, ReportStatus::UnderReview);
        } else if verify * 10_000 / total >= 6_000 {
            prop_assert_eq!(status, ReportStatus::Verified);
        } else if dispute * 10_000 / total >= 6_000 {
            prop_assert_eq!(status, ReportStatus::Disputed);
        } else {
            prop_assert_eq!(status, ReportStatus::UnderReview);
        }
    }
}
