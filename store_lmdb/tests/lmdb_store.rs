//! End-to-end tests of the LMDB backend through the store traits.

use std::sync::Arc;
use std::thread;

use groundtruth_store::{
    ChainStore, GeoFilter, ReportFilter, ReportStore, StoreError, VoteStore,
};
use groundtruth_store_lmdb::{check_integrity, LmdbEnvironment};
use groundtruth_types::{
    AnalysisSignal, ContentHash, GeoPoint, NewReport, PreviousHash, ReportStatus, Timestamp,
    UserId, Vote, VoteChoice,
};

fn open() -> (tempfile::TempDir, Arc<LmdbEnvironment>) {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), 64 * 1024 * 1024).expect("open env");
    (dir, Arc::new(env))
}

fn submission(n: u32, previous: PreviousHash, ts: u64, point: GeoPoint) -> NewReport {
    let mut hash = [0u8; 32];
    hash[..4].copy_from_slice(&n.to_be_bytes());
    NewReport {
        title: format!("report {n}"),
        creator_id: UserId::new("reporter").unwrap(),
        media_url: format!("file://media/{n}"),
        location: point,
        content_hash: ContentHash::new(hash),
        previous_hash: previous,
        timestamp: Timestamp::from_millis(ts),
        analysis: AnalysisSignal::absent(),
    }
}

fn append(env: &LmdbEnvironment, n: u32, ts: u64, point: GeoPoint) -> groundtruth_types::Report {
    loop {
        let previous = env
            .find_latest()
            .unwrap()
            .map(|h| PreviousHash::from(h.content_hash))
            .unwrap_or(PreviousHash::Genesis);
        match env.insert_report(submission(n, previous, ts, point)) {
            Ok(report) => return report,
            Err(StoreError::Conflict { .. }) => continue,
            Err(e) => panic!("insert failed: {e}"),
        }
    }
}

#[test]
fn concurrent_appends_form_a_single_chain() {
    let (_dir, env) = open();
    let point = GeoPoint::new(51.5, -0.12).unwrap();

    let handles: Vec<_> = (0..8u32)
        .map(|t| {
            let env = Arc::clone(&env);
            thread::spawn(move || {
                for i in 0..10u32 {
                    append(&env, t * 100 + i, 1_000, point);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let records = env.chain_records().unwrap();
    assert_eq!(records.len(), 80);
    assert!(records[0].previous_hash.is_genesis());
    for pair in records.windows(2) {
        assert_eq!(pair[1].previous_hash, PreviousHash::Hash(pair[0].hash));
    }
    assert!(check_integrity(&env).unwrap().is_healthy());
}

#[test]
fn proximity_filter_separates_close_and_far_reports() {
    let (_dir, env) = open();
    let center = GeoPoint::new(40.7128, -74.0060).unwrap();
    let close = append(&env, 1, 10, center);
    // Roughly 50 km north.
    let far = append(&env, 2, 20, GeoPoint::new(41.1625, -74.0060).unwrap());

    let within = |radius| ReportFilter {
        status: None,
        near: Some(GeoFilter {
            center,
            radius_meters: radius,
        }),
    };

    let hits = env.find_by_filter(&within(1.0)).unwrap();
    assert_eq!(hits.iter().map(|r| &r.id).collect::<Vec<_>>(), vec![&close.id]);

    let hits = env.find_by_filter(&within(60_000.0)).unwrap();
    assert_eq!(
        hits.iter().map(|r| &r.id).collect::<Vec<_>>(),
        vec![&far.id, &close.id]
    );
}

#[test]
fn status_filter_and_newest_first() {
    let (_dir, env) = open();
    let p = GeoPoint::new(0.0, 0.0).unwrap();
    let a = append(&env, 1, 10, p);
    let b = append(&env, 2, 30, p);
    let c = append(&env, 3, 20, p);
    env.update_report_status(
        &b.id,
        ReportStatus::Verified,
        &UserId::new("mod").unwrap(),
        Timestamp::from_millis(40),
    )
    .unwrap();

    let all = env.find_by_filter(&ReportFilter::default()).unwrap();
    // `c` was stored with the head's timestamp (30), after `b`.
    assert_eq!(c.timestamp, Timestamp::from_millis(30));
    assert_eq!(
        all.iter().map(|r| &r.id).collect::<Vec<_>>(),
        vec![&c.id, &b.id, &a.id]
    );

    let verified = env
        .find_by_filter(&ReportFilter {
            status: Some(ReportStatus::Verified),
            near: None,
        })
        .unwrap();
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].id, b.id);
}

#[test]
fn racing_duplicate_votes_store_exactly_one() {
    let (_dir, env) = open();
    let report = append(&env, 1, 10, GeoPoint::new(0.0, 0.0).unwrap());

    let handles: Vec<_> = (0..16u64)
        .map(|i| {
            let env = Arc::clone(&env);
            let id = report.id.clone();
            thread::spawn(move || {
                env.insert_vote(&Vote {
                    report_id: id,
                    user_id: UserId::new("same-user").unwrap(),
                    vote: if i % 2 == 0 {
                        VoteChoice::Verify
                    } else {
                        VoteChoice::Dispute
                    },
                    timestamp: Timestamp::from_millis(100 + i),
                })
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, StoreError::DuplicateVote { .. })));
    assert_eq!(env.votes_for(&report.id).unwrap().len(), 1);
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let id = {
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let report = append(&env, 1, 10, GeoPoint::new(0.0, 0.0).unwrap());
        env.close();
        report.id
    };
    let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
    assert_eq!(env.find_latest().unwrap().unwrap().id, id);
}
