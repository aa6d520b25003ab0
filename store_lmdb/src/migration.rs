//! Schema upgrades for an existing ledger environment.
//!
//! Each step rewrites data for one version bump. All pending steps and the
//! new version stamp share one write transaction, so an interrupted upgrade
//! leaves the environment at its old version with its old contents.

use heed::RwTxn;

use groundtruth_types::{ActivityEntry, Report, Vote};

use crate::{LmdbEnvironment, LmdbError};

/// Schema version written by this build.
///
/// 1. Reports, chain records, time and cell indexes, votes, moderation log.
/// 2. Per-user activity log.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

type Step = fn(&LmdbEnvironment, &mut RwTxn<'_>) -> Result<(), LmdbError>;

/// `STEPS[v]` upgrades version `v` to `v + 1`.
const STEPS: [Step; CURRENT_SCHEMA_VERSION as usize] = [create_base_schema, backfill_activity];

pub struct Migrator;

impl Migrator {
    /// Bring `env` up to [`CURRENT_SCHEMA_VERSION`]. Returns the version the
    /// environment was at before.
    ///
    /// An environment stamped with a newer version was written by a newer
    /// build and is refused untouched.
    pub fn run(env: &LmdbEnvironment) -> Result<u32, LmdbError> {
        let found = env.schema_version_in(&env.env.read_txn()?)?;
        if found > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::Heed(format!(
                "schema version {found} is newer than this build's {CURRENT_SCHEMA_VERSION}"
            )));
        }
        if found == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = found, "schema current");
            return Ok(found);
        }

        let mut wtxn = env.env.write_txn()?;
        for (version, step) in STEPS.iter().enumerate().skip(found as usize) {
            tracing::info!(from = version, to = version + 1, "upgrading schema");
            step(env, &mut wtxn)?;
        }
        env.put_schema_version(&mut wtxn, CURRENT_SCHEMA_VERSION)?;
        wtxn.commit()?;

        tracing::info!(from = found, to = CURRENT_SCHEMA_VERSION, "schema upgraded");
        Ok(found)
    }
}

/// Databases are created on open; a blank environment has nothing to move.
fn create_base_schema(_env: &LmdbEnvironment, _wtxn: &mut RwTxn<'_>) -> Result<(), LmdbError> {
    Ok(())
}

/// Rebuild the activity log from stored reports and votes, oldest first.
/// Uploads sort before votes with the same timestamp.
fn backfill_activity(env: &LmdbEnvironment, wtxn: &mut RwTxn<'_>) -> Result<(), LmdbError> {
    if !env.activity_db.is_empty(wtxn)? {
        return Ok(());
    }

    let mut entries = Vec::new();
    for result in env.reports_db.iter(wtxn)? {
        let (_key, val) = result?;
        let report: Report = serde_json::from_slice(val)?;
        entries.push(ActivityEntry::upload(&report));
    }
    for result in env.votes_db.iter(wtxn)? {
        let (_key, val) = result?;
        let vote: Vote = serde_json::from_slice(val)?;
        entries.push(ActivityEntry::vote(&vote));
    }
    entries.sort_by_key(|e| e.timestamp);

    tracing::info!(entries = entries.len(), "backfilling activity log");
    for entry in &entries {
        env.put_activity(wtxn, entry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundtruth_store::{ActivityStore, MetaStore, ReportStore, VoteStore};
    use groundtruth_types::{
        ActivityAction, AnalysisSignal, ContentHash, GeoPoint, NewReport, PreviousHash, Timestamp,
        UserId, VoteChoice,
    };

    fn open(dir: &tempfile::TempDir) -> LmdbEnvironment {
        LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).expect("open env")
    }

    #[test]
    fn blank_environment_is_stamped_current() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = open(&dir);
        assert_eq!(Migrator::run(&env).unwrap(), 0);
        assert_eq!(env.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
        assert_eq!(Migrator::run(&env).unwrap(), CURRENT_SCHEMA_VERSION);
        assert!(env.activity_log(None).unwrap().is_empty());
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = open(&dir);
        env.set_schema_version(CURRENT_SCHEMA_VERSION + 1).unwrap();
        assert!(Migrator::run(&env).is_err());
        assert_eq!(env.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION + 1);
    }

    #[test]
    fn version_one_ledger_gets_activity_backfilled() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = open(&dir);
        let report = env
            .insert_report(NewReport {
                title: "landslide".into(),
                creator_id: UserId::new("carol").unwrap(),
                media_url: "file://l".into(),
                location: GeoPoint::new(3.0, 3.0).unwrap(),
                content_hash: ContentHash::new([4; 32]),
                previous_hash: PreviousHash::Genesis,
                timestamp: Timestamp::from_millis(20),
                analysis: AnalysisSignal::absent(),
            })
            .unwrap();
        env.insert_vote(&Vote {
            report_id: report.id.clone(),
            user_id: UserId::new("dave").unwrap(),
            vote: VoteChoice::Dispute,
            timestamp: Timestamp::from_millis(21),
        })
        .unwrap();

        // Roll the environment back to what a version 1 build left behind.
        let mut wtxn = env.env.write_txn().unwrap();
        env.activity_db.clear(&mut wtxn).unwrap();
        wtxn.commit().unwrap();
        env.set_schema_version(1).unwrap();

        assert_eq!(Migrator::run(&env).unwrap(), 1);
        let log = env.activity_log(None).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].user_id.as_str(), "carol");
        assert!(matches!(
            log[1].action,
            ActivityAction::CastVote {
                vote: VoteChoice::Dispute,
                ..
            }
        ));
    }
}
