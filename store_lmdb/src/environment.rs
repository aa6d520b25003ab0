//! LMDB environment setup and teardown.

use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions, RoTxn};

use crate::keys::prefix_upper_bound;
use crate::LmdbError;

/// Number of named databases this environment creates.
pub const DATABASE_COUNT: u32 = 9;

/// Default LMDB map size (1 GiB).
pub const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;

/// Wraps the LMDB environment and all database handles.
///
/// Constructed once at startup, shared behind an `Arc`, and torn down with
/// [`LmdbEnvironment::close`] on shutdown.
pub struct LmdbEnvironment {
    pub(crate) env: Arc<Env>,
    /// `seq` → report document.
    pub(crate) reports_db: Database<Bytes, Bytes>,
    /// `seq` → chain record document.
    pub(crate) chain_db: Database<Bytes, Bytes>,
    /// Temporal index: `timestamp ++ seq` → empty.
    pub(crate) by_time_db: Database<Bytes, Bytes>,
    /// Spatial index: `cell ++ seq` → empty.
    pub(crate) by_cell_db: Database<Bytes, Bytes>,
    /// `report_id ++ 0x00 ++ user_id` → vote document.
    pub(crate) votes_db: Database<Bytes, Bytes>,
    /// `seq` → moderation log entry.
    pub(crate) moderation_db: Database<Bytes, Bytes>,
    /// `seq` → activity log entry.
    pub(crate) activity_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process and every
        // handle to it lives behind the returned `Arc`.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(DATABASE_COUNT)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let reports_db = env.create_database(&mut wtxn, Some("reports"))?;
        let chain_db = env.create_database(&mut wtxn, Some("chain"))?;
        let by_time_db = env.create_database(&mut wtxn, Some("reports_by_time"))?;
        let by_cell_db = env.create_database(&mut wtxn, Some("reports_by_cell"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let moderation_db = env.create_database(&mut wtxn, Some("moderation_log"))?;
        let activity_db = env.create_database(&mut wtxn, Some("activity_log"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");

        Ok(Self {
            env: Arc::new(env),
            reports_db,
            chain_db,
            by_time_db,
            by_cell_db,
            votes_db,
            moderation_db,
            activity_db,
            meta_db,
        })
    }

    /// Flush and close the environment.
    ///
    /// If other clones of the inner `Arc<Env>` are still alive the close is
    /// deferred to the last drop.
    pub fn close(self) {
        match Arc::try_unwrap(self.env) {
            Ok(env) => {
                env.prepare_for_closing().wait();
                tracing::info!("closed LMDB environment");
            }
            Err(_) => {
                tracing::warn!("LMDB environment still shared; close deferred to last handle");
            }
        }
    }
}

/// Next free sequence number in a `seq`-keyed database.
pub(crate) fn next_seq(db: &Database<Bytes, Bytes>, txn: &RoTxn) -> Result<u64, LmdbError> {
    match db.last(txn)? {
        Some((key, _)) => {
            let seq = crate::keys::seq_from_key(key)
                .ok_or_else(|| LmdbError::Serialization("invalid sequence key length".into()))?;
            Ok(seq + 1)
        }
        None => Ok(0),
    }
}

/// Prefix range-scan: collect all (key, value) pairs whose key starts with `prefix`.
pub(crate) fn range_scan(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LmdbError> {
    let upper = prefix_upper_bound(prefix);
    let end = match &upper {
        Some(upper) => Bound::Excluded(upper.as_slice()),
        None => Bound::Unbounded,
    };
    let bounds = (Bound::Included(prefix), end);
    let iter = db.range(txn, &bounds)?;
    let mut results = Vec::new();
    for result in iter {
        let (key, val) = result?;
        results.push((key.to_vec(), val.to_vec()));
    }
    Ok(results)
}
