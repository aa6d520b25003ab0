//! LMDB implementation of ReportStore and ChainStore.
//!
//! A report insert writes four databases in one write transaction: the
//! report document, its chain record, the temporal index entry, and the
//! spatial index entry. The head check runs inside that same transaction,
//! so a concurrent insert can never slip between check and write.

use std::collections::BTreeSet;

use heed::RoTxn;

use groundtruth_store::{
    check_chain_append, sort_newest_first, ChainStore, GeoFilter, ReportFilter, ReportStore,
    StatusChange, StoreError,
};
use groundtruth_types::{
    ActivityEntry, ChainRecord, GeoCell, NewReport, Report, ReportId, ReportStatus, Timestamp,
    UserId,
};

use crate::environment::{next_seq, range_scan};
use crate::keys::{cell_key, seq_key, seq_suffix, time_key};
use crate::{LmdbEnvironment, LmdbError};

impl LmdbEnvironment {
    pub(crate) fn load_report(&self, txn: &RoTxn, seq: u64) -> Result<Option<Report>, LmdbError> {
        match self.reports_db.get(txn, &seq_key(seq))? {
            Some(bytes) => Ok(Some(serde_json::from_slice(bytes)?)),
            None => Ok(None),
        }
    }

    fn head(&self, txn: &RoTxn) -> Result<Option<Report>, LmdbError> {
        let Some((key, _)) = self.by_time_db.last(txn)? else {
            return Ok(None);
        };
        let seq = seq_suffix(key)
            .ok_or_else(|| LmdbError::Serialization("invalid time index key".into()))?;
        self.load_report(txn, seq)?
            .map(Some)
            .ok_or_else(|| LmdbError::NotFound(format!("report seq {seq} (time index)")))
    }

    /// Sequence numbers of reports whose cell could hold a match, or `None`
    /// when the radius is too large for the grid to help.
    fn spatial_candidates(
        &self,
        txn: &RoTxn,
        geo: &GeoFilter,
    ) -> Result<Option<BTreeSet<u64>>, LmdbError> {
        let Some(cells) = GeoCell::covering(&geo.center, geo.radius_meters) else {
            return Ok(None);
        };
        let mut seqs = BTreeSet::new();
        for cell in cells {
            for (key, _) in range_scan(&self.by_cell_db, txn, &cell.to_bytes())? {
                if let Some(seq) = seq_suffix(&key) {
                    seqs.insert(seq);
                }
            }
        }
        Ok(Some(seqs))
    }
}

impl ReportStore for LmdbEnvironment {
    fn insert_report(&self, report: NewReport) -> Result<Report, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let head = self.head(&wtxn)?;
        // Returning early drops `wtxn`, which aborts it.
        let timestamp = check_chain_append(&report, head.as_ref())?;

        let seq = next_seq(&self.reports_db, &wtxn)?;
        let mut stored = Report::from_new(ReportId::from_sequence(seq), report);
        stored.timestamp = timestamp;

        let doc = serde_json::to_vec(&stored).map_err(LmdbError::from)?;
        let chain_doc = serde_json::to_vec(&stored.chain_record()).map_err(LmdbError::from)?;
        let cell = GeoCell::containing(&stored.location);

        self.reports_db
            .put(&mut wtxn, &seq_key(seq), &doc)
            .map_err(LmdbError::from)?;
        self.chain_db
            .put(&mut wtxn, &seq_key(seq), &chain_doc)
            .map_err(LmdbError::from)?;
        self.by_time_db
            .put(&mut wtxn, &time_key(timestamp, seq), &[])
            .map_err(LmdbError::from)?;
        self.by_cell_db
            .put(&mut wtxn, &cell_key(cell, seq), &[])
            .map_err(LmdbError::from)?;
        self.put_activity(&mut wtxn, &ActivityEntry::upload(&stored))?;
        wtxn.commit().map_err(LmdbError::from)?;

        tracing::debug!(
            id = %stored.id,
            hash = %stored.content_hash,
            previous = %stored.previous_hash,
            "report appended"
        );
        Ok(stored)
    }

    fn find_latest(&self) -> Result<Option<Report>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.head(&rtxn)?)
    }

    fn get_report(&self, id: &ReportId) -> Result<Option<Report>, StoreError> {
        let Some(seq) = id.sequence() else {
            return Ok(None);
        };
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.load_report(&rtxn, seq)?)
    }

    fn find_by_filter(&self, filter: &ReportFilter) -> Result<Vec<Report>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;

        let candidates = match &filter.near {
            Some(geo) => self.spatial_candidates(&rtxn, geo)?,
            None => None,
        };

        let mut out = Vec::new();
        match candidates {
            Some(seqs) => {
                for seq in seqs {
                    if let Some(report) = self.load_report(&rtxn, seq)? {
                        if filter.matches(&report) {
                            out.push(report);
                        }
                    }
                }
            }
            None => {
                let iter = self.by_time_db.rev_iter(&rtxn).map_err(LmdbError::from)?;
                for result in iter {
                    let (key, _) = result.map_err(LmdbError::from)?;
                    let seq = seq_suffix(key)
                        .ok_or_else(|| LmdbError::Serialization("invalid time index key".into()))?;
                    if let Some(report) = self.load_report(&rtxn, seq)? {
                        if filter.matches(&report) {
                            out.push(report);
                        }
                    }
                }
            }
        }
        sort_newest_first(&mut out);
        Ok(out)
    }

    fn update_report_status(
        &self,
        id: &ReportId,
        status: ReportStatus,
        actor: &UserId,
        at: Timestamp,
    ) -> Result<StatusChange, StoreError> {
        let seq = id
            .sequence()
            .ok_or_else(|| StoreError::NotFound(format!("report {id}")))?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut report = self
            .load_report(&wtxn, seq)?
            .ok_or_else(|| StoreError::NotFound(format!("report {id}")))?;

        let from = report.status;
        if !report.apply_status(status, actor, at) {
            return Ok(StatusChange::Unchanged(report));
        }

        let doc = serde_json::to_vec(&report).map_err(LmdbError::from)?;
        self.reports_db
            .put(&mut wtxn, &seq_key(seq), &doc)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(StatusChange::Changed { from, report })
    }

    fn report_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.reports_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

impl ChainStore for LmdbEnvironment {
    fn chain_records(&self) -> Result<Vec<ChainRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut records = Vec::new();
        let iter = self.chain_db.iter(&rtxn).map_err(LmdbError::from)?;
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            records.push(serde_json::from_slice(val).map_err(LmdbError::from)?);
        }
        Ok(records)
    }

    fn chain_len(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.chain_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundtruth_types::{AnalysisSignal, ContentHash, GeoPoint, PreviousHash};

    fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 64 * 1024 * 1024).expect("open env");
        (dir, env)
    }

    fn new_report(hash: u8, prev: PreviousHash, ts: u64, lat: f64, long: f64) -> NewReport {
        NewReport {
            title: format!("report {hash}"),
            creator_id: UserId::new("creator").unwrap(),
            media_url: format!("file://{hash}"),
            location: GeoPoint::new(lat, long).unwrap(),
            content_hash: ContentHash::new([hash; 32]),
            previous_hash: prev,
            timestamp: Timestamp::from_millis(ts),
            analysis: AnalysisSignal::absent(),
        }
    }

    #[test]
    fn head_follows_inserts() {
        let (_dir, env) = temp_env();
        assert!(env.find_latest().unwrap().is_none());
        let a = env
            .insert_report(new_report(1, PreviousHash::Genesis, 10, 40.0, -75.0))
            .unwrap();
        let b = env
            .insert_report(new_report(2, a.content_hash.into(), 20, 40.0, -75.0))
            .unwrap();
        assert_eq!(env.find_latest().unwrap().unwrap().id, b.id);
        assert_eq!(env.chain_len().unwrap(), 2);
        assert_eq!(env.report_count().unwrap(), 2);
    }

    #[test]
    fn stale_link_is_rejected_and_nothing_written() {
        let (_dir, env) = temp_env();
        env.insert_report(new_report(1, PreviousHash::Genesis, 10, 0.0, 0.0))
            .unwrap();
        let err = env
            .insert_report(new_report(2, PreviousHash::Genesis, 20, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(env.report_count().unwrap(), 1);
        assert_eq!(env.chain_len().unwrap(), 1);
    }

    #[test]
    fn lagging_clock_never_reorders_chain() {
        let (_dir, env) = temp_env();
        let a = env
            .insert_report(new_report(1, PreviousHash::Genesis, 100, 0.0, 0.0))
            .unwrap();
        let b = env
            .insert_report(new_report(2, a.content_hash.into(), 50, 0.0, 0.0))
            .unwrap();
        assert_eq!(b.timestamp, Timestamp::from_millis(100));
        let latest = env.find_latest().unwrap().unwrap();
        assert_eq!(latest.id, b.id);
    }

    #[test]
    fn spatial_and_full_scan_agree() {
        let (_dir, env) = temp_env();
        let a = env
            .insert_report(new_report(1, PreviousHash::Genesis, 1, 40.0, -75.0))
            .unwrap();
        env.insert_report(new_report(2, a.content_hash.into(), 2, 40.45, -75.0))
            .unwrap();

        let near = ReportFilter {
            status: None,
            near: Some(GeoFilter {
                center: GeoPoint::new(40.0, -75.0).unwrap(),
                radius_meters: 1.0,
            }),
        };
        let hits = env.find_by_filter(&near).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, a.id);

        let everywhere = ReportFilter {
            status: None,
            near: Some(GeoFilter {
                center: GeoPoint::new(40.0, -75.0).unwrap(),
                radius_meters: 20_000_000.0,
            }),
        };
        assert_eq!(env.find_by_filter(&everywhere).unwrap().len(), 2);
    }

    #[test]
    fn status_update_is_idempotent() {
        let (_dir, env) = temp_env();
        let a = env
            .insert_report(new_report(1, PreviousHash::Genesis, 1, 0.0, 0.0))
            .unwrap();
        let moderator = UserId::new("mod").unwrap();
        let archive_at = |ms| {
            let at = Timestamp::from_millis(ms);
            env.update_report_status(&a.id, ReportStatus::Archived, &moderator, at)
        };
        let first = archive_at(5).unwrap();
        assert!(first.is_changed());
        let second = archive_at(9).unwrap();
        assert!(!second.is_changed());
        assert_eq!(second.report().archived_at, Some(Timestamp::from_millis(5)));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (_dir, env) = temp_env();
        assert!(env.get_report(&ReportId::new("nope")).unwrap().is_none());
        let err = env
            .update_report_status(
                &ReportId::from_sequence(42),
                ReportStatus::Verified,
                &UserId::new("m").unwrap(),
                Timestamp::EPOCH,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
