//! LMDB implementation of VoteStore.

use heed::RoTxn;

use groundtruth_store::{Settlement, StatusRule, StoreError, VoteStore};
use groundtruth_types::{
    ActivityEntry, ModerationAction, ModerationLogEntry, ReportId, Timestamp, UserId, Vote,
    VoteTally,
};

use crate::environment::{next_seq, range_scan};
use crate::keys::{seq_key, vote_key, vote_prefix};
use crate::{LmdbEnvironment, LmdbError};

impl LmdbEnvironment {
    fn load_votes(&self, txn: &RoTxn, report_id: &ReportId) -> Result<Vec<Vote>, LmdbError> {
        range_scan(&self.votes_db, txn, &vote_prefix(report_id))?
            .into_iter()
            .map(|(_key, val)| serde_json::from_slice(&val).map_err(LmdbError::from))
            .collect()
    }
}

impl VoteStore for LmdbEnvironment {
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        let seq = vote
            .report_id
            .sequence()
            .ok_or_else(|| StoreError::NotFound(format!("report {}", vote.report_id)))?;
        let key = vote_key(&vote.report_id, &vote.user_id);

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .reports_db
            .get(&wtxn, &seq_key(seq))
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(StoreError::NotFound(format!("report {}", vote.report_id)));
        }
        if self
            .votes_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::DuplicateVote {
                report_id: vote.report_id.to_string(),
                user_id: vote.user_id.to_string(),
            });
        }

        let doc = serde_json::to_vec(vote).map_err(LmdbError::from)?;
        self.votes_db
            .put(&mut wtxn, &key, &doc)
            .map_err(LmdbError::from)?;
        self.put_activity(&mut wtxn, &ActivityEntry::vote(vote))?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn votes_for(&self, report_id: &ReportId) -> Result<Vec<Vote>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut votes = self.load_votes(&rtxn, report_id)?;
        // Keys sort by user id; callers expect time order.
        votes.sort_by_key(|v| v.timestamp);
        Ok(votes)
    }

    fn settle_status(
        &self,
        report_id: &ReportId,
        at: Timestamp,
        rule: StatusRule<'_>,
    ) -> Result<Settlement, StoreError> {
        let seq = report_id
            .sequence()
            .ok_or_else(|| StoreError::NotFound(format!("report {report_id}")))?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut report = self
            .load_report(&wtxn, seq)?
            .ok_or_else(|| StoreError::NotFound(format!("report {report_id}")))?;
        let tally = VoteTally::from_votes(&self.load_votes(&wtxn, report_id)?);

        let from = report.status;
        let to = rule(from, &tally);
        let consensus = UserId::consensus();
        if !report.apply_status(to, &consensus, at) {
            return Ok(Settlement {
                tally,
                from,
                report,
            });
        }

        let entry = ModerationLogEntry {
            action: ModerationAction::ConsensusTransition {
                report_id: report_id.clone(),
                from,
                to,
                tally,
            },
            performed_by: consensus,
            timestamp: at,
        };
        let doc = serde_json::to_vec(&report).map_err(LmdbError::from)?;
        let entry_doc = serde_json::to_vec(&entry).map_err(LmdbError::from)?;
        let entry_seq = next_seq(&self.moderation_db, &wtxn)?;
        self.reports_db
            .put(&mut wtxn, &seq_key(seq), &doc)
            .map_err(LmdbError::from)?;
        self.moderation_db
            .put(&mut wtxn, &seq_key(entry_seq), &entry_doc)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        Ok(Settlement {
            tally,
            from,
            report,
        })
    }
}
