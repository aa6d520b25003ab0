//! Vote storage trait.

use crate::StoreError;
use groundtruth_types::{Report, ReportId, ReportStatus, Timestamp, Vote, VoteTally};

/// Decides a report's next status from its current one and its tally.
pub type StatusRule<'a> = &'a (dyn Fn(ReportStatus, &VoteTally) -> ReportStatus + Sync);

/// Result of [`VoteStore::settle_status`].
#[derive(Clone, Debug, PartialEq)]
pub struct Settlement {
    /// Tally over every vote committed when the decision was made.
    pub tally: VoteTally,
    /// Status before the decision.
    pub from: ReportStatus,
    /// The report as stored afterwards.
    pub report: Report,
}

impl Settlement {
    pub fn transitioned(&self) -> bool {
        self.from != self.report.status
    }
}

/// Trait for the one-vote-per-user verification ledger.
pub trait VoteStore: Send + Sync {
    /// Store a vote.
    ///
    /// Fails with [`StoreError::NotFound`] for an unknown report and with
    /// [`StoreError::DuplicateVote`] when the (report, user) pair already has
    /// a vote. The existence check, the write and the voter's `cast_vote`
    /// activity entry happen in one atomic step of the backend; the earlier
    /// vote is left untouched.
    fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError>;

    /// All votes on a report, oldest first.
    fn votes_for(&self, report_id: &ReportId) -> Result<Vec<Vote>, StoreError>;

    /// Verify/dispute counts for a report.
    fn tally(&self, report_id: &ReportId) -> Result<VoteTally, StoreError> {
        Ok(VoteTally::from_votes(&self.votes_for(report_id)?))
    }

    /// Re-derive a report's status from its votes.
    ///
    /// Reading the report, tallying its votes, applying `rule`, writing the
    /// new status and appending a `consensus_transition` moderation entry
    /// happen in one exclusive write of the backend. The write is attributed
    /// to the reserved consensus actor.
    fn settle_status(
        &self,
        report_id: &ReportId,
        at: Timestamp,
        rule: StatusRule<'_>,
    ) -> Result<Settlement, StoreError>;
}
