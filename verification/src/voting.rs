//! Verification voting: users verify or dispute reports, once each.

use std::sync::Arc;

use serde::Serialize;

use groundtruth_store::{LedgerStore, ReportStore, VoteStore};
use groundtruth_types::{Clock, ReportId, ReportStatus, Roster, UserId, Vote, VoteChoice, VoteTally};

use crate::{ConsensusPolicy, VerificationError};

/// What happened after a vote was accepted.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub vote: Vote,
    pub tally: VoteTally,
    /// The report's status after the policy ran.
    pub status: ReportStatus,
    /// Whether this vote moved the report's status.
    pub transitioned: bool,
}

/// Every vote on a report with its tally.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub report_id: ReportId,
    pub tally: VoteTally,
    pub votes: Vec<Vote>,
}

/// Engine for casting votes and applying the consensus policy.
pub struct VerificationLedger<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    policy: ConsensusPolicy,
    roster: Arc<Roster>,
}

impl<S> Clone for VerificationLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            policy: self.policy,
            roster: Arc::clone(&self.roster),
        }
    }
}

impl<S: LedgerStore> VerificationLedger<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        policy: ConsensusPolicy,
    ) -> Result<Self, VerificationError> {
        policy.validate()?;
        Ok(Self {
            store,
            clock,
            policy,
            roster: Arc::default(),
        })
    }

    /// Flagged users on `roster` lose their vote.
    pub fn with_roster(mut self, roster: Arc<Roster>) -> Self {
        self.roster = roster;
        self
    }

    pub fn policy(&self) -> &ConsensusPolicy {
        &self.policy
    }

    /// Record `user_id`'s vote on a report.
    ///
    /// The store rejects a second vote for the same (report, user) pair
    /// atomically, leaving the first one in place. The policy then runs
    /// inside one store write that re-reads the report and every committed
    /// vote, so a moderator's archive or a concurrent voter's transition is
    /// never overwritten by a decision made from older state.
    pub fn cast_vote(
        &self,
        report_id: &ReportId,
        user_id: UserId,
        choice: VoteChoice,
    ) -> Result<VoteOutcome, VerificationError> {
        let role = self.roster.role_of(&user_id);
        if !role.can_contribute() {
            tracing::debug!(report = %report_id, user = %user_id, %role, "vote refused");
            return Err(VerificationError::Forbidden {
                user: user_id.to_string(),
                role,
            });
        }
        let vote = Vote {
            report_id: report_id.clone(),
            user_id,
            vote: choice,
            timestamp: self.clock.now(),
        };
        self.store.insert_vote(&vote).inspect_err(|e| {
            tracing::debug!(report = %report_id, user = %vote.user_id, error = %e, "vote rejected");
        })?;

        let policy = self.policy;
        let rule = |current: ReportStatus, tally: &VoteTally| policy.decide(current, tally);
        let settled = self
            .store
            .settle_status(report_id, self.clock.now(), &rule)?;
        let transitioned = settled.transitioned();
        if transitioned {
            tracing::info!(
                report = %report_id,
                from = %settled.from,
                to = %settled.report.status,
                verify = settled.tally.verify,
                dispute = settled.tally.dispute,
                "consensus moved report"
            );
        }

        tracing::debug!(report = %report_id, user = %vote.user_id, vote = %choice, "vote recorded");
        Ok(VoteOutcome {
            vote,
            tally: settled.tally,
            status: settled.report.status,
            transitioned,
        })
    }

    pub fn votes(&self, report_id: &ReportId) -> Result<VoteSummary, VerificationError> {
        if self.store.get_report(report_id)?.is_none() {
            return Err(VerificationError::NotFound(report_id.to_string()));
        }
        let votes = self.store.votes_for(report_id)?;
        Ok(VoteSummary {
            report_id: report_id.clone(),
            tally: VoteTally::from_votes(&votes),
            votes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundtruth_nullables::{NullClock, NullStore};
    use groundtruth_store::{ActivityStore, ModerationStore};
    use groundtruth_types::{
        AnalysisSignal, ContentHash, GeoPoint, ModerationAction, NewReport, PreviousHash,
        Timestamp,
    };

    fn setup(policy: ConsensusPolicy) -> (Arc<NullStore>, VerificationLedger<NullStore>, ReportId) {
        let store = Arc::new(NullStore::new());
        let report = store
            .insert_report(NewReport {
                title: "Bridge collapse".into(),
                creator_id: UserId::new("reporter").unwrap(),
                media_url: "memory://bridge".into(),
                location: GeoPoint::new(10.0, 10.0).unwrap(),
                content_hash: ContentHash::new([3; 32]),
                previous_hash: PreviousHash::Genesis,
                timestamp: Timestamp::from_millis(1),
                analysis: AnalysisSignal::absent(),
            })
            .unwrap();
        let ledger =
            VerificationLedger::new(Arc::clone(&store), Arc::new(NullClock::new(100)), policy)
                .unwrap();
        (store, ledger, report.id)
    }

    fn user(n: u32) -> UserId {
        UserId::new(format!("user-{n}")).unwrap()
    }

    #[test]
    fn duplicate_vote_is_rejected_and_first_kept() {
        let (store, ledger, id) = setup(ConsensusPolicy::default());
        ledger.cast_vote(&id, user(1), VoteChoice::Verify).unwrap();
        let err = ledger
            .cast_vote(&id, user(1), VoteChoice::Dispute)
            .unwrap_err();
        assert!(matches!(err, VerificationError::DuplicateVote { .. }));
        assert!(!err.is_retryable());

        let votes = store.votes_for(&id).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].vote, VoteChoice::Verify);
    }

    #[test]
    fn unknown_report_is_not_found() {
        let (_store, ledger, _id) = setup(ConsensusPolicy::default());
        let err = ledger
            .cast_vote(&ReportId::from_sequence(77), user(1), VoteChoice::Verify)
            .unwrap_err();
        assert!(matches!(err, VerificationError::NotFound(_)));
    }

    #[test]
    fn reaching_threshold_transitions_once() {
        let (store, ledger, id) = setup(ConsensusPolicy::default());
        for n in 0..4 {
            let outcome = ledger.cast_vote(&id, user(n), VoteChoice::Verify).unwrap();
            assert!(!outcome.transitioned);
            assert_eq!(outcome.status, ReportStatus::UnderReview);
        }
        let fifth = ledger.cast_vote(&id, user(4), VoteChoice::Verify).unwrap();
        assert!(fifth.transitioned);
        assert_eq!(fifth.status, ReportStatus::Verified);
        assert_eq!(fifth.tally.total(), 5);

        let sixth = ledger.cast_vote(&id, user(5), VoteChoice::Verify).unwrap();
        assert!(!sixth.transitioned);

        let log = store.moderation_log(Some(&id)).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].performed_by, UserId::consensus());
        assert!(matches!(
            log[0].action,
            ModerationAction::ConsensusTransition {
                to: ReportStatus::Verified,
                ..
            }
        ));
    }

    #[test]
    fn disputes_can_overturn_verification() {
        let (_store, ledger, id) = setup(ConsensusPolicy::new(1, 6_000).unwrap());
        let first = ledger.cast_vote(&id, user(0), VoteChoice::Verify).unwrap();
        assert_eq!(first.status, ReportStatus::Verified);
        let second = ledger.cast_vote(&id, user(1), VoteChoice::Dispute).unwrap();
        assert_eq!(second.status, ReportStatus::UnderReview);
        let third = ledger.cast_vote(&id, user(2), VoteChoice::Dispute).unwrap();
        assert_eq!(third.status, ReportStatus::Disputed);
    }

    #[test]
    fn archived_report_ignores_consensus() {
        let (store, ledger, id) = setup(ConsensusPolicy::new(1, 6_000).unwrap());
        store
            .update_report_status(
                &id,
                ReportStatus::Archived,
                &UserId::new("mod").unwrap(),
                Timestamp::from_millis(50),
            )
            .unwrap();
        let outcome = ledger.cast_vote(&id, user(0), VoteChoice::Verify).unwrap();
        assert_eq!(outcome.status, ReportStatus::Archived);
        assert!(!outcome.transitioned);
    }

    #[test]
    fn flagged_user_cannot_vote() {
        let (store, ledger, id) = setup(ConsensusPolicy::new(1, 6_000).unwrap());
        let ledger = ledger.with_roster(Arc::new(Roster {
            flagged: [user(0)].into(),
            ..Roster::default()
        }));
        let err = ledger.cast_vote(&id, user(0), VoteChoice::Verify).unwrap_err();
        assert!(matches!(err, VerificationError::Forbidden { .. }));
        assert!(!err.is_retryable());
        assert!(store.votes_for(&id).unwrap().is_empty());
        assert_eq!(store.activity_log(None).unwrap().len(), 1);

        ledger.cast_vote(&id, user(1), VoteChoice::Verify).unwrap();
        assert_eq!(store.get_report(&id).unwrap().unwrap().status, ReportStatus::Verified);
    }

    #[test]
    fn summary_lists_votes_with_tally() {
        let (_store, ledger, id) = setup(ConsensusPolicy::default());
        ledger.cast_vote(&id, user(0), VoteChoice::Verify).unwrap();
        ledger.cast_vote(&id, user(1), VoteChoice::Dispute).unwrap();
        let summary = ledger.votes(&id).unwrap();
        assert_eq!(summary.votes.len(), 2);
        assert_eq!((summary.tally.verify, summary.tally.dispute), (1, 1));
    }
}
