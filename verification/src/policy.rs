//! Consensus policy: when enough users agree, a report's status follows them.

use serde::{Deserialize, Serialize};

use groundtruth_types::{ReportStatus, VoteChoice, VoteTally};

use crate::VerificationError;

fn default_min_votes() -> u32 {
    5
}

fn default_threshold_bps() -> u32 {
    6_000
}

/// Thresholds for moving a report out of review.
///
/// Threshold is in basis points (e.g., 6000 = 60%).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusPolicy {
    /// Votes required before any transition.
    #[serde(default = "default_min_votes")]
    pub min_votes: u32,
    /// Share of one choice needed to carry the report.
    #[serde(default = "default_threshold_bps")]
    pub threshold_bps: u32,
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self {
            min_votes: default_min_votes(),
            threshold_bps: default_threshold_bps(),
        }
    }
}

impl ConsensusPolicy {
    pub fn new(min_votes: u32, threshold_bps: u32) -> Result<Self, VerificationError> {
        let policy = Self {
            min_votes,
            threshold_bps,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Reject thresholds that would let both choices win at once.
    pub fn validate(&self) -> Result<(), VerificationError> {
        if self.threshold_bps <= 5_000 || self.threshold_bps > 10_000 {
            return Err(VerificationError::InvalidPolicy(format!(
                "threshold_bps must be in 5001..=10000, got {}",
                self.threshold_bps
            )));
        }
        if self.min_votes == 0 {
            return Err(VerificationError::InvalidPolicy(
                "min_votes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Status a report should hold given its tally.
    ///
    /// Archived reports never move. Below `min_votes` the current status is
    /// kept. Otherwise the winning choice decides, and a split vote sends the
    /// report back to review.
    pub fn decide(&self, current: ReportStatus, tally: &VoteTally) -> ReportStatus {
        if current.is_archived() || tally.total() < self.min_votes {
            return current;
        }
        if tally.share_bps(VoteChoice::Verify) >= self.threshold_bps {
            ReportStatus::Verified
        } else if tally.share_bps(VoteChoice::Dispute) >= self.threshold_bps {
            ReportStatus::Disputed
        } else {
            ReportStatus::UnderReview
        }
    }
}
