//! Verification votes and their tally.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ReportId, Timestamp, UserId, ValidationError};

/// A user's judgment on a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Verify,
    Dispute,
}

impl VoteChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verify => "verify",
            Self::Dispute => "dispute",
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteChoice {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verify" => Ok(Self::Verify),
            "dispute" => Ok(Self::Dispute),
            other => Err(ValidationError::UnknownVote(other.to_string())),
        }
    }
}

/// One user's vote on one report. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub report_id: ReportId,
    pub user_id: UserId,
    pub vote: VoteChoice,
    pub timestamp: Timestamp,
}

/// Accumulated vote counts for a single report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub verify: u32,
    pub dispute: u32,
}

impl VoteTally {
    pub fn from_votes<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> Self {
        let mut tally = Self::default();
        for v in votes {
            tally.record(v.vote);
        }
        tally
    }

    pub fn record(&mut self, choice: VoteChoice) {
        match choice {
            VoteChoice::Verify => self.verify = self.verify.saturating_add(1),
            VoteChoice::Dispute => self.dispute = self.dispute.saturating_add(1),
        }
    }

    pub fn total(&self) -> u32 {
        self.verify.saturating_add(self.dispute)
    }

    /// Share of `choice` in basis points (0..=10_000). Zero when no votes.
    pub fn share_bps(&self, choice: VoteChoice) -> u32 {
        let total = self.total() as u64;
        if total == 0 {
            return 0;
        }
        let count = match choice {
            VoteChoice::Verify => self.verify,
            VoteChoice::Dispute => self.dispute,
        } as u64;
        ((count * 10_000) / total) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_of_empty_tally_is_zero() {
        assert_eq!(VoteTally::default().share_bps(VoteChoice::Verify), 0);
    }

    #[test]
    fn share_rounds_down() {
        let tally = VoteTally {
            verify: 2,
            dispute: 1,
        };
        assert_eq!(tally.share_bps(VoteChoice::Verify), 6666);
        assert_eq!(tally.share_bps(VoteChoice::Dispute), 3333);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn choice_parses_wire_names() {
        assert_eq!("verify".parse::<VoteChoice>().unwrap(), VoteChoice::Verify);
        assert_eq!("dispute".parse::<VoteChoice>().unwrap(), VoteChoice::Dispute);
        assert!("Flag".parse::<VoteChoice>().is_err());
    }
}
