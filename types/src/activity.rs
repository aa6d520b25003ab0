//! Per-user activity log entries.
//!
//! The store appends one entry for every accepted upload and vote, in the
//! same write that stores the report or vote itself.

use serde::{Deserialize, Serialize};

use crate::{Report, ReportId, Timestamp, UserId, Vote, VoteChoice};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityAction {
    #[serde(rename_all = "camelCase")]
    UploadReport { report_id: ReportId },
    #[serde(rename_all = "camelCase")]
    CastVote { report_id: ReportId, vote: VoteChoice },
}

impl ActivityAction {
    pub fn report_id(&self) -> &ReportId {
        match self {
            Self::UploadReport { report_id } | Self::CastVote { report_id, .. } => report_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub user_id: UserId,
    pub action: ActivityAction,
    pub timestamp: Timestamp,
}

impl ActivityEntry {
    pub fn upload(report: &Report) -> Self {
        Self {
            user_id: report.creator_id.clone(),
            action: ActivityAction::UploadReport {
                report_id: report.id.clone(),
            },
            timestamp: report.timestamp,
        }
    }

    pub fn vote(vote: &Vote) -> Self {
        Self {
            user_id: vote.user_id.clone(),
            action: ActivityAction::CastVote {
                report_id: vote.report_id.clone(),
                vote: vote.vote,
            },
            timestamp: vote.timestamp,
        }
    }
}
