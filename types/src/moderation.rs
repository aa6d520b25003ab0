//! Moderation log entries.
//!
//! Each entry records who changed a report's status and why, as a tagged
//! action instead of a free-form details object.

use serde::{Deserialize, Serialize};

use crate::{ReportId, ReportStatus, Timestamp, UserId, VoteTally};

/// Reserved actor id for status changes made by the consensus policy.
pub const CONSENSUS_ACTOR: &str = "consensus";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModerationAction {
    /// A moderator withdrew a report from circulation.
    #[serde(rename_all = "camelCase")]
    ArchiveReport {
        report_id: ReportId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// A moderator overrode a report's status.
    #[serde(rename_all = "camelCase")]
    SetStatus {
        report_id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
    },
    /// The consensus policy moved a report to a new status.
    #[serde(rename_all = "camelCase")]
    ConsensusTransition {
        report_id: ReportId,
        from: ReportStatus,
        to: ReportStatus,
        tally: VoteTally,
    },
}

impl ModerationAction {
    pub fn report_id(&self) -> &ReportId {
        match self {
            Self::ArchiveReport { report_id, .. }
            | Self::SetStatus { report_id, .. }
            | Self::ConsensusTransition { report_id, .. } => report_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationLogEntry {
    pub action: ModerationAction,
    pub performed_by: UserId,
    pub timestamp: Timestamp,
}
