//! Reports, chain records, and the identifiers that name them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{ContentHash, GeoPoint, PreviousHash, Timestamp, ValidationError};

/// Store-assigned report identifier.
///
/// Opaque to callers. Stores derive it from their insertion sequence as 16
/// lowercase hex characters, so ids also sort in insertion order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn from_sequence(seq: u64) -> Self {
        Self(format!("{seq:016x}"))
    }

    /// The insertion sequence encoded in this id, if it was store-assigned.
    pub fn sequence(&self) -> Option<u64> {
        if self.0.len() != 16 {
            return None;
        }
        u64::from_str_radix(&self.0, 16).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a user. Non-blank by construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let s = raw.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField("userId"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The reserved actor recorded for status changes made by consensus.
    pub fn consensus() -> Self {
        Self(crate::CONSENSUS_ACTOR.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Moderation status of a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Newly submitted, or consensus has not settled.
    UnderReview,
    /// Consensus judged the report genuine.
    Verified,
    /// Consensus judged the report false or misleading.
    Disputed,
    /// Withdrawn by a moderator. Still part of the chain.
    Archived,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 4] = [
        Self::UnderReview,
        Self::Verified,
        Self::Disputed,
        Self::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnderReview => "under_review",
            Self::Verified => "verified",
            Self::Disputed => "disputed",
            Self::Archived => "archived",
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(self, Self::Archived)
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

/// Structured result of an upstream media analyzer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisDetails {
    /// No analyzer output was supplied with the submission.
    #[default]
    NotAnalyzed,
    /// An analyzer scored the artifact.
    Scored {
        model: String,
        #[serde(default)]
        labels: Vec<String>,
    },
}

/// Opaque AI signal attached to a submission. Never computed by the ledger.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSignal {
    confidence: f64,
    details: AnalysisDetails,
}

impl AnalysisSignal {
    /// The signal recorded when nothing upstream scored the artifact.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn scored(
        confidence: f64,
        model: impl Into<String>,
        labels: Vec<String>,
    ) -> Result<Self, ValidationError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ValidationError::ScoreOutOfRange(confidence));
        }
        Ok(Self {
            confidence,
            details: AnalysisDetails::Scored {
                model: model.into(),
                labels,
            },
        })
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn details(&self) -> &AnalysisDetails {
        &self.details
    }
}

/// A fully linked report that has not been stored yet.
///
/// Produced by the submission pipeline after hashing, upload and linking.
/// The store assigns the id and may move `timestamp` forward so it never
/// precedes the chain head.
#[derive(Clone, Debug, PartialEq)]
pub struct NewReport {
    pub title: String,
    pub creator_id: UserId,
    pub media_url: String,
    pub location: GeoPoint,
    pub content_hash: ContentHash,
    pub previous_hash: PreviousHash,
    pub timestamp: Timestamp,
    pub analysis: AnalysisSignal,
}

/// A stored media report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub title: String,
    pub creator_id: UserId,
    pub media_url: String,
    pub location: GeoPoint,
    pub content_hash: ContentHash,
    pub previous_hash: PreviousHash,
    pub timestamp: Timestamp,
    pub ai_confidence_score: f64,
    pub ai_analysis: AnalysisDetails,
    pub status: ReportStatus,
    pub archived_at: Option<Timestamp>,
    pub archived_by: Option<UserId>,
}

impl Report {
    /// Materialize a report from a linked submission.
    pub fn from_new(id: ReportId, new: NewReport) -> Self {
        Self {
            id,
            title: new.title,
            creator_id: new.creator_id,
            media_url: new.media_url,
            location: new.location,
            content_hash: new.content_hash,
            previous_hash: new.previous_hash,
            timestamp: new.timestamp,
            ai_confidence_score: new.analysis.confidence,
            ai_analysis: new.analysis.details,
            status: ReportStatus::UnderReview,
            archived_at: None,
            archived_by: None,
        }
    }

    /// The chain record written alongside this report.
    pub fn chain_record(&self) -> ChainRecord {
        ChainRecord {
            report_id: self.id.clone(),
            hash: self.content_hash,
            previous_hash: self.previous_hash,
            timestamp: self.timestamp,
        }
    }

    /// Apply a status change, maintaining the archival fields.
    ///
    /// Returns `false` when the report already had `status`.
    pub fn apply_status(&mut self, status: ReportStatus, actor: &UserId, at: Timestamp) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        if status.is_archived() {
            self.archived_at = Some(at);
            self.archived_by = Some(actor.clone());
        } else {
            self.archived_at = None;
            self.archived_by = None;
        }
        true
    }
}

/// Append-only replica of a report's chain linkage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainRecord {
    pub report_id: ReportId,
    pub hash: ContentHash,
    pub previous_hash: PreviousHash,
    pub timestamp: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Report {
        Report::from_new(
            ReportId::from_sequence(1),
            NewReport {
                title: "Flooded underpass".into(),
                creator_id: UserId::new("u-1").unwrap(),
                media_url: "https://blobs.example/1-flood.jpg".into(),
                location: GeoPoint::new(40.0, -75.0).unwrap(),
                content_hash: ContentHash::new([7; 32]),
                previous_hash: PreviousHash::Genesis,
                timestamp: Timestamp::from_millis(1_000),
                analysis: AnalysisSignal::absent(),
            },
        )
    }

    #[test]
    fn status_parses_wire_names() {
        for status in ReportStatus::ALL {
            assert_eq!(status.as_str().parse::<ReportStatus>().unwrap(), status);
        }
        assert!("Under Review".parse::<ReportStatus>().is_err());
    }

    #[test]
    fn sequence_ids_sort_in_insertion_order() {
        let a = ReportId::from_sequence(9);
        let b = ReportId::from_sequence(10);
        assert!(a < b);
        assert_eq!(b.sequence(), Some(10));
        assert_eq!(ReportId::new("custom").sequence(), None);
    }

    #[test]
    fn blank_user_id_is_rejected() {
        assert!(UserId::new("   ").is_err());
        assert_eq!(UserId::new(" alice ").unwrap().as_str(), "alice");
    }

    #[test]
    fn archiving_sets_and_clears_metadata() {
        let mut report = sample();
        let moderator = UserId::new("mod-1").unwrap();
        let at = Timestamp::from_millis;
        assert!(report.apply_status(ReportStatus::Archived, &moderator, at(5)));
        assert_eq!(report.archived_by.as_ref(), Some(&moderator));
        assert_eq!(report.archived_at, Some(at(5)));
        assert!(!report.apply_status(ReportStatus::Archived, &moderator, at(9)));
        assert_eq!(report.archived_at, Some(at(5)));
        assert!(report.apply_status(ReportStatus::UnderReview, &moderator, at(10)));
        assert!(report.archived_at.is_none());
    }

    #[test]
    fn report_json_uses_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["previousHash"], "GENESIS_BLOCK");
        assert_eq!(json["status"], "under_review");
        assert_eq!(json["aiAnalysis"]["kind"], "not_analyzed");
        assert_eq!(json["location"]["lat"], 40.0);
        assert!(json["archivedAt"].is_null());
    }

    #[test]
    fn scored_signal_validates_range() {
        assert!(AnalysisSignal::scored(1.2, "m", vec![]).is_err());
        let signal = AnalysisSignal::scored(0.85, "deepfake-v2", vec!["face".into()]).unwrap();
        assert_eq!(signal.confidence(), 0.85);
    }
}
