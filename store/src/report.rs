//! Report storage trait.

use crate::{ReportFilter, StoreError};
use groundtruth_types::{NewReport, Report, ReportId, ReportStatus, Timestamp, UserId};

/// Result of [`ReportStore::update_report_status`].
#[derive(Clone, Debug, PartialEq)]
pub enum StatusChange {
    /// The report already had the requested status; nothing was written.
    Unchanged(Report),
    /// The status was written.
    Changed { from: ReportStatus, report: Report },
}

impl StatusChange {
    pub fn report(&self) -> &Report {
        match self {
            Self::Unchanged(report) | Self::Changed { report, .. } => report,
        }
    }

    pub fn into_report(self) -> Report {
        match self {
            Self::Unchanged(report) | Self::Changed { report, .. } => report,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Trait for storing reports and answering report queries.
pub trait ReportStore: Send + Sync {
    /// Append a linked report to the chain.
    ///
    /// Inside one exclusive write, the backend re-reads the chain head and
    /// fails with [`StoreError::Conflict`] if `report.previous_hash` no
    /// longer points at it. On success the id is assigned, the timestamp is
    /// raised to the head's if it would precede it, and the report, its chain
    /// record, both index entries and the creator's `upload_report`
    /// activity entry are written together.
    fn insert_report(&self, report: NewReport) -> Result<Report, StoreError>;

    /// Most recent report by timestamp (the chain head).
    fn find_latest(&self) -> Result<Option<Report>, StoreError>;

    /// Look up a report by id.
    fn get_report(&self, id: &ReportId) -> Result<Option<Report>, StoreError>;

    /// Reports matching `filter`, newest first.
    fn find_by_filter(&self, filter: &ReportFilter) -> Result<Vec<Report>, StoreError>;

    /// Set a report's status. Re-applying the current status is a no-op.
    fn update_report_status(
        &self,
        id: &ReportId,
        status: ReportStatus,
        actor: &UserId,
        at: Timestamp,
    ) -> Result<StatusChange, StoreError>;

    /// Number of stored reports.
    fn report_count(&self) -> Result<u64, StoreError>;
}

/// Validate that `report` may be appended after `head`.
///
/// Returns the timestamp the report must be stored with: its own, or the
/// head's when the submitting clock lags behind.
pub fn check_chain_append(
    report: &NewReport,
    head: Option<&Report>,
) -> Result<Timestamp, StoreError> {
    let head_hash = head.map(|h| &h.content_hash);
    if !report.previous_hash.links_to(head_hash) {
        return Err(StoreError::Conflict {
            previous: report.previous_hash.to_string(),
            head: head_hash
                .map(|h| h.to_string())
                .unwrap_or_else(|| "none".to_string()),
        });
    }
    Ok(match head {
        Some(h) if h.timestamp > report.timestamp => h.timestamp,
        _ => report.timestamp,
    })
}
