//! Moderation log storage trait.

use crate::StoreError;
use groundtruth_types::{ModerationLogEntry, ReportId};

pub trait ModerationStore: Send + Sync {
    /// Append an entry. Entries are never modified or removed.
    fn append_moderation(&self, entry: &ModerationLogEntry) -> Result<(), StoreError>;

    /// Entries in insertion order, optionally restricted to one report.
    fn moderation_log(
        &self,
        report_id: Option<&ReportId>,
    ) -> Result<Vec<ModerationLogEntry>, StoreError>;
}
