//! Activity log storage trait.

use crate::StoreError;
use groundtruth_types::{ActivityEntry, UserId};

/// Read side of the per-user activity log.
///
/// Entries are written by [`ReportStore::insert_report`](crate::ReportStore::insert_report)
/// and [`VoteStore::insert_vote`](crate::VoteStore::insert_vote) in the same
/// write as the report or vote, so the log never names a record that was
/// not stored.
pub trait ActivityStore: Send + Sync {
    /// Entries in insertion order, optionally restricted to one user.
    fn activity_log(&self, user_id: Option<&UserId>) -> Result<Vec<ActivityEntry>, StoreError>;
}
