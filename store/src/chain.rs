//! Chain record storage trait.

use crate::StoreError;
use groundtruth_types::ChainRecord;

/// Read access to the append-only chain replica.
///
/// Records are written by [`crate::ReportStore::insert_report`] in the same
/// atomic write as their report; there is no separate put.
pub trait ChainStore: Send + Sync {
    /// All chain records, oldest first.
    fn chain_records(&self) -> Result<Vec<ChainRecord>, StoreError>;

    /// Number of chain records.
    fn chain_len(&self) -> Result<u64, StoreError>;
}
