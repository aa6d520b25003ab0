//! Environment metadata: schema version and the last startup check.

use serde::{Deserialize, Serialize};

use crate::StoreError;
use groundtruth_types::Timestamp;

/// Outcome of the most recent startup integrity check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityStamp {
    pub checked_at: Timestamp,
    pub total_entries: u64,
    pub errors: u32,
}

pub trait MetaStore {
    /// Stored schema version; 0 for a fresh database.
    fn get_schema_version(&self) -> Result<u32, StoreError>;
    fn set_schema_version(&self, version: u32) -> Result<(), StoreError>;

    fn last_integrity_check(&self) -> Result<Option<IntegrityStamp>, StoreError>;
    fn record_integrity_check(&self, stamp: &IntegrityStamp) -> Result<(), StoreError>;
}
