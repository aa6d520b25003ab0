//! LMDB implementation of ActivityStore.

use heed::RwTxn;

use groundtruth_store::{ActivityStore, StoreError};
use groundtruth_types::{ActivityEntry, UserId};

use crate::environment::next_seq;
use crate::keys::seq_key;
use crate::{LmdbEnvironment, LmdbError};

impl LmdbEnvironment {
    /// Append `entry` inside the caller's write transaction.
    pub(crate) fn put_activity(
        &self,
        wtxn: &mut RwTxn<'_>,
        entry: &ActivityEntry,
    ) -> Result<(), LmdbError> {
        let seq = next_seq(&self.activity_db, wtxn)?;
        let doc = serde_json::to_vec(entry)?;
        self.activity_db.put(wtxn, &seq_key(seq), &doc)?;
        Ok(())
    }
}

impl ActivityStore for LmdbEnvironment {
    fn activity_log(&self, user_id: Option<&UserId>) -> Result<Vec<ActivityEntry>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for result in self.activity_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let entry: ActivityEntry = serde_json::from_slice(val).map_err(LmdbError::from)?;
            if user_id.map_or(true, |u| &entry.user_id == u) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}
