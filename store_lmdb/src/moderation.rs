//! LMDB implementation of ModerationStore.

use groundtruth_store::{ModerationStore, StoreError};
use groundtruth_types::{ModerationLogEntry, ReportId};

use crate::environment::next_seq;
use crate::keys::seq_key;
use crate::{LmdbEnvironment, LmdbError};

impl ModerationStore for LmdbEnvironment {
    fn append_moderation(&self, entry: &ModerationLogEntry) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let seq = next_seq(&self.moderation_db, &wtxn)?;
        let doc = serde_json::to_vec(entry).map_err(LmdbError::from)?;
        self.moderation_db
            .put(&mut wtxn, &seq_key(seq), &doc)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn moderation_log(
        &self,
        report_id: Option<&ReportId>,
    ) -> Result<Vec<ModerationLogEntry>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for result in self.moderation_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let entry: ModerationLogEntry =
                serde_json::from_slice(val).map_err(LmdbError::from)?;
            if report_id.map_or(true, |id| entry.action.report_id() == id) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}
