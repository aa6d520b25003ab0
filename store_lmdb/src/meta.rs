//! LMDB implementation of MetaStore.
//!
//! The schema version is a little-endian `u32`; the integrity stamp is a
//! JSON document.

use heed::{RoTxn, RwTxn};

use groundtruth_store::{IntegrityStamp, MetaStore, StoreError};

use crate::{LmdbEnvironment, LmdbError};

const SCHEMA_VERSION: &[u8] = b"schema_version";
const INTEGRITY_STAMP: &[u8] = b"integrity_check";

impl LmdbEnvironment {
    pub(crate) fn schema_version_in(&self, txn: &RoTxn) -> Result<u32, LmdbError> {
        let Some(bytes) = self.meta_db.get(txn, SCHEMA_VERSION)? else {
            return Ok(0);
        };
        let le: [u8; 4] = bytes.try_into().map_err(|_| {
            LmdbError::Serialization(format!("schema version is {} bytes, not 4", bytes.len()))
        })?;
        Ok(u32::from_le_bytes(le))
    }

    pub(crate) fn put_schema_version(
        &self,
        wtxn: &mut RwTxn<'_>,
        version: u32,
    ) -> Result<(), LmdbError> {
        self.meta_db.put(wtxn, SCHEMA_VERSION, &version.to_le_bytes())?;
        Ok(())
    }
}

impl MetaStore for LmdbEnvironment {
    fn get_schema_version(&self) -> Result<u32, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.schema_version_in(&rtxn)?)
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.put_schema_version(&mut wtxn, version)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn last_integrity_check(&self) -> Result<Option<IntegrityStamp>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .meta_db
            .get(&rtxn, INTEGRITY_STAMP)
            .map_err(LmdbError::from)?
        {
            Some(doc) => Ok(Some(serde_json::from_slice(doc).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn record_integrity_check(&self, stamp: &IntegrityStamp) -> Result<(), StoreError> {
        let doc = serde_json::to_vec(stamp).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, INTEGRITY_STAMP, &doc)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
