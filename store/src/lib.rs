//! Abstract storage traits for the Groundtruth report ledger.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.
//!
//! Chain linkage uses a conditional write: [`ReportStore::insert_report`]
//! re-validates the new report's previous hash against the current head
//! inside the backend's exclusive write path and fails with
//! [`StoreError::Conflict`] when another insert got there first.

pub mod activity;
pub mod blob;
pub mod chain;
pub mod error;
pub mod filter;
pub mod meta;
pub mod moderation;
pub mod report;
pub mod vote;

pub use activity::ActivityStore;
pub use blob::{BlobError, BlobStore};
pub use chain::ChainStore;
pub use error::StoreError;
pub use filter::{sort_newest_first, GeoFilter, ReportFilter};
pub use meta::{IntegrityStamp, MetaStore};
pub use moderation::ModerationStore;
pub use report::{check_chain_append, ReportStore, StatusChange};
pub use vote::{Settlement, StatusRule, VoteStore};

/// Everything the ledger needs from a single backend.
pub trait LedgerStore:
    ReportStore + ChainStore + VoteStore + ModerationStore + ActivityStore
{
}

impl<T> LedgerStore for T where
    T: ReportStore + ChainStore + VoteStore + ModerationStore + ActivityStore
{
}
