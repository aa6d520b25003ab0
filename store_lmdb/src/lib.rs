//! LMDB storage backend for the Groundtruth report ledger.
//!
//! Implements all storage traits from `groundtruth-store` using the `heed`
//! LMDB bindings. Each logical collection maps to one or more LMDB databases
//! within a single environment. LMDB allows one write transaction at a time,
//! which is what makes the chain-head compare-and-swap and the vote
//! uniqueness check atomic.

pub mod activity;
pub mod environment;
pub mod error;
pub mod integrity;
mod keys;
pub mod meta;
pub mod migration;
pub mod moderation;
pub mod report;
pub mod vote;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_data_dir, check_integrity, IntegrityReport};
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
