//! Tamper-evident report ledger.
//!
//! Every accepted report carries the SHA-256 digest of its media and the
//! digest of the report before it, forming a single hash chain from the
//! `GENESIS_BLOCK` sentinel. [`ReportLedger`] runs the submission pipeline
//! (hash, upload, link, conditional insert) and the moderation actions.

pub mod audit;
pub mod error;
pub mod ledger;
pub mod linker;
pub mod submission;

pub use audit::{audit_chain, ChainAudit, ChainFault};
pub use error::LedgerError;
pub use ledger::{LedgerConfig, ReportLedger};
pub use linker::{ChainLinker, LinkedHash};
pub use submission::{RawSubmission, ReportSubmission, DEFAULT_MIME_TYPE};
