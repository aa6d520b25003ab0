//! Community verification of reports.
//!
//! Each user may vote once per report, either to verify or to dispute it.
//! After every accepted vote the tally is re-read from the store and a
//! [`ConsensusPolicy`] decides whether the report's status should move.

pub mod error;
pub mod policy;
pub mod voting;

pub use error::VerificationError;
pub use policy::ConsensusPolicy;
pub use voting::{VerificationLedger, VoteOutcome, VoteSummary};
