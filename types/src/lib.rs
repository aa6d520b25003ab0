//! Fundamental types for the Groundtruth report ledger.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: content hashes, timestamps, geographic points, reports, votes,
//! chain records, moderation and activity log entries, and user roles.

pub mod activity;
pub mod error;
pub mod geo;
pub mod hash;
pub mod moderation;
pub mod report;
pub mod role;
pub mod time;
pub mod vote;

pub use activity::{ActivityAction, ActivityEntry};
pub use error::ValidationError;
pub use geo::{GeoCell, GeoPoint, EARTH_RADIUS_METERS};
pub use hash::{ContentHash, PreviousHash, GENESIS_SENTINEL};
pub use moderation::{ModerationAction, ModerationLogEntry, CONSENSUS_ACTOR};
pub use report::{
    AnalysisDetails, AnalysisSignal, ChainRecord, NewReport, Report, ReportId, ReportStatus,
    UserId,
};
pub use role::{Roster, UserRole};
pub use time::{Clock, SystemClock, Timestamp};
pub use vote::{Vote, VoteChoice, VoteTally};
