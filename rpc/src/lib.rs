//! HTTP API for the Groundtruth report ledger.
//!
//! Provides endpoints for:
//! - Report submission and lookup
//! - Status and proximity queries
//! - Verification votes and tallies
//! - Moderation (archive, status override, audit log)
//! - Per-user activity
//! - Chain audit, health and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod server;
pub mod state;

pub use error::{ApiError, RpcError};
pub use metrics::RpcMetrics;
pub use server::{router, RpcServer};
pub use state::AppState;
