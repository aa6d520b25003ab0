//! Read-only report queries: by status, by proximity, or both, newest first.

pub mod engine;
pub mod error;
pub mod params;

pub use engine::QueryEngine;
pub use error::QueryError;
pub use params::{NearQuery, QueryParams, ReportQuery, DEFAULT_RADIUS_METERS};
