//! Nullable infrastructure for deterministic testing.
//!
//! All external dependencies (clock, blob storage, ledger storage) are
//! abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically (advance time, fail on demand,
//!   inject a racing insert)
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod blob;
pub mod clock;
pub mod store;

pub use blob::NullBlobStore;
pub use clock::NullClock;
pub use store::NullStore;
