//! Content hashing for the Groundtruth report ledger.
//!
//! - **SHA-256** over the raw artifact bytes produces a report's content hash
//! - Streaming variant for artifacts read from disk or a socket

pub mod hash;

pub use hash::{digest, digest_reader, sha256};
