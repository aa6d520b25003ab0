#![no_main]

use libfuzzer_sys::fuzz_target;

use groundtruth_types::{ChainRecord, ModerationLogEntry, Report, Vote};

fuzz_target!(|data: &[u8]| {
    // Stored values are JSON documents; a corrupt record must surface as an
    // error, never a panic.
    let _ = serde_json::from_slice::<Report>(data);
    let _ = serde_json::from_slice::<ChainRecord>(data);
    let _ = serde_json::from_slice::<Vote>(data);
    let _ = serde_json::from_slice::<ModerationLogEntry>(data);
});
