#![no_main]

use libfuzzer_sys::fuzz_target;

use groundtruth_ledger::RawSubmission;

fuzz_target!(|data: &[u8]| {
    // Upload bodies come straight off the wire; parsing and validation must
    // reject garbage without panicking.
    let Ok(raw) = serde_json::from_slice::<RawSubmission>(data) else {
        return;
    };
    if let Ok(submission) = raw.validate() {
        assert!(!submission.file_bytes().is_empty());
        let point = submission.location();
        assert!((-90.0..=90.0).contains(&point.lat()));
        assert!((-180.0..=180.0).contains(&point.long()));
        let _ = groundtruth_crypto::sha256(submission.file_bytes());
    }
});
