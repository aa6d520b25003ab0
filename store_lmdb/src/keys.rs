//! Binary key layouts.
//!
//! - `reports`, `chain`, `moderation`: `seq_be(8)`
//! - `by_time`: `timestamp_be(8) ++ seq_be(8)`; big-endian sorts by time,
//!   the sequence breaks ties in insertion order
//! - `by_cell`: `cell(4) ++ seq_be(8)`
//! - `votes`: `report_id ++ 0x00 ++ user_id`

use groundtruth_types::{GeoCell, ReportId, Timestamp, UserId};

pub(crate) fn seq_key(seq: u64) -> [u8; 8] {
    seq.to_be_bytes()
}

pub(crate) fn seq_from_key(key: &[u8]) -> Option<u64> {
    let arr: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(arr))
}

pub(crate) fn time_key(ts: Timestamp, seq: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&ts.to_be_bytes());
    key[8..].copy_from_slice(&seq.to_be_bytes());
    key
}

/// Sequence number stored in the tail of a `by_time` or `by_cell` key.
pub(crate) fn seq_suffix(key: &[u8]) -> Option<u64> {
    let start = key.len().checked_sub(8)?;
    seq_from_key(&key[start..])
}

pub(crate) fn cell_key(cell: GeoCell, seq: u64) -> [u8; 12] {
    let mut key = [0u8; 12];
    key[..4].copy_from_slice(&cell.to_bytes());
    key[4..].copy_from_slice(&seq.to_be_bytes());
    key
}

pub(crate) fn vote_prefix(report_id: &ReportId) -> Vec<u8> {
    let mut key = Vec::with_capacity(report_id.as_str().len() + 1);
    key.extend_from_slice(report_id.as_str().as_bytes());
    key.push(0);
    key
}

pub(crate) fn vote_key(report_id: &ReportId, user_id: &UserId) -> Vec<u8> {
    let mut key = vote_prefix(report_id);
    key.extend_from_slice(user_id.as_str().as_bytes());
    key
}

/// Exclusive upper bound of a prefix range-scan: the shortest key greater
/// than every key starting with `prefix`. `None` when no such key exists
/// (empty or all-0xFF prefix), meaning the scan runs to the end.
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.last_mut() {
        if *last < 0xFF {
            *last += 1;
            return Some(upper);
        }
        upper.pop();
    }
    None
}
