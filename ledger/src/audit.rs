//! Chain audit: re-walk the chain and report every place it no longer holds.

use serde::Serialize;

use groundtruth_store::{ChainStore, ReportStore, StoreError};
use groundtruth_types::{ContentHash, PreviousHash, ReportId};

/// A single defect found while walking the chain.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainFault {
    /// The record does not point at its predecessor's hash.
    #[serde(rename_all = "camelCase")]
    BrokenLink {
        index: u64,
        report_id: ReportId,
        expected: PreviousHash,
        found: PreviousHash,
    },
    /// The record's timestamp precedes its predecessor's.
    #[serde(rename_all = "camelCase")]
    OutOfOrder { index: u64, report_id: ReportId },
    /// The record names a report that does not exist.
    #[serde(rename_all = "camelCase")]
    MissingReport { index: u64, report_id: ReportId },
    /// The report's content hash differs from its chain record.
    #[serde(rename_all = "camelCase")]
    HashMismatch {
        index: u64,
        report_id: ReportId,
        recorded: ContentHash,
        stored: ContentHash,
    },
    /// The report's previous hash differs from its chain record.
    #[serde(rename_all = "camelCase")]
    PreviousHashMismatch {
        index: u64,
        report_id: ReportId,
        recorded: PreviousHash,
        stored: PreviousHash,
    },
}

/// Result of [`audit_chain`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainAudit {
    pub length: u64,
    pub head: Option<ContentHash>,
    pub faults: Vec<ChainFault>,
}

impl ChainAudit {
    pub fn is_intact(&self) -> bool {
        self.faults.is_empty()
    }

    /// Index of the earliest broken link, if any.
    pub fn first_broken_link(&self) -> Option<u64> {
        self.faults.iter().find_map(|f| match f {
            ChainFault::BrokenLink { index, .. } => Some(*index),
            _ => None,
        })
    }
}

/// Walk every chain record oldest first, checking linkage, ordering and the
/// stored report behind each record.
pub fn audit_chain<S>(store: &S) -> Result<ChainAudit, StoreError>
where
    S: ReportStore + ChainStore + ?Sized,
{
    let records = store.chain_records()?;
    let mut faults = Vec::new();
    let mut expected = PreviousHash::Genesis;
    let mut last_ts = None;

    for (index, record) in records.iter().enumerate() {
        let index = index as u64;

        if record.previous_hash != expected {
            faults.push(ChainFault::BrokenLink {
                index,
                report_id: record.report_id.clone(),
                expected,
                found: record.previous_hash,
            });
        }
        if last_ts.is_some_and(|prev| record.timestamp < prev) {
            faults.push(ChainFault::OutOfOrder {
                index,
                report_id: record.report_id.clone(),
            });
        }

        match store.get_report(&record.report_id)? {
            None => faults.push(ChainFault::MissingReport {
                index,
                report_id: record.report_id.clone(),
            }),
            Some(report) => {
                if report.content_hash != record.hash {
                    faults.push(ChainFault::HashMismatch {
                        index,
                        report_id: record.report_id.clone(),
                        recorded: record.hash,
                        stored: report.content_hash,
                    });
                }
                if report.previous_hash != record.previous_hash {
                    faults.push(ChainFault::PreviousHashMismatch {
                        index,
                        report_id: record.report_id.clone(),
                        recorded: record.previous_hash,
                        stored: report.previous_hash,
                    });
                }
            }
        }

        expected = PreviousHash::Hash(record.hash);
        last_ts = Some(record.timestamp);
    }

    Ok(ChainAudit {
        length: records.len() as u64,
        head: records.last().map(|r| r.hash),
        faults,
    })
}
