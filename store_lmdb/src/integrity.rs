//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the daemon begins
//! accepting reports.

use std::path::Path;

use heed::types::Bytes;

use crate::{LmdbEnvironment, LmdbError};

/// Summary of an integrity check run.
#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Database names that must exist in a valid Groundtruth environment.
const EXPECTED_DATABASES: &[&str] = &[
    "reports",
    "chain",
    "reports_by_time",
    "reports_by_cell",
    "votes",
    "moderation_log",
    "activity_log",
    "meta",
];

/// Databases holding exactly one entry per report.
const PER_REPORT_DATABASES: &[&str] = &["chain", "reports_by_time", "reports_by_cell"];

/// Check LMDB database integrity on startup.
///
/// Opens each expected database and counts its entries, then checks that
/// the chain and both indexes hold one entry per report. Read failures and
/// mismatches are recorded in the report rather than causing a hard error.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport::default();
    let rtxn = env.env.read_txn()?;
    let mut reports_len = None;
    let mut per_report = Vec::new();

    for &db_name in EXPECTED_DATABASES {
        match env.env.open_database::<Bytes, Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => {
                        report.total_entries += count;
                        if db_name == "reports" {
                            reports_len = Some(count);
                        } else if PER_REPORT_DATABASES.contains(&db_name) {
                            per_report.push((db_name, count));
                        }
                    }
                    Err(e) => report
                        .errors
                        .push(format!("failed to read database '{db_name}': {e}")),
                }
            }
            Ok(None) => report.errors.push(format!("database '{db_name}' is missing")),
            Err(e) => report
                .errors
                .push(format!("failed to open database '{db_name}': {e}")),
        }
    }

    if let Some(expected) = reports_len {
        for (db_name, count) in per_report {
            if count != expected {
                report.errors.push(format!(
                    "database '{db_name}' has {count} entries, expected {expected}"
                ));
            }
        }
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists but `data.mdb` is missing, which suggests
/// corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let data_file = path.join("data.mdb");
    if !data_file.exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}
