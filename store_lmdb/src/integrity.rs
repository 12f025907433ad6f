//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption or a foreign data directory early,
//! before the store accepts any ballots.

use std::path::Path;
use std::sync::Arc;

use heed::Env;

use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    /// Required databases that could not be found.
    pub missing: Vec<String>,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if every required database is present and readable.
    pub fn is_healthy(&self) -> bool {
        self.missing.is_empty() && self.errors.is_empty()
    }
}

/// Databases that must exist in a valid election store environment.
const REQUIRED_DATABASES: &[&str] = &[
    "voters",
    "voter_usernames",
    "candidates",
    "candidate_numbers",
    "votes",
    "vote_voters",
    "admins",
    "admin_usernames",
    "meta",
];

/// Databases the store can run without (audit trail degrades to no-ops).
const OPTIONAL_DATABASES: &[&str] = &["audit_logs"];

/// Check LMDB database integrity.
///
/// Opens each expected database and attempts to count entries. Read failures
/// are recorded in the report rather than causing a hard error.
pub fn check_integrity(env: &Arc<Env>) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        missing: Vec::new(),
        errors: Vec::new(),
    };

    let rtxn = env.read_txn().map_err(LmdbError::from)?;

    for &db_name in REQUIRED_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => {
                        report.total_entries += count;
                    }
                    Err(e) => {
                        report
                            .errors
                            .push(format!("failed to read database '{}': {}", db_name, e));
                    }
                }
            }
            Ok(None) => {
                report.missing.push(db_name.to_string());
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("failed to open database '{}': {}", db_name, e));
            }
        }
    }

    for &db_name in OPTIONAL_DATABASES {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                if let Ok(count) = db.len(&rtxn) {
                    report.total_entries += count;
                }
            }
            Ok(None) => {
                tracing::warn!(database = db_name, "optional database absent");
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("failed to open database '{}': {}", db_name, e));
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
        return Ok(()); // Fresh start
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_data_dir_fresh_path() {
        let result = check_data_dir(Path::new("/tmp/pemilu_test_nonexistent_12345"));
        assert!(result.is_ok());
    }

    #[test]
    fn freshly_opened_environment_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 16, 1 << 20).unwrap();

        let report = check_integrity(env.env()).unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.databases_checked, 10);
    }

    #[test]
    fn unhealthy_report() {
        let report = IntegrityReport {
            databases_checked: 5,
            total_entries: 100,
            missing: Vec::new(),
            errors: vec!["corruption detected".to_string()],
        };
        assert!(!report.is_healthy());
    }

    #[test]
    fn missing_required_database_is_unhealthy() {
        let report = IntegrityReport {
            databases_checked: 8,
            total_entries: 0,
            missing: vec!["votes".to_string()],
            errors: Vec::new(),
        };
        assert!(!report.is_healthy());
    }
}
