//! LMDB implementation of AuditStore.
//!
//! Entries are keyed by 8-byte big-endian ids drawn from the `audit_seq`
//! sequence in `meta`, so reverse iteration yields newest-first. The audit
//! database handle is optional: a store without it keeps working and appends
//! become no-ops, per the degradation contract.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use pemilu_store::audit::{AuditLogEntry, AuditStore, NewAuditEntry};
use pemilu_store::StoreError;
use pemilu_types::AuditId;

use crate::LmdbError;

pub(crate) const AUDIT_SEQ_KEY: &[u8] = b"audit_seq";

pub struct LmdbAuditStore {
    pub(crate) env: Arc<Env>,
    pub(crate) audit_db: Option<Database<Bytes, Bytes>>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

/// 8-byte big-endian primary key, so id order equals append order.
pub(crate) fn audit_key(id: AuditId) -> [u8; 8] {
    id.get().to_be_bytes()
}

impl AuditStore for LmdbAuditStore {
    fn append_audit(&self, entry: &NewAuditEntry) -> Result<Option<AuditId>, StoreError> {
        let Some(db) = self.audit_db else {
            tracing::warn!(action = %entry.action, "audit collection absent, entry dropped");
            return Ok(None);
        };

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let next = self
            .meta_db
            .get(&wtxn, AUDIT_SEQ_KEY)
            .map_err(LmdbError::from)?
            .and_then(|b| b.try_into().ok().map(u64::from_be_bytes))
            .unwrap_or(0)
            + 1;
        self.meta_db
            .put(&mut wtxn, AUDIT_SEQ_KEY, &next.to_be_bytes())
            .map_err(LmdbError::from)?;

        let id = AuditId::new(next);
        let stored = AuditLogEntry::from_new(id, entry.clone());
        let bytes = bincode::serialize(&stored).map_err(LmdbError::from)?;
        db.put(&mut wtxn, &audit_key(id), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(Some(id))
    }

    fn iter_audit_logs(&self) -> Result<Vec<AuditLogEntry>, StoreError> {
        let Some(db) = self.audit_db else {
            return Ok(Vec::new());
        };
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = db.rev_iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    fn audit_count(&self) -> Result<u64, StoreError> {
        let Some(db) = self.audit_db else {
            return Ok(0);
        };
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn clear_audit_logs(&self) -> Result<(), StoreError> {
        let Some(db) = self.audit_db else {
            return Ok(());
        };
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        db.clear(&mut wtxn).map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn audit_available(&self) -> bool {
        self.audit_db.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pemilu_types::{AuditAction, Timestamp};

    fn open_test_env() -> (tempfile::TempDir, crate::LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 16, 1 << 20).unwrap();
        (dir, env)
    }

    fn entry(action: AuditAction, details: &str) -> NewAuditEntry {
        NewAuditEntry::new(action, "system", "System", details, Timestamp::new(9_000))
    }

    #[test]
    fn append_assigns_increasing_ids() {
        let (_dir, env) = open_test_env();
        let store = env.audit_store();

        let first = store
            .append_audit(&entry(AuditAction::AdminLogin, "admin logged in"))
            .unwrap()
            .unwrap();
        let second = store
            .append_audit(&entry(AuditAction::VoteCast, "ballot recorded"))
            .unwrap()
            .unwrap();
        assert!(second > first);
        assert_eq!(store.audit_count().unwrap(), 2);
    }

    #[test]
    fn iter_returns_newest_first() {
        let (_dir, env) = open_test_env();
        let store = env.audit_store();

        store
            .append_audit(&entry(AuditAction::AdminLogin, "first"))
            .unwrap();
        store
            .append_audit(&entry(AuditAction::ResetAllVotes, "second"))
            .unwrap();

        let logs = store.iter_audit_logs().unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].action, AuditAction::ResetAllVotes);
        assert_eq!(logs[1].action, AuditAction::AdminLogin);
        assert!(logs[0].id > logs[1].id);
    }

    #[test]
    fn filter_by_action() {
        let (_dir, env) = open_test_env();
        let store = env.audit_store();

        store
            .append_audit(&entry(AuditAction::VoteCast, "a"))
            .unwrap();
        store
            .append_audit(&entry(AuditAction::AdminLogin, "b"))
            .unwrap();
        store
            .append_audit(&entry(AuditAction::VoteCast, "c"))
            .unwrap();

        let casts = store.audit_logs_by_action(AuditAction::VoteCast).unwrap();
        assert_eq!(casts.len(), 2);
    }

    #[test]
    fn absent_collection_degrades_to_noop() {
        let (_dir, env) = open_test_env();
        let mut degraded = env.audit_store();
        degraded.audit_db = None;

        assert!(!degraded.audit_available());
        let id = degraded
            .append_audit(&entry(AuditAction::VoteCast, "dropped"))
            .unwrap();
        assert_eq!(id, None);
        assert!(degraded.iter_audit_logs().unwrap().is_empty());
        assert_eq!(degraded.audit_count().unwrap(), 0);
        degraded.clear_audit_logs().unwrap();
    }

    #[test]
    fn clear_empties_the_trail() {
        let (_dir, env) = open_test_env();
        let store = env.audit_store();

        store
            .append_audit(&entry(AuditAction::DatabaseBackup, "snapshot"))
            .unwrap();
        store.clear_audit_logs().unwrap();
        assert_eq!(store.audit_count().unwrap(), 0);

        // Sequence keeps running, so ids never repeat after a clear.
        let id = store
            .append_audit(&entry(AuditAction::DatabaseRestore, "restored"))
            .unwrap()
            .unwrap();
        assert!(id.get() >= 2);
    }
}
