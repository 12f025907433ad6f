//! LMDB environment owning every database of the election store.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use pemilu_store::StoreError;

use crate::admin::LmdbAdminStore;
use crate::audit::LmdbAuditStore;
use crate::candidate::LmdbCandidateStore;
use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::vote::LmdbVoteStore;
use crate::voter::LmdbVoterStore;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// A single LMDB environment holding all ten databases of the store.
///
/// Five primary collections (`voters`, `candidates`, `votes`, `admins`,
/// `audit_logs`), four uniqueness indexes (`voter_usernames`,
/// `candidate_numbers`, `vote_voters`, `admin_usernames`) and the `meta`
/// bookkeeping database. Database handles are cheap copies; the per-collection
/// store accessors clone the `Arc<Env>` and copy the handles they need.
///
/// `audit_logs` is the one optional database: when it cannot be opened the
/// environment still serves every voting operation and audit writes degrade
/// to no-ops.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    pub voters_db: Database<Bytes, Bytes>,
    pub voter_usernames_db: Database<Bytes, Bytes>,
    pub candidates_db: Database<Bytes, Bytes>,
    pub candidate_numbers_db: Database<Bytes, Bytes>,
    pub votes_db: Database<Bytes, Bytes>,
    pub vote_voters_db: Database<Bytes, Bytes>,
    pub admins_db: Database<Bytes, Bytes>,
    pub admin_usernames_db: Database<Bytes, Bytes>,
    pub audit_db: Option<Database<Bytes, Bytes>>,
    pub meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open (or create) the environment at `path` and run schema migrations.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)
            .map_err(|e| LmdbError::Heed(format!("create data dir {}: {}", path.display(), e)))?;

        // Safety: each data directory is opened by exactly one environment
        // per process; the engine owns the environment for its lifetime.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs)
                .open(path)?
        };
        let env = Arc::new(env);

        let mut wtxn = env.write_txn()?;
        let voters_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("voters"))?;
        let voter_usernames_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("voter_usernames"))?;
        let candidates_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("candidates"))?;
        let candidate_numbers_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("candidate_numbers"))?;
        let votes_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("votes"))?;
        let vote_voters_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("vote_voters"))?;
        let admins_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("admins"))?;
        let admin_usernames_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some("admin_usernames"))?;
        let audit_db = match env.create_database::<Bytes, Bytes>(&mut wtxn, Some("audit_logs")) {
            Ok(db) => Some(db),
            Err(e) => {
                tracing::warn!(error = %e, "audit_logs database unavailable, audit trail disabled");
                None
            }
        };
        let meta_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let environment = Self {
            env,
            voters_db,
            voter_usernames_db,
            candidates_db,
            candidate_numbers_db,
            votes_db,
            vote_voters_db,
            admins_db,
            admin_usernames_db,
            audit_db,
            meta_db,
        };

        Migrator::run(&environment.meta_store())?;
        Ok(environment)
    }

    /// The raw heed environment, for read transactions and maintenance.
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    pub fn voter_store(&self) -> LmdbVoterStore {
        LmdbVoterStore {
            env: Arc::clone(&self.env),
            voters_db: self.voters_db,
            voter_usernames_db: self.voter_usernames_db,
        }
    }

    pub fn candidate_store(&self) -> LmdbCandidateStore {
        LmdbCandidateStore {
            env: Arc::clone(&self.env),
            candidates_db: self.candidates_db,
            candidate_numbers_db: self.candidate_numbers_db,
        }
    }

    pub fn vote_store(&self) -> LmdbVoteStore {
        LmdbVoteStore {
            env: Arc::clone(&self.env),
            votes_db: self.votes_db,
            vote_voters_db: self.vote_voters_db,
        }
    }

    pub fn admin_store(&self) -> LmdbAdminStore {
        LmdbAdminStore {
            env: Arc::clone(&self.env),
            admins_db: self.admins_db,
            admin_usernames_db: self.admin_usernames_db,
        }
    }

    pub fn audit_store(&self) -> LmdbAuditStore {
        LmdbAuditStore {
            env: Arc::clone(&self.env),
            audit_db: self.audit_db,
            meta_db: self.meta_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }

    /// Begin a write batch spanning every database in the environment.
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, StoreError> {
        WriteBatch::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_databases_and_stamps_schema() {
        use pemilu_store::MetaStore;

        let dir = tempfile::tempdir().expect("tempdir");
        let env = LmdbEnvironment::open(dir.path(), 16, 1 << 20).expect("open");

        assert!(env.audit_db.is_some());
        let version = env.meta_store().get_schema_version().expect("version");
        assert_eq!(version, Some(crate::migration::CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn reopen_preserves_schema_version() {
        use pemilu_store::MetaStore;

        let dir = tempfile::tempdir().expect("tempdir");
        {
            let _env = LmdbEnvironment::open(dir.path(), 16, 1 << 20).expect("first open");
        }
        let env = LmdbEnvironment::open(dir.path(), 16, 1 << 20).expect("second open");
        let version = env.meta_store().get_schema_version().expect("version");
        assert_eq!(version, Some(crate::migration::CURRENT_SCHEMA_VERSION));
    }
}
