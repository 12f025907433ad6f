//! Write batching: groups writes that span several collections into a single
//! LMDB write transaction, so a ballot either lands in full (voter flags,
//! candidate tally, ledger row, audit entry) or not at all.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.put_voter(&voter)?;
//! batch.put_candidate(&candidate)?;
//! batch.put_vote(&record)?;
//! batch.append_audit(&entry)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).
//! Reads through the batch observe its own uncommitted writes, which is what
//! lets the engine check preconditions and build receipts inside the
//! transaction.

use heed::RwTxn;

use pemilu_store::admin::AdminAccount;
use pemilu_store::audit::{AuditLogEntry, NewAuditEntry};
use pemilu_store::candidate::Candidate;
use pemilu_store::vote::VoteRecord;
use pemilu_store::voter::Voter;
use pemilu_store::StoreError;
use pemilu_types::{AuditId, CandidateId, VoteId, VoterId};

use crate::admin::admin_key;
use crate::audit::{audit_key, AUDIT_SEQ_KEY};
use crate::candidate::{candidate_key, number_key};
use crate::environment::LmdbEnvironment;
use crate::vote::vote_key;
use crate::voter::voter_key;
use crate::LmdbError;

pub(crate) const VOTE_SEQ_KEY: &[u8] = b"vote_seq";

/// A write batch spanning every database of the environment in one LMDB
/// write transaction.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch.
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, StoreError> {
        let txn = env.env().write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, env })
    }

    // ── Voter operations ────────────────────────────────────────────────

    /// Read a voter, observing the batch's own writes.
    pub fn get_voter(&self, id: VoterId) -> Result<Option<Voter>, StoreError> {
        match self
            .env
            .voters_db
            .get(&self.txn, &voter_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    /// Put a voter and its username index entry.
    ///
    /// Callers changing a username must clear the stale index entry first;
    /// the cast and reset paths never do, and restore clears everything
    /// before inserting.
    pub fn put_voter(&mut self, voter: &Voter) -> Result<(), StoreError> {
        let key = voter_key(voter.id);
        let bytes = bincode::serialize(voter).map_err(LmdbError::from)?;
        self.env
            .voters_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .voter_usernames_db
            .put(&mut self.txn, voter.username.as_bytes(), &key)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// All voters in id order, observing the batch's own writes.
    pub fn all_voters(&self) -> Result<Vec<Voter>, StoreError> {
        let iter = self
            .env
            .voters_db
            .iter(&self.txn)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    pub fn clear_voters(&mut self) -> Result<(), StoreError> {
        self.env
            .voters_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        self.env
            .voter_usernames_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Candidate operations ────────────────────────────────────────────

    /// Read a candidate, observing the batch's own writes.
    pub fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        match self
            .env
            .candidates_db
            .get(&self.txn, &candidate_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    /// Put a candidate and its ballot-number index entry.
    pub fn put_candidate(&mut self, candidate: &Candidate) -> Result<(), StoreError> {
        let key = candidate_key(candidate.id);
        let bytes = bincode::serialize(candidate).map_err(LmdbError::from)?;
        self.env
            .candidates_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .candidate_numbers_db
            .put(&mut self.txn, &number_key(candidate.number), &key)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// All candidates in id order, observing the batch's own writes.
    pub fn all_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        let iter = self
            .env
            .candidates_db
            .iter(&self.txn)
            .map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    pub fn clear_candidates(&mut self) -> Result<(), StoreError> {
        self.env
            .candidates_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        self.env
            .candidate_numbers_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Vote ledger operations ──────────────────────────────────────────

    /// The id of the ledger row naming this voter, if one exists.
    pub fn vote_id_for_voter(&self, voter_id: VoterId) -> Result<Option<VoteId>, StoreError> {
        match self
            .env
            .vote_voters_db
            .get(&self.txn, &voter_key(voter_id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let raw = bytes
                    .try_into()
                    .map(u64::from_be_bytes)
                    .map_err(|_| LmdbError::Serialization("invalid vote index entry".into()))?;
                Ok(Some(VoteId::new(raw)))
            }
            None => Ok(None),
        }
    }

    /// Draw the next vote id from the `vote_seq` sequence.
    pub fn next_vote_id(&mut self) -> Result<VoteId, StoreError> {
        let next = self.read_sequence(VOTE_SEQ_KEY)? + 1;
        self.write_sequence(VOTE_SEQ_KEY, next)?;
        Ok(VoteId::new(next))
    }

    /// Append a ledger row and its voter index entry.
    ///
    /// Fails with `Constraint` if the voter already has a ledger row; this is
    /// the storage-level backstop for the one-ballot-per-voter rule.
    pub fn put_vote(&mut self, vote: &VoteRecord) -> Result<(), StoreError> {
        if self.vote_id_for_voter(vote.voter_id)?.is_some() {
            return Err(StoreError::Constraint(format!(
                "voter {} already has a recorded ballot",
                vote.voter_id
            )));
        }
        let key = vote_key(vote.id);
        let bytes = bincode::serialize(vote).map_err(LmdbError::from)?;
        self.env
            .votes_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .vote_voters_db
            .put(&mut self.txn, &voter_key(vote.voter_id), &key)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Read a ledger row, observing the batch's own writes.
    pub fn get_vote(&self, id: VoteId) -> Result<Option<VoteRecord>, StoreError> {
        match self
            .env
            .votes_db
            .get(&self.txn, &vote_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    /// Remove a ledger row and its voter index entry.
    pub fn delete_vote(&mut self, vote_id: VoteId, voter_id: VoterId) -> Result<(), StoreError> {
        self.env
            .votes_db
            .delete(&mut self.txn, &vote_key(vote_id))
            .map_err(LmdbError::from)?;
        self.env
            .vote_voters_db
            .delete(&mut self.txn, &voter_key(voter_id))
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Clear the entire ledger and its voter index.
    pub fn clear_votes(&mut self) -> Result<(), StoreError> {
        self.env
            .votes_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        self.env
            .vote_voters_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Admin operations ────────────────────────────────────────────────

    /// Put an admin account and its username index entry.
    pub fn put_admin(&mut self, admin: &AdminAccount) -> Result<(), StoreError> {
        let key = admin_key(admin.id);
        let bytes = bincode::serialize(admin).map_err(LmdbError::from)?;
        self.env
            .admins_db
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.env
            .admin_usernames_db
            .put(&mut self.txn, admin.username.as_bytes(), &key)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    pub fn clear_admins(&mut self) -> Result<(), StoreError> {
        self.env
            .admins_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        self.env
            .admin_usernames_db
            .clear(&mut self.txn)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    // ── Audit operations ────────────────────────────────────────────────

    /// Append an audit entry inside the batch.
    ///
    /// Returns the assigned id, or `None` when the audit collection is
    /// absent, in which case the rest of the batch is unaffected.
    pub fn append_audit(&mut self, entry: &NewAuditEntry) -> Result<Option<AuditId>, StoreError> {
        let Some(db) = self.env.audit_db else {
            tracing::debug!(action = %entry.action, "audit collection absent, entry dropped");
            return Ok(None);
        };
        let next = self.read_sequence(AUDIT_SEQ_KEY)? + 1;
        self.write_sequence(AUDIT_SEQ_KEY, next)?;

        let id = AuditId::new(next);
        let stored = AuditLogEntry::from_new(id, entry.clone());
        let bytes = bincode::serialize(&stored).map_err(LmdbError::from)?;
        db.put(&mut self.txn, &audit_key(id), &bytes)
            .map_err(LmdbError::from)?;
        Ok(Some(id))
    }

    /// Write a stored audit entry under its existing id, bypassing the
    /// sequence. Restore uses this to reinsert history; callers must advance
    /// the audit sequence past the largest restored id afterwards.
    pub fn put_audit_entry(&mut self, entry: &AuditLogEntry) -> Result<(), StoreError> {
        let Some(db) = self.env.audit_db else {
            return Ok(());
        };
        let bytes = bincode::serialize(entry).map_err(LmdbError::from)?;
        db.put(&mut self.txn, &audit_key(entry.id), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Clear the audit trail. A no-op when the collection is absent.
    pub fn clear_audit(&mut self) -> Result<(), StoreError> {
        if let Some(db) = self.env.audit_db {
            db.clear(&mut self.txn).map_err(LmdbError::from)?;
        }
        Ok(())
    }

    // ── Sequence bookkeeping ────────────────────────────────────────────

    fn read_sequence(&self, key: &[u8]) -> Result<u64, StoreError> {
        let current = self
            .env
            .meta_db
            .get(&self.txn, key)
            .map_err(LmdbError::from)?
            .and_then(|b| b.try_into().ok().map(u64::from_be_bytes))
            .unwrap_or(0);
        Ok(current)
    }

    fn write_sequence(&mut self, key: &[u8], value: u64) -> Result<(), StoreError> {
        self.env
            .meta_db
            .put(&mut self.txn, key, &value.to_be_bytes())
            .map_err(LmdbError::from)?;
        Ok(())
    }

    /// Advance the vote id sequence to at least `floor`.
    ///
    /// Used after a restore so newly cast ballots never reuse restored ids.
    pub fn advance_vote_sequence(&mut self, floor: u64) -> Result<(), StoreError> {
        if self.read_sequence(VOTE_SEQ_KEY)? < floor {
            self.write_sequence(VOTE_SEQ_KEY, floor)?;
        }
        Ok(())
    }

    /// Advance the audit id sequence to at least `floor`.
    pub fn advance_audit_sequence(&mut self, floor: u64) -> Result<(), StoreError> {
        if self.read_sequence(AUDIT_SEQ_KEY)? < floor {
            self.write_sequence(AUDIT_SEQ_KEY, floor)?;
        }
        Ok(())
    }

    // ── Commit / rollback ───────────────────────────────────────────────

    /// Commit all batched operations in a single write transaction.
    ///
    /// This is the only fsync in the entire batch.
    pub fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
