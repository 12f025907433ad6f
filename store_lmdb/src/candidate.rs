//! LMDB implementation of CandidateStore.
//!
//! Primary database `candidates` keys big-endian candidate ids to bincode
//! records. The `candidate_numbers` index maps each ballot number to the
//! 4-byte candidate key and enforces ballot-number uniqueness.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use pemilu_store::candidate::{Candidate, CandidateStore};
use pemilu_store::StoreError;
use pemilu_types::CandidateId;

use crate::LmdbError;

pub struct LmdbCandidateStore {
    pub(crate) env: Arc<Env>,
    pub(crate) candidates_db: Database<Bytes, Bytes>,
    pub(crate) candidate_numbers_db: Database<Bytes, Bytes>,
}

/// 4-byte big-endian primary key, so id order equals key order.
pub(crate) fn candidate_key(id: CandidateId) -> [u8; 4] {
    id.get().to_be_bytes()
}

/// 4-byte big-endian ballot-number index key.
pub(crate) fn number_key(number: u32) -> [u8; 4] {
    number.to_be_bytes()
}

impl CandidateStore for LmdbCandidateStore {
    fn insert_candidate(&self, candidate: &Candidate) -> Result<(), StoreError> {
        let key = candidate_key(candidate.id);
        let bytes = bincode::serialize(candidate).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .candidates_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Constraint(format!(
                "candidate id {} already exists",
                candidate.id
            )));
        }
        if self
            .candidate_numbers_db
            .get(&wtxn, &number_key(candidate.number))
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Constraint(format!(
                "ballot number {} is already taken",
                candidate.number
            )));
        }
        self.candidates_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.candidate_numbers_db
            .put(&mut wtxn, &number_key(candidate.number), &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_candidate(&self, candidate: &Candidate) -> Result<(), StoreError> {
        let key = candidate_key(candidate.id);
        let bytes = bincode::serialize(candidate).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let previous: Option<Candidate> = self
            .candidates_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .map(bincode::deserialize)
            .transpose()
            .map_err(LmdbError::from)?;
        if let Some(prev) = previous {
            if prev.number != candidate.number {
                self.candidate_numbers_db
                    .delete(&mut wtxn, &number_key(prev.number))
                    .map_err(LmdbError::from)?;
            }
        }
        if let Some(owner) = self
            .candidate_numbers_db
            .get(&wtxn, &number_key(candidate.number))
            .map_err(LmdbError::from)?
        {
            if owner != key.as_slice() {
                return Err(StoreError::Constraint(format!(
                    "ballot number {} is already taken",
                    candidate.number
                )));
            }
        }

        self.candidates_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.candidate_numbers_db
            .put(&mut wtxn, &number_key(candidate.number), &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .candidates_db
            .get(&rtxn, &candidate_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn get_candidate_by_number(&self, number: u32) -> Result<Option<Candidate>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let id_key = match self
            .candidate_numbers_db
            .get(&rtxn, &number_key(number))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        match self
            .candidates_db
            .get(&rtxn, id_key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn delete_candidate(&self, id: CandidateId) -> Result<bool, StoreError> {
        let key = candidate_key(id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let candidate: Candidate = match self
            .candidates_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bincode::deserialize(bytes).map_err(LmdbError::from)?,
            None => return Ok(false),
        };
        if candidate.vote_count > 0 {
            return Err(StoreError::Constraint(format!(
                "candidate {} holds {} votes; reset them before deleting",
                id, candidate.vote_count
            )));
        }
        self.candidates_db
            .delete(&mut wtxn, &key)
            .map_err(LmdbError::from)?;
        self.candidate_numbers_db
            .delete(&mut wtxn, &number_key(candidate.number))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn iter_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.candidates_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    fn candidate_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.candidates_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
