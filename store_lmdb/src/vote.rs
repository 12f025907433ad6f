//! LMDB implementation of VoteStore.
//!
//! Primary database `votes` keys big-endian vote ids to bincode ledger rows,
//! so iteration order is cast order. The `vote_voters` index maps a 4-byte
//! voter key to the 8-byte vote key and is the storage-level backstop for the
//! one-ballot-per-voter rule. All writes to either database go through
//! [`crate::write_batch::WriteBatch`].

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use pemilu_store::vote::{VoteRecord, VoteStore};
use pemilu_store::StoreError;
use pemilu_types::{VoteId, VoterId};

use crate::voter::voter_key;
use crate::LmdbError;

pub struct LmdbVoteStore {
    pub(crate) env: Arc<Env>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) vote_voters_db: Database<Bytes, Bytes>,
}

/// 8-byte big-endian primary key, so id order equals key order.
pub(crate) fn vote_key(id: VoteId) -> [u8; 8] {
    id.get().to_be_bytes()
}

impl VoteStore for LmdbVoteStore {
    fn get_vote(&self, id: VoteId) -> Result<Option<VoteRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .votes_db
            .get(&rtxn, &vote_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn get_vote_by_voter(&self, voter_id: VoterId) -> Result<Option<VoteRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let vote_key_bytes = match self
            .vote_voters_db
            .get(&rtxn, &voter_key(voter_id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        match self
            .votes_db
            .get(&rtxn, vote_key_bytes)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Err(StoreError::Corruption(format!(
                "vote index for voter {} points at a missing ledger row",
                voter_id
            ))),
        }
    }

    fn iter_votes(&self) -> Result<Vec<VoteRecord>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.votes_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    fn vote_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.votes_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
