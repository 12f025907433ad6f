//! Vote ledger storage trait.

use crate::StoreError;
use pemilu_types::{CandidateId, Timestamp, VoteId, VoterId};
use serde::{Deserialize, Serialize};

/// One row of the append-only vote ledger.
///
/// Voter and candidate display fields are denormalized copies frozen at cast
/// time, so the ledger stays meaningful even if the source records are later
/// edited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: VoteId,
    /// At most one ledger row exists per voter.
    pub voter_id: VoterId,
    pub candidate_id: CandidateId,
    pub timestamp: Timestamp,
    pub voter_name: String,
    pub voter_class: String,
    pub candidate_name: String,
    pub candidate_number: u32,
}

/// Trait for reading the vote ledger.
///
/// Deliberately read-only: rows are created exactly once per successful cast
/// and removed only by the reset operations, both of which run inside the
/// backend's multi-collection write transaction.
pub trait VoteStore {
    fn get_vote(&self, id: VoteId) -> Result<Option<VoteRecord>, StoreError>;

    /// The ledger row for a voter, if they have cast a ballot.
    fn get_vote_by_voter(&self, voter_id: VoterId) -> Result<Option<VoteRecord>, StoreError>;

    /// All ledger rows in id (and therefore cast) order.
    fn iter_votes(&self) -> Result<Vec<VoteRecord>, StoreError>;

    fn vote_count(&self) -> Result<u64, StoreError>;

    fn votes_for_candidate(&self, candidate_id: CandidateId) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self
            .iter_votes()?
            .into_iter()
            .filter(|v| v.candidate_id == candidate_id)
            .collect())
    }

    /// Ledger rows with `from <= timestamp <= to`.
    fn votes_between(&self, from: Timestamp, to: Timestamp) -> Result<Vec<VoteRecord>, StoreError> {
        Ok(self
            .iter_votes()?
            .into_iter()
            .filter(|v| v.timestamp >= from && v.timestamp <= to)
            .collect())
    }
}
