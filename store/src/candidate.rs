//! Candidate storage trait.

use crate::StoreError;
use pemilu_types::{CandidateId, Timestamp};
use serde::{Deserialize, Serialize};

/// A candidate pair on the ballot.
///
/// `vote_count` is the running tally and always equals the number of ledger
/// rows naming this candidate. It is only ever changed inside the engine's
/// cast and reset transactions, never through this trait.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    /// Ballot number shown to voters, unique across candidates.
    pub number: u32,
    pub name: String,
    /// Running mate's name; empty when the candidate runs alone.
    pub running_mate: String,
    pub class: String,
    pub slogan: String,
    pub tags: Vec<String>,
    pub vision: String,
    pub mission: Vec<String>,
    pub photo: String,
    pub running_mate_photo: String,
    pub vote_count: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Trait for candidate storage operations.
pub trait CandidateStore {
    /// Insert a new candidate. Fails with `Constraint` if the id or ballot
    /// number is already taken.
    fn insert_candidate(&self, candidate: &Candidate) -> Result<(), StoreError>;

    /// Upsert a candidate, keeping the ballot-number index in step.
    fn put_candidate(&self, candidate: &Candidate) -> Result<(), StoreError>;

    fn get_candidate(&self, id: CandidateId) -> Result<Option<Candidate>, StoreError>;
    fn get_candidate_by_number(&self, number: u32) -> Result<Option<Candidate>, StoreError>;

    /// Remove a candidate. Returns false when absent. Fails with `Constraint`
    /// while the candidate still holds votes.
    fn delete_candidate(&self, id: CandidateId) -> Result<bool, StoreError>;

    /// All candidates in id order.
    fn iter_candidates(&self) -> Result<Vec<Candidate>, StoreError>;

    fn candidate_count(&self) -> Result<u64, StoreError>;
}
