//! Voter storage trait.

use crate::StoreError;
use pemilu_types::{CandidateId, Timestamp, VoterId};
use serde::{Deserialize, Serialize};

/// A registered voter.
///
/// The three vote fields (`has_voted`, `voted_candidate_id`, `vote_time`)
/// change together or not at all: all set after a successful cast, all clear
/// otherwise. `vote_state_consistent` checks that pairing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Voter {
    pub id: VoterId,
    /// Login name, unique across the roster.
    pub username: String,
    pub name: String,
    /// Organizational unit used for turnout breakdowns.
    pub class: String,
    pub has_voted: bool,
    pub voted_candidate_id: Option<CandidateId>,
    pub vote_time: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Voter {
    /// A voter who has not cast a ballot yet.
    pub fn new(
        id: VoterId,
        username: impl Into<String>,
        name: impl Into<String>,
        class: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            username: username.into(),
            name: name.into(),
            class: class.into(),
            has_voted: false,
            voted_candidate_id: None,
            vote_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a successful cast for `candidate` at `now`.
    pub fn mark_voted(&mut self, candidate: CandidateId, now: Timestamp) {
        self.has_voted = true;
        self.voted_candidate_id = Some(candidate);
        self.vote_time = Some(now);
        self.updated_at = now;
    }

    /// Clear the vote fields back to the not-voted state.
    pub fn clear_vote(&mut self, now: Timestamp) {
        self.has_voted = false;
        self.voted_candidate_id = None;
        self.vote_time = None;
        self.updated_at = now;
    }

    /// Whether the vote fields are set all-or-none.
    pub fn vote_state_consistent(&self) -> bool {
        self.has_voted == self.voted_candidate_id.is_some()
            && self.has_voted == self.vote_time.is_some()
    }
}

/// Trait for voter storage operations.
pub trait VoterStore {
    /// Insert a new voter. Fails with `Constraint` if the id or username
    /// is already taken.
    fn insert_voter(&self, voter: &Voter) -> Result<(), StoreError>;

    /// Upsert a voter, keeping the username index in step.
    fn put_voter(&self, voter: &Voter) -> Result<(), StoreError>;

    fn get_voter(&self, id: VoterId) -> Result<Option<Voter>, StoreError>;
    fn get_voter_by_username(&self, username: &str) -> Result<Option<Voter>, StoreError>;

    /// Remove a voter. Returns false when absent. Fails with `Constraint`
    /// while the voter still holds a ballot.
    fn delete_voter(&self, id: VoterId) -> Result<bool, StoreError>;

    /// All voters in id order.
    fn iter_voters(&self) -> Result<Vec<Voter>, StoreError>;

    fn voter_count(&self) -> Result<u64, StoreError>;

    /// First and last username in sort order, or None for an empty roster.
    fn username_bounds(&self) -> Result<Option<(String, String)>, StoreError> {
        let mut usernames: Vec<String> =
            self.iter_voters()?.into_iter().map(|v| v.username).collect();
        usernames.sort();
        let first = usernames.first().cloned();
        let last = usernames.last().cloned();
        Ok(first.zip(last))
    }

    fn voters_by_class(&self, class: &str) -> Result<Vec<Voter>, StoreError> {
        Ok(self
            .iter_voters()?
            .into_iter()
            .filter(|v| v.class == class)
            .collect())
    }

    fn voters_by_voted(&self, voted: bool) -> Result<Vec<Voter>, StoreError> {
        Ok(self
            .iter_voters()?
            .into_iter()
            .filter(|v| v.has_voted == voted)
            .collect())
    }

    /// Count voters who have cast a ballot without allocating the full set.
    fn voted_voter_count(&self) -> Result<u64, StoreError> {
        self.voters_by_voted(true).map(|v| v.len() as u64)
    }
}
