//! Typed outcomes for the engine's voter-facing and admin-facing operations.
//!
//! Rule failures (unknown voter, repeat ballot, wrong password) are values,
//! not errors; `Err` is reserved for storage and serialization trouble.

use serde::Serialize;

use pemilu_store::admin::AdminProfile;
use pemilu_store::voter::Voter;
use pemilu_types::{CandidateId, Timestamp, VoteId, VoterId};
use pemilu_utils::OpSnapshot;

/// Result of a voter login attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum LoginOutcome {
    /// Known voter who has not cast a ballot yet.
    Success(Voter),
    /// Known voter who already voted; the client shows their receipt state.
    AlreadyVoted(Voter),
    /// Unknown username. The hint names the valid range, derived from the
    /// live roster rather than a hardcoded string.
    NotFound { hint: String },
}

/// Result of a cast attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum CastOutcome {
    Success(VoteReceipt),
    /// The voter has already cast a ballot; nothing was changed.
    AlreadyVoted,
    VoterNotFound,
    CandidateNotFound,
}

/// Proof of a recorded ballot, read back from the transaction that wrote it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VoteReceipt {
    pub vote_id: VoteId,
    pub voter_id: VoterId,
    pub voter_name: String,
    pub voter_class: String,
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub candidate_number: u32,
    /// The candidate's tally after this ballot.
    pub candidate_votes: u64,
    pub timestamp: Timestamp,
}

/// Result of withdrawing a single voter's ballot.
#[derive(Clone, Debug, PartialEq)]
pub enum ResetOutcome {
    Reset {
        voter_id: VoterId,
        previous_choice: Option<CandidateId>,
    },
    /// The voter had no ballot; the operation is an idempotent no-op.
    NotVoted,
    VoterNotFound,
}

/// Result of an admin login attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum AdminLoginOutcome {
    Success(AdminProfile),
    BadUsername,
    BadPassword,
}

/// A voter's current ballot state, with the chosen candidate summarized.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VotingStatus {
    pub voter_id: VoterId,
    pub has_voted: bool,
    pub vote_time: Option<Timestamp>,
    pub choice: Option<CandidateSummary>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CandidateSummary {
    pub id: CandidateId,
    pub name: String,
    pub number: u32,
}

/// Structural health of the store plus in-process operation counters.
#[derive(Clone, Debug, Serialize)]
pub struct HealthReport {
    pub healthy: bool,
    pub audit_available: bool,
    pub schema_version: Option<u32>,
    pub voters: u64,
    pub candidates: u64,
    pub votes: u64,
    pub admins: u64,
    pub audit_entries: u64,
    /// Required databases that could not be opened.
    pub missing_databases: Vec<String>,
    pub ops: OpSnapshot,
}
