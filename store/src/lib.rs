//! Abstract storage traits for the pemilu election store.
//!
//! Every storage backend implements these traits over the five persisted
//! collections (voters, candidates, votes, admins, audit log). The engine
//! crate depends on the traits for reads and single-collection writes;
//! multi-collection transactions are provided by the backend directly.

pub mod admin;
pub mod audit;
pub mod candidate;
pub mod error;
pub mod meta;
pub mod vote;
pub mod voter;

pub use admin::{AdminAccount, AdminProfile, AdminStore};
pub use audit::{AuditLogEntry, AuditStore, NewAuditEntry};
pub use candidate::{Candidate, CandidateStore};
pub use error::StoreError;
pub use meta::MetaStore;
pub use vote::{VoteRecord, VoteStore};
pub use voter::{Voter, VoterStore};
