//! Fundamental types for the pemilu election store.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: entity identifiers, timestamps, and the audit action enum.

pub mod audit;
pub mod id;
pub mod time;

pub use audit::AuditAction;
pub use id::{AdminId, AuditId, CandidateId, VoteId, VoterId};
pub use time::Timestamp;
