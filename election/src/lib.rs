//! Election engine for the pemilu voting system.
//!
//! [`store::ElectionStore`] is the single entry point: it owns the LMDB
//! environment and exposes the full election lifecycle as typed operations.
//! Voter login, the atomic cast transaction, tallying, resets, admin account
//! management and export/backup/restore all live here; persistence details
//! stay behind the `pemilu-store` traits and the backend's write batch.

pub mod error;
pub mod event;
pub mod export;
pub mod outcome;
pub mod seed;
pub mod stats;
pub mod store;

pub use error::ElectionError;
pub use event::{ElectionEvent, EventBus};
pub use export::{BackupFile, ExportSnapshot, RestoreReport};
pub use outcome::{
    AdminLoginOutcome, CastOutcome, HealthReport, LoginOutcome, ResetOutcome, VoteReceipt,
    VotingStatus,
};
pub use seed::BootstrapReport;
pub use stats::ElectionStats;
pub use store::{
    AdminPatch, CandidatePatch, ElectionStore, NewAdmin, NewCandidate, NewVoter, VoterPatch,
};
