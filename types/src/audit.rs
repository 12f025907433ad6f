//! Audit trail action kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of administrative or voting action recorded in the audit trail.
///
/// Serialized in SCREAMING_SNAKE_CASE so exported data matches the audit
/// vocabulary of the legacy system this store replaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// A ballot was cast.
    VoteCast,
    /// Every vote in the election was cleared.
    ResetAllVotes,
    /// A single voter's ballot was revoked.
    ResetSingleVote,
    /// An administrator authenticated successfully.
    AdminLogin,
    /// An administrator account was created.
    AdminAdded,
    /// An administrator account was modified.
    AdminUpdated,
    /// An administrator account was removed.
    AdminDeleted,
    /// A full backup was written.
    DatabaseBackup,
    /// Store contents were replaced from a backup.
    DatabaseRestore,
    /// The store was rebuilt after a failed open.
    DatabaseRepair,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoteCast => "VOTE_CAST",
            Self::ResetAllVotes => "RESET_ALL_VOTES",
            Self::ResetSingleVote => "RESET_SINGLE_VOTE",
            Self::AdminLogin => "ADMIN_LOGIN",
            Self::AdminAdded => "ADMIN_ADDED",
            Self::AdminUpdated => "ADMIN_UPDATED",
            Self::AdminDeleted => "ADMIN_DELETED",
            Self::DatabaseBackup => "DATABASE_BACKUP",
            Self::DatabaseRestore => "DATABASE_RESTORE",
            Self::DatabaseRepair => "DATABASE_REPAIR",
        }
    }

    /// Whether this action removed or replaced previously recorded votes.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            Self::ResetAllVotes | Self::ResetSingleVote | Self::DatabaseRestore | Self::DatabaseRepair
        )
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
