//! Audit trail storage trait.

use crate::StoreError;
use pemilu_types::{AuditAction, AuditId, Timestamp};
use serde::{Deserialize, Serialize};

/// Origin marker recorded when no explicit origin is given.
pub const DEFAULT_ORIGIN: &str = "local";

/// An audit entry as submitted by the engine, before an id is assigned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub action: AuditAction,
    /// Who acted: a voter id rendered as text, or `system` for maintenance.
    pub actor_id: String,
    pub actor_name: String,
    pub details: String,
    pub origin: String,
    pub timestamp: Timestamp,
}

impl NewAuditEntry {
    pub fn new(
        action: AuditAction,
        actor_id: impl Into<String>,
        actor_name: impl Into<String>,
        details: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            action,
            actor_id: actor_id.into(),
            actor_name: actor_name.into(),
            details: details.into(),
            origin: DEFAULT_ORIGIN.to_string(),
            timestamp,
        }
    }
}

/// A stored audit entry. Ids increase strictly in append order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: AuditId,
    pub action: AuditAction,
    pub actor_id: String,
    pub actor_name: String,
    pub details: String,
    pub origin: String,
    pub timestamp: Timestamp,
}

impl AuditLogEntry {
    pub fn from_new(id: AuditId, entry: NewAuditEntry) -> Self {
        Self {
            id,
            action: entry.action,
            actor_id: entry.actor_id,
            actor_name: entry.actor_name,
            details: entry.details,
            origin: entry.origin,
            timestamp: entry.timestamp,
        }
    }
}

/// Trait for audit trail storage operations.
///
/// The audit collection is the one part of the store allowed to be absent:
/// a backend missing it keeps serving every other operation. Appends then
/// return `Ok(None)` and reads return empty sets.
pub trait AuditStore {
    /// Append an entry. Returns the assigned id, or `None` when the audit
    /// collection is absent.
    fn append_audit(&self, entry: &NewAuditEntry) -> Result<Option<AuditId>, StoreError>;

    /// All entries, newest first.
    fn iter_audit_logs(&self) -> Result<Vec<AuditLogEntry>, StoreError>;

    fn audit_count(&self) -> Result<u64, StoreError>;

    /// Remove every entry. A no-op when the collection is absent.
    fn clear_audit_logs(&self) -> Result<(), StoreError>;

    /// Whether the audit collection is present and writable.
    fn audit_available(&self) -> bool {
        true
    }

    fn audit_logs_by_action(&self, action: AuditAction) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self
            .iter_audit_logs()?
            .into_iter()
            .filter(|e| e.action == action)
            .collect())
    }
}
