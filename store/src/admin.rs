//! Administrator account storage trait.

use crate::StoreError;
use pemilu_types::{AdminId, Timestamp};
use serde::{Deserialize, Serialize};

/// Permissions assumed when an account's permission list is empty.
pub const DEFAULT_PERMISSIONS: [&str; 4] = ["view", "edit", "delete", "reset"];

/// An administrator account.
///
/// Passwords are stored and compared in plain text, carried over unchanged
/// from the legacy system this store replaces. This is a known weakness and
/// acceptable only for the offline single-machine deployments the store
/// targets; do not expose these accounts to a network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: AdminId,
    /// Login name, unique across admin accounts.
    pub username: String,
    pub name: String,
    pub password: String,
    /// Free-form role label, e.g. `super_admin` or `admin`.
    pub role: String,
    pub permissions: Vec<String>,
    pub email: String,
    pub phone: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AdminAccount {
    /// The sanitized view of this account. Never carries the password.
    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            id: self.id,
            username: self.username.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
            permissions: self.effective_permissions(),
        }
    }

    /// Stored permissions, or the default set when none are stored.
    pub fn effective_permissions(&self) -> Vec<String> {
        if self.permissions.is_empty() {
            DEFAULT_PERMISSIONS.iter().map(|p| p.to_string()).collect()
        } else {
            self.permissions.clone()
        }
    }
}

/// What the rest of the system sees of an authenticated administrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdminProfile {
    pub id: AdminId,
    pub username: String,
    pub name: String,
    pub role: String,
    pub permissions: Vec<String>,
}

/// Trait for administrator account storage operations.
pub trait AdminStore {
    /// Insert a new account. Fails with `Constraint` if the id or username
    /// is already taken.
    fn insert_admin(&self, admin: &AdminAccount) -> Result<(), StoreError>;

    /// Upsert an account, keeping the username index in step.
    fn put_admin(&self, admin: &AdminAccount) -> Result<(), StoreError>;

    fn get_admin(&self, id: AdminId) -> Result<Option<AdminAccount>, StoreError>;
    fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError>;

    /// Remove an account. Returns false when absent.
    fn delete_admin(&self, id: AdminId) -> Result<bool, StoreError>;

    /// All accounts in id order.
    fn iter_admins(&self) -> Result<Vec<AdminAccount>, StoreError>;

    fn admin_count(&self) -> Result<u64, StoreError>;
}
