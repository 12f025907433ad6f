//! LMDB implementation of AdminStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use pemilu_store::admin::{AdminAccount, AdminStore};
use pemilu_store::StoreError;
use pemilu_types::AdminId;

use crate::LmdbError;

pub struct LmdbAdminStore {
    pub(crate) env: Arc<Env>,
    pub(crate) admins_db: Database<Bytes, Bytes>,
    pub(crate) admin_usernames_db: Database<Bytes, Bytes>,
}

/// 4-byte big-endian primary key, so id order equals key order.
pub(crate) fn admin_key(id: AdminId) -> [u8; 4] {
    id.get().to_be_bytes()
}

impl AdminStore for LmdbAdminStore {
    fn insert_admin(&self, admin: &AdminAccount) -> Result<(), StoreError> {
        let key = admin_key(admin.id);
        let bytes = bincode::serialize(admin).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .admins_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Constraint(format!(
                "admin id {} already exists",
                admin.id
            )));
        }
        if self
            .admin_usernames_db
            .get(&wtxn, admin.username.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Constraint(format!(
                "admin username '{}' is already taken",
                admin.username
            )));
        }
        self.admins_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.admin_usernames_db
            .put(&mut wtxn, admin.username.as_bytes(), &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_admin(&self, admin: &AdminAccount) -> Result<(), StoreError> {
        let key = admin_key(admin.id);
        let bytes = bincode::serialize(admin).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let previous: Option<AdminAccount> = self
            .admins_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .map(bincode::deserialize)
            .transpose()
            .map_err(LmdbError::from)?;
        if let Some(prev) = previous {
            if prev.username != admin.username {
                self.admin_usernames_db
                    .delete(&mut wtxn, prev.username.as_bytes())
                    .map_err(LmdbError::from)?;
            }
        }
        if let Some(owner) = self
            .admin_usernames_db
            .get(&wtxn, admin.username.as_bytes())
            .map_err(LmdbError::from)?
        {
            if owner != key.as_slice() {
                return Err(StoreError::Constraint(format!(
                    "admin username '{}' is already taken",
                    admin.username
                )));
            }
        }

        self.admins_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.admin_usernames_db
            .put(&mut wtxn, admin.username.as_bytes(), &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_admin(&self, id: AdminId) -> Result<Option<AdminAccount>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .admins_db
            .get(&rtxn, &admin_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let id_key = match self
            .admin_usernames_db
            .get(&rtxn, username.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        match self.admins_db.get(&rtxn, id_key).map_err(LmdbError::from)? {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn delete_admin(&self, id: AdminId) -> Result<bool, StoreError> {
        let key = admin_key(id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let admin: AdminAccount = match self
            .admins_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bincode::deserialize(bytes).map_err(LmdbError::from)?,
            None => return Ok(false),
        };
        self.admins_db
            .delete(&mut wtxn, &key)
            .map_err(LmdbError::from)?;
        self.admin_usernames_db
            .delete(&mut wtxn, admin.username.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn iter_admins(&self) -> Result<Vec<AdminAccount>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.admins_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    fn admin_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.admins_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pemilu_types::Timestamp;

    fn open_test_env() -> (tempfile::TempDir, crate::LmdbEnvironment) {
        let dir = tempfile::tempdir().unwrap();
        let env = crate::LmdbEnvironment::open(dir.path(), 16, 1 << 20).unwrap();
        (dir, env)
    }

    fn admin(id: u32, username: &str, role: &str) -> AdminAccount {
        AdminAccount {
            id: AdminId::new(id),
            username: username.to_string(),
            name: format!("Admin {id}"),
            password: "secret".to_string(),
            role: role.to_string(),
            permissions: vec!["view".to_string()],
            email: String::new(),
            phone: String::new(),
            created_at: Timestamp::new(1_000),
            updated_at: Timestamp::new(1_000),
        }
    }

    #[test]
    fn insert_get_and_username_lookup() {
        let (_dir, env) = open_test_env();
        let store = env.admin_store();

        store.insert_admin(&admin(1, "admin", "super_admin")).unwrap();
        let by_id = store.get_admin(AdminId::new(1)).unwrap().unwrap();
        assert_eq!(by_id.role, "super_admin");
        let by_name = store.get_admin_by_username("admin").unwrap().unwrap();
        assert_eq!(by_name.id, AdminId::new(1));
    }

    #[test]
    fn duplicate_username_rejected() {
        let (_dir, env) = open_test_env();
        let store = env.admin_store();

        store.insert_admin(&admin(1, "admin", "super_admin")).unwrap();
        assert!(matches!(
            store.insert_admin(&admin(2, "admin", "admin")),
            Err(StoreError::Constraint(_))
        ));
    }

    #[test]
    fn delete_clears_username_index() {
        let (_dir, env) = open_test_env();
        let store = env.admin_store();

        store.insert_admin(&admin(1, "panitia", "admin")).unwrap();
        assert!(store.delete_admin(AdminId::new(1)).unwrap());
        assert_eq!(store.get_admin_by_username("panitia").unwrap(), None);
        assert!(!store.delete_admin(AdminId::new(1)).unwrap());
    }

    #[test]
    fn put_updates_in_place() {
        let (_dir, env) = open_test_env();
        let store = env.admin_store();

        store.insert_admin(&admin(1, "admin", "admin")).unwrap();
        let mut updated = store.get_admin(AdminId::new(1)).unwrap().unwrap();
        updated.role = "super_admin".to_string();
        store.put_admin(&updated).unwrap();

        let loaded = store.get_admin(AdminId::new(1)).unwrap().unwrap();
        assert_eq!(loaded.role, "super_admin");
        assert_eq!(store.admin_count().unwrap(), 1);
    }
}
