//! LMDB implementation of VoterStore.
//!
//! Primary database `voters` keys big-endian voter ids to bincode records.
//! The `voter_usernames` index maps each username to the 4-byte voter key
//! and carries the roster-wide username uniqueness constraint.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use pemilu_store::voter::{Voter, VoterStore};
use pemilu_store::StoreError;
use pemilu_types::VoterId;

use crate::LmdbError;

pub struct LmdbVoterStore {
    pub(crate) env: Arc<Env>,
    pub(crate) voters_db: Database<Bytes, Bytes>,
    pub(crate) voter_usernames_db: Database<Bytes, Bytes>,
}

/// 4-byte big-endian primary key, so id order equals key order.
pub(crate) fn voter_key(id: VoterId) -> [u8; 4] {
    id.get().to_be_bytes()
}

impl VoterStore for LmdbVoterStore {
    fn insert_voter(&self, voter: &Voter) -> Result<(), StoreError> {
        let key = voter_key(voter.id);
        let bytes = bincode::serialize(voter).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .voters_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Constraint(format!(
                "voter id {} already exists",
                voter.id
            )));
        }
        if self
            .voter_usernames_db
            .get(&wtxn, voter.username.as_bytes())
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Constraint(format!(
                "username '{}' is already taken",
                voter.username
            )));
        }
        self.voters_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.voter_usernames_db
            .put(&mut wtxn, voter.username.as_bytes(), &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn put_voter(&self, voter: &Voter) -> Result<(), StoreError> {
        let key = voter_key(voter.id);
        let bytes = bincode::serialize(voter).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        // A renamed voter leaves a stale index entry behind; drop it first.
        let previous: Option<Voter> = self
            .voters_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .map(bincode::deserialize)
            .transpose()
            .map_err(LmdbError::from)?;
        if let Some(prev) = previous {
            if prev.username != voter.username {
                self.voter_usernames_db
                    .delete(&mut wtxn, prev.username.as_bytes())
                    .map_err(LmdbError::from)?;
            }
        }
        if let Some(owner) = self
            .voter_usernames_db
            .get(&wtxn, voter.username.as_bytes())
            .map_err(LmdbError::from)?
        {
            if owner != key.as_slice() {
                return Err(StoreError::Constraint(format!(
                    "username '{}' is already taken",
                    voter.username
                )));
            }
        }

        self.voters_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        self.voter_usernames_db
            .put(&mut wtxn, voter.username.as_bytes(), &key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_voter(&self, id: VoterId) -> Result<Option<Voter>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .voters_db
            .get(&rtxn, &voter_key(id))
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn get_voter_by_username(&self, username: &str) -> Result<Option<Voter>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let id_key = match self
            .voter_usernames_db
            .get(&rtxn, username.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        match self
            .voters_db
            .get(&rtxn, id_key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(bincode::deserialize(bytes).map_err(LmdbError::from)?)),
            None => Ok(None),
        }
    }

    fn delete_voter(&self, id: VoterId) -> Result<bool, StoreError> {
        let key = voter_key(id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let voter: Voter = match self
            .voters_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => bincode::deserialize(bytes).map_err(LmdbError::from)?,
            None => return Ok(false),
        };
        if voter.has_voted {
            return Err(StoreError::Constraint(format!(
                "voter {} has a recorded ballot; reset it before deleting",
                id
            )));
        }
        self.voters_db
            .delete(&mut wtxn, &key)
            .map_err(LmdbError::from)?;
        self.voter_usernames_db
            .delete(&mut wtxn, voter.username.as_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn iter_voters(&self) -> Result<Vec<Voter>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let iter = self.voters_db.iter(&rtxn).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (_key, val) = entry.map_err(LmdbError::from)?;
            results.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(results)
    }

    fn voter_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.voters_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn username_bounds(&self) -> Result<Option<(String, String)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let first = self
            .voter_usernames_db
            .first(&rtxn)
            .map_err(LmdbError::from)?;
        let last = self
            .voter_usernames_db
            .last(&rtxn)
            .map_err(LmdbError::from)?;
        match (first, last) {
            (Some((lo, _)), Some((hi, _))) => {
                let lo = std::str::from_utf8(lo)
                    .map_err(|e| LmdbError::Serialization(e.to_string()))?;
                let hi = std::str::from_utf8(hi)
                    .map_err(|e| LmdbError::Serialization(e.to_string()))?;
                Ok(Some((lo.to_string(), hi.to_string())))
            }
            _ => Ok(None),
        }
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

    fn voter(id: u32, username: &str) -> Voter {
        Voter::new(
            VoterId::new(id),
            username,
            format!("Teacher {id}"),
            "diknas",
            Timestamp::new(1_000),
        )
    }

    #[test]
    fn insert_and_get_voter() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        assert_eq!(store.get_voter(VoterId::new(1)).unwrap(), None);

        store.insert_voter(&voter(1, "guru01")).unwrap();
        let loaded = store.get_voter(VoterId::new(1)).unwrap().unwrap();
        assert_eq!(loaded.username, "guru01");
        assert!(!loaded.has_voted);
        assert!(loaded.vote_state_consistent());
    }

    #[test]
    fn lookup_by_username() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        store.insert_voter(&voter(7, "guru07")).unwrap();
        let loaded = store.get_voter_by_username("guru07").unwrap().unwrap();
        assert_eq!(loaded.id, VoterId::new(7));
        assert_eq!(store.get_voter_by_username("nobody").unwrap(), None);
    }

    #[test]
    fn duplicate_id_and_username_rejected() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        store.insert_voter(&voter(1, "guru01")).unwrap();
        assert!(matches!(
            store.insert_voter(&voter(1, "guru99")),
            Err(StoreError::Constraint(_))
        ));
        assert!(matches!(
            store.insert_voter(&voter(2, "guru01")),
            Err(StoreError::Constraint(_))
        ));
    }

    #[test]
    fn put_voter_moves_username_index() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        store.insert_voter(&voter(1, "guru01")).unwrap();
        let mut renamed = store.get_voter(VoterId::new(1)).unwrap().unwrap();
        renamed.username = "guru01b".to_string();
        store.put_voter(&renamed).unwrap();

        assert_eq!(store.get_voter_by_username("guru01").unwrap(), None);
        let found = store.get_voter_by_username("guru01b").unwrap().unwrap();
        assert_eq!(found.id, VoterId::new(1));
    }

    #[test]
    fn put_voter_rejects_username_owned_by_other() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        store.insert_voter(&voter(1, "guru01")).unwrap();
        store.insert_voter(&voter(2, "guru02")).unwrap();

        let mut second = store.get_voter(VoterId::new(2)).unwrap().unwrap();
        second.username = "guru01".to_string();
        assert!(matches!(
            store.put_voter(&second),
            Err(StoreError::Constraint(_))
        ));
    }

    #[test]
    fn delete_refused_while_voted() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        let mut v = voter(3, "guru03");
        v.mark_voted(pemilu_types::CandidateId::new(1), Timestamp::new(2_000));
        store.insert_voter(&v).unwrap();

        assert!(matches!(
            store.delete_voter(VoterId::new(3)),
            Err(StoreError::Constraint(_))
        ));
    }

    #[test]
    fn delete_removes_both_entries() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        store.insert_voter(&voter(4, "guru04")).unwrap();
        assert!(store.delete_voter(VoterId::new(4)).unwrap());
        assert!(!store.delete_voter(VoterId::new(4)).unwrap());
        assert_eq!(store.get_voter_by_username("guru04").unwrap(), None);
    }

    #[test]
    fn iter_voters_in_id_order() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        for id in [3u32, 1, 2] {
            store.insert_voter(&voter(id, &format!("guru{id:02}"))).unwrap();
        }
        let all = store.iter_voters().unwrap();
        let ids: Vec<u32> = all.iter().map(|v| v.id.get()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.voter_count().unwrap(), 3);
    }

    #[test]
    fn username_bounds_from_index() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        assert_eq!(store.username_bounds().unwrap(), None);

        for id in [2u32, 31, 1] {
            store.insert_voter(&voter(id, &format!("guru{id:02}"))).unwrap();
        }
        let (lo, hi) = store.username_bounds().unwrap().unwrap();
        assert_eq!(lo, "guru01");
        assert_eq!(hi, "guru31");
    }

    #[test]
    fn class_and_voted_filters() {
        let (_dir, env) = open_test_env();
        let store = env.voter_store();

        let mut a = voter(1, "guru01");
        a.class = "tahfidz".to_string();
        a.mark_voted(pemilu_types::CandidateId::new(2), Timestamp::new(5));
        store.insert_voter(&a).unwrap();
        store.insert_voter(&voter(2, "guru02")).unwrap();

        assert_eq!(store.voters_by_class("tahfidz").unwrap().len(), 1);
        assert_eq!(store.voters_by_class("diknas").unwrap().len(), 1);
        assert_eq!(store.voters_by_voted(true).unwrap().len(), 1);
        assert_eq!(store.voted_voter_count().unwrap(), 1);
    }
}
