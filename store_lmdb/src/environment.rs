//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use tracing::info;

use crate::LmdbError;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

const MAX_DBS: u32 = 8;

/// Owns the LMDB environment and every database handle.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    store: LmdbStore,
}

impl LmdbEnvironment {
    /// Open or create an environment in `path`, creating the directory and
    /// the named databases as needed.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path).map_err(|e| LmdbError::Io(e.to_string()))?;

        // SAFETY: the environment is opened once per process per directory
        // and never memory-mapped elsewhere while this handle lives.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };
        let env = Arc::new(env);

        let mut wtxn = env.write_txn()?;
        let accounts_db = env.create_database(&mut wtxn, Some("accounts"))?;
        let public_key_index_db = env.create_database(&mut wtxn, Some("public_key_index"))?;
        let username_index_db = env.create_database(&mut wtxn, Some("username_index"))?;
        let vote_edges_db = env.create_database(&mut wtxn, Some("vote_edges"))?;
        wtxn.commit()?;

        info!(path = %path.display(), map_size, "opened LMDB environment");

        let store = LmdbStore {
            env: env.clone(),
            accounts_db,
            public_key_index_db,
            username_index_db,
            vote_edges_db,
        };
        Ok(Self { env, store })
    }

    /// Handle implementing both account and vote edge storage.
    pub fn store(&self) -> LmdbStore {
        self.store.clone()
    }

    /// Flush the memory map to disk.
    pub fn sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }
}

/// Account and vote edge storage over one LMDB environment.
///
/// Cheap to clone; clones share the environment.
#[derive(Clone)]
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    /// address text -> bincode account record
    pub(crate) accounts_db: Database<Bytes, Bytes>,
    /// 32-byte public key -> address text
    pub(crate) public_key_index_db: Database<Bytes, Bytes>,
    /// lowercase username -> address text
    pub(crate) username_index_db: Database<Bytes, Bytes>,
    /// order (BE) ++ delegate key ++ voter address -> sign byte
    pub(crate) vote_edges_db: Database<Bytes, Bytes>,
}

#[cfg(test)]
pub(crate) fn open_test_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), 1 << 24).unwrap();
    (dir, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpos_store::{Account, AccountStore, VoteEdgeStore};
    use dpos_types::{Address, Balance, PublicKey, VoteEdge};

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let account = Account::new(Address::from_u64(5), Balance::new(9));
        let edge = VoteEdge::add(Address::from_u64(5), PublicKey::new([1; 32]), 1);
        {
            let env = LmdbEnvironment::open(dir.path(), 1 << 24).unwrap();
            let store = env.store();
            store.put_account(&account).unwrap();
            store.append_edge(&edge).unwrap();
            env.sync().unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 1 << 24).unwrap();
        let store = env.store();
        assert_eq!(store.get_by_address(&account.address).unwrap(), Some(account));
        assert_eq!(store.iter_edges().unwrap(), vec![edge]);
    }

    #[test]
    fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        assert!(LmdbEnvironment::open(&nested, 1 << 24).is_ok());
    }
}
