//! Nullable store: thread-safe in-memory storage for testing.

use dpos_store::{Account, AccountStore, StoreError, VoteEdgeStore};
use dpos_types::{Address, PublicKey, VoteEdge};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// An in-memory account + vote edge store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    accounts: Mutex<HashMap<Address, Account>>,
    by_public_key: Mutex<HashMap<PublicKey, Address>>,
    by_username: Mutex<HashMap<String, Address>>,
    edges: Mutex<BTreeMap<(u64, PublicKey, Address), VoteEdge>>,
    unavailable: AtomicBool,
    lookups: AtomicU64,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            by_public_key: Mutex::new(HashMap::new()),
            by_username: Mutex::new(HashMap::new()),
            edges: Mutex::new(BTreeMap::new()),
            unavailable: AtomicBool::new(false),
            lookups: AtomicU64::new(0),
        }
    }

    /// Build a store pre-populated with accounts.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.put_account(&account).unwrap();
        }
        store
    }

    /// Make every subsequent call fail with a backend error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of account reads performed so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Drop an account record but leave its indexes dangling, simulating a
    /// store that lost a row.
    pub fn forget_account(&self, address: &Address) {
        self.accounts.lock().unwrap().remove(address);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Backend("null store is unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<(), StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    fn get_indexed(&self, address: Option<Address>) -> Option<Account> {
        address.and_then(|a| self.accounts.lock().unwrap().get(&a).cloned())
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AccountStore for NullStore {
    fn get_by_address(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        self.read()?;
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    fn get_by_public_key(&self, public_key: &PublicKey) -> Result<Option<Account>, StoreError> {
        self.read()?;
        let address = self.by_public_key.lock().unwrap().get(public_key).cloned();
        Ok(self.get_indexed(address))
    }

    fn get_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        self.read()?;
        let address = self
            .by_username
            .lock()
            .unwrap()
            .get(&username.to_lowercase())
            .cloned();
        Ok(self.get_indexed(address))
    }

    fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        self.check()?;
        let mut by_username = self.by_username.lock().unwrap();
        if let Some(name) = &account.username {
            match by_username.get(&name.normalized()) {
                Some(owner) if owner != &account.address => {
                    return Err(StoreError::Duplicate(name.to_string()));
                }
                _ => {}
            }
        }
        let mut accounts = self.accounts.lock().unwrap();
        if let Some(previous) = accounts.get(&account.address) {
            if let Some(name) = &previous.username {
                by_username.remove(&name.normalized());
            }
            if let Some(key) = &previous.public_key {
                self.by_public_key.lock().unwrap().remove(key);
            }
        }
        if let Some(name) = &account.username {
            by_username.insert(name.normalized(), account.address.clone());
        }
        if let Some(key) = account.public_key {
            self.by_public_key
                .lock()
                .unwrap()
                .insert(key, account.address.clone());
        }
        accounts.insert(account.address.clone(), account.clone());
        Ok(())
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        self.check()?;
        Ok(self.accounts.lock().unwrap().len() as u64)
    }

    fn get_many(&self, addresses: &[Address]) -> Result<Vec<Account>, StoreError> {
        self.read()?;
        let accounts = self.accounts.lock().unwrap();
        Ok(addresses
            .iter()
            .filter_map(|a| accounts.get(a).cloned())
            .collect())
    }
}

impl VoteEdgeStore for NullStore {
    fn append_edge(&self, edge: &VoteEdge) -> Result<(), StoreError> {
        self.check()?;
        self.edges
            .lock()
            .unwrap()
            .entry((edge.order, edge.delegate, edge.voter.clone()))
            .or_insert_with(|| edge.clone());
        Ok(())
    }

    fn iter_edges(&self) -> Result<Vec<VoteEdge>, StoreError> {
        self.check()?;
        Ok(self.edges.lock().unwrap().values().cloned().collect())
    }

    fn edge_count(&self) -> Result<u64, StoreError> {
        self.check()?;
        Ok(self.edges.lock().unwrap().len() as u64)
    }
}
