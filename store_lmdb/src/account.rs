//! LMDB implementation of AccountStore.

use heed::RoTxn;
use serde::{Deserialize, Serialize};

use dpos_store::{Account, AccountStore, StoreError};
use dpos_types::{Address, Balance, PublicKey, Username};

use crate::{LmdbError, LmdbStore};

/// On-disk form of an account. Plain fields only, so bincode never has to
/// go through the string encodings used on the wire.
#[derive(Serialize, Deserialize)]
struct StoredAccount {
    address: String,
    public_key: Option<[u8; 32]>,
    username: Option<String>,
    balance: u64,
}

impl From<&Account> for StoredAccount {
    fn from(account: &Account) -> Self {
        Self {
            address: account.address.as_str().to_string(),
            public_key: account.public_key.map(|k| *k.as_bytes()),
            username: account.username.as_ref().map(|u| u.as_str().to_string()),
            balance: account.balance.raw(),
        }
    }
}

impl TryFrom<StoredAccount> for Account {
    type Error = LmdbError;

    fn try_from(stored: StoredAccount) -> Result<Self, Self::Error> {
        let corrupt = |e: dpos_types::TypesError| LmdbError::Corruption(e.to_string());
        Ok(Account {
            address: Address::parse(&stored.address).map_err(corrupt)?,
            public_key: stored.public_key.map(PublicKey::new),
            username: stored.username.map(Username::new).transpose().map_err(corrupt)?,
            balance: Balance::new(stored.balance),
        })
    }
}

fn decode_account(bytes: &[u8]) -> Result<Account, LmdbError> {
    let stored: StoredAccount = bincode::deserialize(bytes)?;
    Account::try_from(stored)
}

impl LmdbStore {
    fn read_account(&self, rtxn: &RoTxn, address: &[u8]) -> Result<Option<Account>, LmdbError> {
        match self.accounts_db.get(rtxn, address)? {
            Some(bytes) => Ok(Some(decode_account(bytes)?)),
            None => Ok(None),
        }
    }

    /// Follow a secondary index entry to the account record.
    fn read_indexed(&self, rtxn: &RoTxn, address: Option<&[u8]>) -> Result<Option<Account>, LmdbError> {
        match address {
            Some(address) => self.read_account(rtxn, address),
            None => Ok(None),
        }
    }
}

impl AccountStore for LmdbStore {
    fn get_by_address(&self, address: &Address) -> Result<Option<Account>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_account(&rtxn, address.as_str().as_bytes())?)
    }

    fn get_by_public_key(&self, public_key: &PublicKey) -> Result<Option<Account>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let address = self
            .public_key_index_db
            .get(&rtxn, public_key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(self.read_indexed(&rtxn, address)?)
    }

    fn get_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let key = username.to_lowercase();
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let address = self
            .username_index_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(self.read_indexed(&rtxn, address)?)
    }

    fn put_account(&self, account: &Account) -> Result<(), StoreError> {
        let address = account.address.as_str().as_bytes();
        let record = bincode::serialize(&StoredAccount::from(account)).map_err(LmdbError::from)?;

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if let Some(name) = &account.username {
            let owner = self
                .username_index_db
                .get(&wtxn, name.normalized().as_bytes())
                .map_err(LmdbError::from)?;
            if matches!(owner, Some(owner) if owner != address) {
                return Err(StoreError::Duplicate(name.to_string()));
            }
        }

        if let Some(previous) = self.read_account(&wtxn, address)? {
            if let Some(name) = &previous.username {
                self.username_index_db
                    .delete(&mut wtxn, name.normalized().as_bytes())
                    .map_err(LmdbError::from)?;
            }
            if let Some(key) = &previous.public_key {
                self.public_key_index_db
                    .delete(&mut wtxn, key.as_bytes())
                    .map_err(LmdbError::from)?;
            }
        }

        if let Some(name) = &account.username {
            self.username_index_db
                .put(&mut wtxn, name.normalized().as_bytes(), address)
                .map_err(LmdbError::from)?;
        }
        if let Some(key) = &account.public_key {
            self.public_key_index_db
                .put(&mut wtxn, key.as_bytes(), address)
                .map_err(LmdbError::from)?;
        }
        self.accounts_db
            .put(&mut wtxn, address, &record)
            .map_err(LmdbError::from)?;

        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.accounts_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    /// One read transaction for the whole batch, so the result is a
    /// consistent snapshot.
    fn get_many(&self, addresses: &[Address]) -> Result<Vec<Account>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut found = Vec::with_capacity(addresses.len());
        for address in addresses {
            if let Some(account) = self.read_account(&rtxn, address.as_str().as_bytes())? {
                found.push(account);
            }
        }
        Ok(found)
    }
}
