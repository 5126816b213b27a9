//! Account storage trait.

use crate::StoreError;
use dpos_types::{Address, Balance, PublicKey, Username};
use serde::{Deserialize, Serialize};

/// Per-account record stored in the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub address: Address,
    /// Known once the account has signed its first transaction.
    pub public_key: Option<PublicKey>,
    /// Assigned by delegate registration.
    pub username: Option<Username>,
    pub balance: Balance,
}

impl Account {
    pub fn new(address: Address, balance: Balance) -> Self {
        Self {
            address,
            public_key: None,
            username: None,
            balance,
        }
    }

    /// Account owned by `public_key`, with the derived address.
    pub fn from_public_key(public_key: PublicKey, balance: Balance) -> Self {
        Self {
            address: Address::from_public_key(&public_key),
            public_key: Some(public_key),
            username: None,
            balance,
        }
    }

    pub fn with_username(mut self, username: Username) -> Self {
        self.username = Some(username);
        self
    }

    /// Whether the account has registered as a delegate.
    pub fn is_delegate(&self) -> bool {
        self.username.is_some()
    }
}

/// Trait for account storage operations.
///
/// Point lookups return `Ok(None)` for unknown accounts; `Err` is reserved
/// for backend failures.
pub trait AccountStore {
    fn get_by_address(&self, address: &Address) -> Result<Option<Account>, StoreError>;

    fn get_by_public_key(&self, public_key: &PublicKey) -> Result<Option<Account>, StoreError>;

    /// Case-insensitive lookup by delegate username.
    fn get_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// Insert or replace an account, keeping the secondary indexes current.
    ///
    /// Fails with [`StoreError::Duplicate`] when the username (compared
    /// case-insensitively) already belongs to another address.
    fn put_account(&self, account: &Account) -> Result<(), StoreError>;

    fn account_count(&self) -> Result<u64, StoreError>;

    /// Fetch many accounts at once. Unknown addresses are skipped, so the
    /// result may be shorter than the input.
    fn get_many(&self, addresses: &[Address]) -> Result<Vec<Account>, StoreError> {
        let mut found = Vec::with_capacity(addresses.len());
        for address in addresses {
            if let Some(account) = self.get_by_address(address)? {
                found.push(account);
            }
        }
        Ok(found)
    }
}
